use serde::{Deserialize, Serialize};

use crate::services::content::QuestionRecord;
use crate::services::scoring::QuestionResult;

#[derive(Debug, Deserialize)]
pub(crate) struct StartQuizForm {
    pub(crate) student_name: String,
}

/// Question as exposed to the client: the canonical answers stay
/// server-side.
#[derive(Debug, Serialize)]
pub(crate) struct QuestionView {
    pub(crate) question_id: String,
    pub(crate) question: String,
    pub(crate) options: Vec<String>,
}

impl QuestionView {
    pub(crate) fn from_record(record: &QuestionRecord, question_number: usize) -> Self {
        Self {
            question_id: record.resolved_id(question_number),
            question: record.question.clone(),
            options: record.options.clone(),
        }
    }
}

/// Payload the rendering layer uses to draw the quiz page.
#[derive(Debug, Serialize)]
pub(crate) struct QuizStartResponse {
    pub(crate) quiz_title: String,
    pub(crate) student_name: String,
    pub(crate) num_questions: usize,
    pub(crate) max_time_seconds: u64,
    pub(crate) session_token: String,
    pub(crate) questions: Vec<QuestionView>,
}

/// Payload the rendering layer uses to draw the results page. `passed` is
/// the display-only comparison of score/total against the passing level.
#[derive(Debug, Serialize)]
pub(crate) struct QuizResultResponse {
    pub(crate) student_name: String,
    pub(crate) score: usize,
    pub(crate) total: usize,
    pub(crate) passing_level: f64,
    pub(crate) passed: bool,
    pub(crate) results: Vec<QuestionResult>,
    pub(crate) suspicious_activity: bool,
    pub(crate) copy_paste_attempts: i64,
    pub(crate) tab_switches: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct ActivityResponse {
    pub(crate) status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) message: Option<String>,
}

impl ActivityResponse {
    pub(crate) fn logged() -> Self {
        Self { status: "logged", message: None }
    }

    pub(crate) fn error(message: impl Into<String>) -> Self {
        Self { status: "error", message: Some(message.into()) }
    }
}
