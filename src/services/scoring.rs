use std::collections::HashSet;

use serde::Serialize;

use crate::services::content::QuestionRecord;

pub(crate) const COPY_PASTE_THRESHOLD: i64 = 5;
pub(crate) const TAB_SWITCH_THRESHOLD: i64 = 10;

/// Outcome for a single question, kept threshold-free; pass/fail against
/// the configured passing level is applied by the caller for display.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct QuestionResult {
    pub(crate) question_id: String,
    pub(crate) question: String,
    pub(crate) user_answers: Vec<String>,
    pub(crate) correct_answers: Vec<String>,
    pub(crate) is_correct: bool,
}

#[derive(Debug)]
pub(crate) struct AttemptOutcome {
    pub(crate) score: usize,
    pub(crate) results: Vec<QuestionResult>,
}

/// Correct iff the submitted answers equal the canonical answers as sets;
/// order and duplicate entries are ignored.
pub(crate) fn score_question(correct_answers: &[String], submitted: &[String]) -> bool {
    let correct: HashSet<&str> = correct_answers.iter().map(String::as_str).collect();
    let given: HashSet<&str> = submitted.iter().map(String::as_str).collect();
    correct == given
}

/// Scores a full attempt. `answers_by_question` is aligned with
/// `questions`; the score is the count of correct questions.
pub(crate) fn score_attempt(
    questions: &[QuestionRecord],
    answers_by_question: &[Vec<String>],
) -> AttemptOutcome {
    let mut results = Vec::with_capacity(questions.len());
    let mut score = 0;

    for (index, question) in questions.iter().enumerate() {
        let question_number = index + 1;
        let submitted = answers_by_question.get(index).cloned().unwrap_or_default();
        let is_correct = score_question(&question.correct_answers, &submitted);
        if is_correct {
            score += 1;
        }

        results.push(QuestionResult {
            question_id: question.resolved_id(question_number),
            question: question.question.clone(),
            user_answers: submitted,
            correct_answers: question.correct_answers.clone(),
            is_correct,
        });
    }

    AttemptOutcome { score, results }
}

/// Heuristic anti-tamper flag with fixed thresholds.
pub(crate) fn classify_suspicious(copy_paste_attempts: i64, tab_switches: i64) -> bool {
    copy_paste_attempts > COPY_PASTE_THRESHOLD || tab_switches > TAB_SWITCH_THRESHOLD
}
