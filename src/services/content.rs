use std::path::Path;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub(crate) const DEFAULT_NUM_QUESTIONS: usize = 2;
pub(crate) const DEFAULT_PASSING_LEVEL: f64 = 0.7;
pub(crate) const DEFAULT_QUIZ_TITLE: &str = "Quiz";

#[derive(Debug, Error)]
pub(crate) enum ContentError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("question bank {path} is empty")]
    EmptyBank { path: String },
}

/// A question as loaded from the static bank. Immutable once loaded;
/// the core never writes back to the content source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct QuestionRecord {
    #[serde(default)]
    pub(crate) question_id: Option<String>,
    pub(crate) question: String,
    pub(crate) correct_answers: Vec<String>,
    #[serde(default)]
    pub(crate) options: Vec<String>,
}

impl QuestionRecord {
    /// Stable identifier: the explicit id when the bank provides one,
    /// otherwise derived from the 1-based position.
    pub(crate) fn resolved_id(&self, question_number: usize) -> String {
        match &self.question_id {
            Some(id) => id.clone(),
            None => format!("q_{question_number}"),
        }
    }

    /// Suffix used by the client for `first_modified_*`/`last_modified_*`
    /// form keys: the explicit id, or the bare question number.
    pub(crate) fn timing_key_suffix(&self, question_number: usize) -> String {
        match &self.question_id {
            Some(id) => id.clone(),
            None => question_number.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct QuizParameters {
    #[serde(default = "default_num_questions")]
    pub(crate) num_questions: usize,
    #[serde(default = "default_passing_level")]
    pub(crate) passing_level: f64,
    #[serde(default = "default_quiz_title")]
    pub(crate) quiz_title: String,
}

impl Default for QuizParameters {
    fn default() -> Self {
        Self {
            num_questions: DEFAULT_NUM_QUESTIONS,
            passing_level: DEFAULT_PASSING_LEVEL,
            quiz_title: DEFAULT_QUIZ_TITLE.to_string(),
        }
    }
}

fn default_num_questions() -> usize {
    DEFAULT_NUM_QUESTIONS
}

fn default_passing_level() -> f64 {
    DEFAULT_PASSING_LEVEL
}

fn default_quiz_title() -> String {
    DEFAULT_QUIZ_TITLE.to_string()
}

/// Loads the question bank. A quiz cannot start without valid content, so
/// every failure here is surfaced to the caller.
pub(crate) fn load_questions(path: &str) -> Result<Vec<QuestionRecord>, ContentError> {
    let raw = std::fs::read_to_string(Path::new(path))
        .map_err(|source| ContentError::Read { path: path.to_string(), source })?;

    let questions: Vec<QuestionRecord> = serde_json::from_str(&raw)
        .map_err(|source| ContentError::Parse { path: path.to_string(), source })?;

    if questions.is_empty() {
        return Err(ContentError::EmptyBank { path: path.to_string() });
    }

    Ok(questions)
}

/// Loads quiz parameters. A missing file is non-critical and falls back to
/// the documented defaults; a present but malformed file is still an error.
pub(crate) fn load_parameters(path: &str) -> Result<QuizParameters, ContentError> {
    let raw = match std::fs::read_to_string(Path::new(path)) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path, "Quiz parameters file not found; using defaults");
            return Ok(QuizParameters::default());
        }
        Err(source) => return Err(ContentError::Read { path: path.to_string(), source }),
    };

    serde_json::from_str(&raw)
        .map_err(|source| ContentError::Parse { path: path.to_string(), source })
}

/// Uniform random sample without replacement. When the bank is smaller
/// than requested the whole bank is returned (degraded mode).
pub(crate) fn select_questions(
    bank: &[QuestionRecord],
    num_questions: usize,
) -> Vec<QuestionRecord> {
    if bank.len() < num_questions {
        tracing::warn!(
            requested = num_questions,
            available = bank.len(),
            "Not enough questions available; serving the entire bank"
        );
        return bank.to_vec();
    }

    let mut rng = rand::thread_rng();
    bank.choose_multiple(&mut rng, num_questions).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    fn bank(n: usize) -> Vec<QuestionRecord> {
        (1..=n)
            .map(|i| QuestionRecord {
                question_id: Some(format!("q{i}")),
                question: format!("Question {i}?"),
                correct_answers: vec![format!("A{i}")],
                options: vec![format!("A{i}"), format!("B{i}")],
            })
            .collect()
    }

    #[test]
    fn select_questions_draws_distinct_subset_from_bank() {
        let bank = bank(5);
        let selected = select_questions(&bank, 2);

        assert_eq!(selected.len(), 2);
        assert_ne!(selected[0], selected[1]);
        for question in &selected {
            assert!(bank.contains(question));
        }
    }

    #[test]
    fn select_questions_degrades_to_whole_bank() {
        let bank = bank(5);
        let selected = select_questions(&bank, 10);
        assert_eq!(selected.len(), 5);
    }

    #[test]
    fn load_questions_fails_on_missing_file() {
        let result = load_questions("/nonexistent/questions.json");
        assert!(matches!(result, Err(ContentError::Read { .. })));
    }

    #[test]
    fn load_questions_fails_on_malformed_json() {
        let path = test_support::write_temp_file("questions", "not json");
        let result = load_questions(path.to_str().unwrap());
        assert!(matches!(result, Err(ContentError::Parse { .. })));
    }

    #[test]
    fn load_questions_fails_on_empty_bank() {
        let path = test_support::write_temp_file("questions", "[]");
        let result = load_questions(path.to_str().unwrap());
        assert!(matches!(result, Err(ContentError::EmptyBank { .. })));
    }

    #[test]
    fn load_questions_parses_bank_with_optional_ids() {
        let path = test_support::write_temp_file(
            "questions",
            r#"[
                {"question_id": "geo-1", "question": "Capital of France?",
                 "correct_answers": ["Paris"], "options": ["Paris", "Lyon"]},
                {"question": "2 + 2?", "correct_answers": ["4"]}
            ]"#,
        );

        let questions = load_questions(path.to_str().unwrap()).expect("questions");
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].resolved_id(1), "geo-1");
        assert_eq!(questions[1].resolved_id(2), "q_2");
        assert_eq!(questions[1].timing_key_suffix(2), "2");
        assert!(questions[1].options.is_empty());
    }

    #[test]
    fn load_parameters_defaults_on_missing_file() {
        let params = load_parameters("/nonexistent/params.json").expect("defaults");
        assert_eq!(params.num_questions, DEFAULT_NUM_QUESTIONS);
        assert_eq!(params.passing_level, DEFAULT_PASSING_LEVEL);
        assert_eq!(params.quiz_title, DEFAULT_QUIZ_TITLE);
    }

    #[test]
    fn load_parameters_fails_on_malformed_json() {
        let path = test_support::write_temp_file("params", "{broken");
        assert!(matches!(
            load_parameters(path.to_str().unwrap()),
            Err(ContentError::Parse { .. })
        ));
    }

    #[test]
    fn load_parameters_fills_missing_fields() {
        let path = test_support::write_temp_file("params", r#"{"num_questions": 5}"#);
        let params = load_parameters(path.to_str().unwrap()).expect("params");
        assert_eq!(params.num_questions, 5);
        assert_eq!(params.passing_level, DEFAULT_PASSING_LEVEL);
        assert_eq!(params.quiz_title, DEFAULT_QUIZ_TITLE);
    }
}
