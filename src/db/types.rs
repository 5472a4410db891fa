use serde::{Deserialize, Serialize};
use sqlx::Type;

/// Append-only audit event kinds written to `security_events`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "securityeventtype", rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum SecurityEventType {
    QuizStarted,
    SuspiciousActivity,
    QuizCompleted,
    CopyPasteAttempt,
    TabSwitch,
}

#[cfg(test)]
mod tests {
    use super::SecurityEventType;

    #[test]
    fn event_type_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&SecurityEventType::CopyPasteAttempt).unwrap();
        assert_eq!(json, "\"COPY_PASTE_ATTEMPT\"");
        let json = serde_json::to_string(&SecurityEventType::QuizStarted).unwrap();
        assert_eq!(json, "\"QUIZ_STARTED\"");
    }
}
