use serde::Serialize;
use sqlx::PgPool;

use crate::core::time::primitive_now_utc;
use crate::db::types::SecurityEventType;
use crate::repositories;

/// Structured payloads for the append-only security event log, one variant
/// per event kind so nothing degrades to free-form key/value data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum SecurityEvent {
    QuizStarted {
        student_name: String,
        num_questions: usize,
        start_time: String,
    },
    SuspiciousActivity {
        copy_paste_attempts: i64,
        tab_switches: i64,
        student_name: String,
        threshold_exceeded: ThresholdExceeded,
    },
    QuizCompleted {
        student_name: String,
        score: usize,
        total_questions: usize,
        completion_time: String,
        time_elapsed_seconds: f64,
    },
    CopyPasteAttempt {
        total_attempts: i64,
        timestamp: String,
    },
    TabSwitch {
        total_switches: i64,
        timestamp: String,
    },
}

#[derive(Debug, Serialize)]
pub(crate) struct ThresholdExceeded {
    pub(crate) copy_paste: bool,
    pub(crate) tab_switches: bool,
}

impl SecurityEvent {
    pub(crate) fn event_type(&self) -> SecurityEventType {
        match self {
            SecurityEvent::QuizStarted { .. } => SecurityEventType::QuizStarted,
            SecurityEvent::SuspiciousActivity { .. } => SecurityEventType::SuspiciousActivity,
            SecurityEvent::QuizCompleted { .. } => SecurityEventType::QuizCompleted,
            SecurityEvent::CopyPasteAttempt { .. } => SecurityEventType::CopyPasteAttempt,
            SecurityEvent::TabSwitch { .. } => SecurityEventType::TabSwitch,
        }
    }
}

/// Appends a security event. Best-effort by contract: a failed write is
/// logged and swallowed so observability never blocks the quiz flow.
pub(crate) async fn record(
    pool: &PgPool,
    session_id: &str,
    ip_address: &str,
    user_agent: &str,
    event: SecurityEvent,
) {
    let event_type = event.event_type();
    let details = match serde_json::to_value(&event) {
        Ok(value) => value,
        Err(err) => {
            tracing::error!(error = %err, ?event_type, "Failed to serialize security event");
            return;
        }
    };

    if let Err(err) = repositories::security_events::create(
        pool,
        session_id,
        event_type,
        details,
        ip_address,
        user_agent,
        primitive_now_utc(),
    )
    .await
    {
        tracing::error!(error = %err, ?event_type, session_id, "Error logging security event");
    } else {
        tracing::info!(?event_type, session_id, "Security event logged");
    }
}

/// Rfc3339 string for event payload timestamps.
pub(crate) fn payload_timestamp(value: time::OffsetDateTime) -> String {
    crate::core::time::format_offset(value)
}
