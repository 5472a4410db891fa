use axum::{extract::State, Json};
use time::OffsetDateTime;

use crate::api::extract::{ClientMeta, MaybeQuizSession};
use crate::core::state::AppState;
use crate::schemas::quiz::ActivityResponse;
use crate::services::audit::{self, SecurityEvent};
use crate::services::session_store::ActivityKind;

/// Telemetry ping from the quiz page. Independent of the main lifecycle:
/// it bumps the per-attempt counter and appends the matching audit event,
/// and reports errors in-band rather than through HTTP status codes.
pub(crate) async fn log_activity(
    State(state): State<AppState>,
    client: ClientMeta,
    MaybeQuizSession(session): MaybeQuizSession,
    Json(payload): Json<serde_json::Value>,
) -> Json<ActivityResponse> {
    let Some(session_id) = session else {
        return Json(ActivityResponse::error("No active session"));
    };

    let Some(kind) =
        payload.get("type").and_then(|value| value.as_str()).and_then(ActivityKind::parse)
    else {
        return Json(ActivityResponse::error("Unknown activity type"));
    };

    // The counter only exists while the attempt does.
    match state.sessions().load(&session_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Json(ActivityResponse::error("No active session")),
        Err(err) => {
            tracing::error!(error = %err, session_id = %session_id, "Error logging activity");
            return Json(ActivityResponse::error("Failed to log activity"));
        }
    }

    let total = match state
        .sessions()
        .record_activity(&session_id, kind, state.settings().quiz().max_quiz_time_seconds)
        .await
    {
        Ok(total) => total,
        Err(err) => {
            tracing::error!(error = %err, session_id = %session_id, "Error logging activity");
            return Json(ActivityResponse::error("Failed to log activity"));
        }
    };

    let timestamp = audit::payload_timestamp(OffsetDateTime::now_utc());
    let event = match kind {
        ActivityKind::CopyPaste => {
            SecurityEvent::CopyPasteAttempt { total_attempts: total, timestamp }
        }
        ActivityKind::TabSwitch => SecurityEvent::TabSwitch { total_switches: total, timestamp },
    };

    audit::record(state.db(), &session_id, &client.ip, &client.user_agent, event).await;

    Json(ActivityResponse::logged())
}
