use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::types::SecurityEventType;

/// Append-only insert; rows are never updated or deleted.
pub(crate) async fn create(
    pool: &PgPool,
    session_id: &str,
    event_type: SecurityEventType,
    event_details: serde_json::Value,
    ip_address: &str,
    user_agent: &str,
    timestamp: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO security_events (
            session_id, event_type, event_details, ip_address, user_agent, timestamp
        ) VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(session_id)
    .bind(event_type)
    .bind(Json(event_details))
    .bind(ip_address)
    .bind(user_agent)
    .bind(timestamp)
    .execute(pool)
    .await?;

    Ok(())
}
