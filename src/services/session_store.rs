use redis::{AsyncCommands, RedisError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

use crate::core::redis::RedisHandle;
use crate::services::content::QuestionRecord;

const SESSION_KEY_PREFIX: &str = "quiz:session:";
const ACTIVITY_KEY_PREFIX: &str = "quiz:activity:";

#[derive(Debug, Error)]
pub(crate) enum SessionStoreError {
    #[error("session store is unavailable")]
    Unavailable,
    #[error("session store command failed: {0}")]
    Redis(#[from] RedisError),
    #[error("session state could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Ephemeral per-attempt state, held server-side and keyed by the attempt
/// id carried in the signed client token. Expires with the key TTL; an
/// expired key is the implicit terminal state for abandoned attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ActiveSession {
    pub(crate) session_id: String,
    pub(crate) student_name: String,
    pub(crate) student_hash: String,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) page_load_time: OffsetDateTime,
    pub(crate) questions: Vec<QuestionRecord>,
    pub(crate) submitted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ActivityKind {
    CopyPaste,
    TabSwitch,
}

impl ActivityKind {
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw {
            "copy_paste" => Some(Self::CopyPaste),
            "tab_switch" => Some(Self::TabSwitch),
            _ => None,
        }
    }

    fn field(self) -> &'static str {
        match self {
            Self::CopyPaste => "copy_paste",
            Self::TabSwitch => "tab_switch",
        }
    }
}

/// Redis-backed store for `ActiveSession` plus the per-attempt activity
/// counters. Counters live in a separate hash so the telemetry endpoint
/// can increment them atomically without rewriting the session blob.
#[derive(Clone)]
pub(crate) struct SessionStore {
    redis: RedisHandle,
}

impl SessionStore {
    pub(crate) fn new(redis: RedisHandle) -> Self {
        Self { redis }
    }

    pub(crate) fn redis(&self) -> &RedisHandle {
        &self.redis
    }

    pub(crate) async fn save(
        &self,
        session: &ActiveSession,
        ttl_seconds: u64,
    ) -> Result<(), SessionStoreError> {
        let mut conn = self.redis.manager().await.ok_or(SessionStoreError::Unavailable)?;
        let payload = serde_json::to_string(session)?;
        let () = conn.set_ex(session_key(&session.session_id), payload, ttl_seconds).await?;
        Ok(())
    }

    pub(crate) async fn load(
        &self,
        session_id: &str,
    ) -> Result<Option<ActiveSession>, SessionStoreError> {
        let mut conn = self.redis.manager().await.ok_or(SessionStoreError::Unavailable)?;
        let payload: Option<String> = conn.get(session_key(session_id)).await?;

        match payload {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Removes the session blob and its activity counters.
    pub(crate) async fn destroy(&self, session_id: &str) -> Result<(), SessionStoreError> {
        let mut conn = self.redis.manager().await.ok_or(SessionStoreError::Unavailable)?;
        let () = conn.del(&[session_key(session_id), activity_key(session_id)][..]).await?;
        Ok(())
    }

    /// Atomically increments one activity counter and returns the running
    /// total. The counter hash expires alongside the session.
    pub(crate) async fn record_activity(
        &self,
        session_id: &str,
        kind: ActivityKind,
        ttl_seconds: u64,
    ) -> Result<i64, SessionStoreError> {
        let mut conn = self.redis.manager().await.ok_or(SessionStoreError::Unavailable)?;
        let key = activity_key(session_id);
        let total: i64 = conn.hincr(&key, kind.field(), 1i64).await?;
        let _: bool = conn.expire(&key, ttl_seconds as i64).await?;
        Ok(total)
    }

    /// Counter snapshot as (copy_paste, tab_switch).
    pub(crate) async fn activity_counters(
        &self,
        session_id: &str,
    ) -> Result<(i64, i64), SessionStoreError> {
        let mut conn = self.redis.manager().await.ok_or(SessionStoreError::Unavailable)?;
        let key = activity_key(session_id);
        let copy_paste: Option<i64> = conn.hget(&key, ActivityKind::CopyPaste.field()).await?;
        let tab_switch: Option<i64> = conn.hget(&key, ActivityKind::TabSwitch.field()).await?;
        Ok((copy_paste.unwrap_or(0), tab_switch.unwrap_or(0)))
    }
}

fn session_key(session_id: &str) -> String {
    format!("{SESSION_KEY_PREFIX}{session_id}")
}

fn activity_key(session_id: &str) -> String {
    format!("{ACTIVITY_KEY_PREFIX}{session_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::format_description::well_known::Rfc3339;

    #[test]
    fn activity_kind_parses_known_values() {
        assert_eq!(ActivityKind::parse("copy_paste"), Some(ActivityKind::CopyPaste));
        assert_eq!(ActivityKind::parse("tab_switch"), Some(ActivityKind::TabSwitch));
        assert_eq!(ActivityKind::parse("mouse_move"), None);
    }

    #[test]
    fn active_session_roundtrips_through_json() {
        let session = ActiveSession {
            session_id: "abc".to_string(),
            student_name: "Ann".to_string(),
            student_hash: "deadbeef".to_string(),
            page_load_time: OffsetDateTime::parse("2025-01-02T10:20:30Z", &Rfc3339).unwrap(),
            questions: vec![QuestionRecord {
                question_id: Some("q1".to_string()),
                question: "First?".to_string(),
                correct_answers: vec!["A".to_string()],
                options: vec!["A".to_string(), "B".to_string()],
            }],
            submitted: false,
        };

        let raw = serde_json::to_string(&session).expect("serialize");
        let restored: ActiveSession = serde_json::from_str(&raw).expect("deserialize");

        assert_eq!(restored.session_id, session.session_id);
        assert_eq!(restored.page_load_time, session.page_load_time);
        assert_eq!(restored.questions, session.questions);
        assert!(!restored.submitted);
    }

    fn sample_session(session_id: &str) -> ActiveSession {
        ActiveSession {
            session_id: session_id.to_string(),
            student_name: "Ann".to_string(),
            student_hash: "deadbeef".to_string(),
            page_load_time: OffsetDateTime::now_utc(),
            questions: vec![QuestionRecord {
                question_id: Some("q1".to_string()),
                question: "First?".to_string(),
                correct_answers: vec!["A".to_string()],
                options: vec!["A".to_string(), "B".to_string()],
            }],
            submitted: false,
        }
    }

    async fn connected_store() -> anyhow::Result<Option<SessionStore>> {
        let Ok(url) = std::env::var("REDIS_URL") else {
            eprintln!("skipping: REDIS_URL is not set");
            return Ok(None);
        };

        let redis = RedisHandle::new(url);
        redis.connect().await?;
        Ok(Some(SessionStore::new(redis)))
    }

    #[tokio::test]
    async fn submitted_flag_survives_a_resave() -> anyhow::Result<()> {
        let Some(store) = connected_store().await? else {
            return Ok(());
        };

        let session_id = uuid::Uuid::new_v4().to_string();
        let mut session = sample_session(&session_id);
        store.save(&session, 60).await?;

        session.submitted = true;
        store.save(&session, 60).await?;

        let reloaded = store.load(&session_id).await?.expect("session present");
        assert!(reloaded.submitted);

        store.destroy(&session_id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn destroy_clears_session_and_counters_for_a_fresh_start() -> anyhow::Result<()> {
        let Some(store) = connected_store().await? else {
            return Ok(());
        };

        let session_id = uuid::Uuid::new_v4().to_string();
        store.save(&sample_session(&session_id), 60).await?;
        store.record_activity(&session_id, ActivityKind::CopyPaste, 60).await?;

        store.destroy(&session_id).await?;

        assert!(store.load(&session_id).await?.is_none());
        assert_eq!(store.activity_counters(&session_id).await?, (0, 0));
        Ok(())
    }
}
