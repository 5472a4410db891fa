use std::convert::Infallible;

use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};

/// Client metadata captured into every attempt and audit row. The ip falls
/// back to `"unknown"` when no forwarding header is present.
#[derive(Debug, Clone)]
pub(crate) struct ClientMeta {
    pub(crate) ip: String,
    pub(crate) user_agent: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = header_value(parts, "x-forwarded-for")
            .map(|raw| raw.split(',').next().unwrap_or(raw).trim().to_string())
            .or_else(|| header_value(parts, "x-real-ip").map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());

        let user_agent =
            header_value(parts, header::USER_AGENT.as_str()).unwrap_or_default().to_string();

        Ok(ClientMeta { ip, user_agent })
    }
}

/// Verified quiz session token; the inner value is the attempt id.
pub(crate) struct QuizSession(pub(crate) String);

/// Like `QuizSession`, but tolerates a missing or invalid token.
pub(crate) struct MaybeQuizSession(pub(crate) Option<String>);

#[async_trait]
impl FromRequestParts<AppState> for QuizSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let token = bearer_token(parts)
            .ok_or(ApiError::Unauthorized("Invalid submission. Please start a new quiz."))?;

        let claims = security::verify_session_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid submission. Please start a new quiz."))?;

        Ok(QuizSession(claims.sub))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeQuizSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = QuizSession::from_request_parts(parts, state).await.ok();
        Ok(MaybeQuizSession(session.map(|QuizSession(id)| id)))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    header_value(parts, header::AUTHORIZATION.as_str())
        .and_then(|value| value.strip_prefix("Bearer "))
}

fn header_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|value| value.to_str().ok()).filter(|value| !value.is_empty())
}
