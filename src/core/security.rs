use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use time::{Duration, OffsetDateTime};

use crate::core::config::Settings;

#[derive(Debug, Error)]
pub(crate) enum SecurityError {
    #[error("session token encoding failed")]
    TokenEncoding,
    #[error("session token decoding failed")]
    TokenDecoding,
    #[error("unsupported jwt algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Signed claim carried by the client between quiz requests. `sub` is the
/// attempt id; `exp` caps the attempt at the configured max quiz time.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SessionClaims {
    pub(crate) sub: String,
    pub(crate) exp: i64,
}

/// Anonymized student fingerprint for duplicate-attempt analytics.
/// Deterministic over (normalized name, user agent, ip); not an identity
/// credential.
pub(crate) fn derive_fingerprint(name: &str, user_agent: &str, ip_address: &str) -> String {
    let normalized = name.trim().to_lowercase();
    let combined = format!("{normalized}_{user_agent}_{ip_address}");

    let mut hasher = Sha256::new();
    hasher.update(combined.as_bytes());
    hex::encode(hasher.finalize())
}

pub(crate) fn create_session_token(
    attempt_id: &str,
    settings: &Settings,
    lifetime: Duration,
) -> Result<String, SecurityError> {
    let algorithm = algorithm_from_settings(settings)?;
    let expire = OffsetDateTime::now_utc() + lifetime;

    let claims = SessionClaims { sub: attempt_id.to_string(), exp: expire.unix_timestamp() };

    encode(
        &jsonwebtoken::Header::new(algorithm),
        &claims,
        &EncodingKey::from_secret(settings.security().secret_key.as_bytes()),
    )
    .map_err(|_| SecurityError::TokenEncoding)
}

pub(crate) fn verify_session_token(
    token: &str,
    settings: &Settings,
) -> Result<SessionClaims, SecurityError> {
    let algorithm = algorithm_from_settings(settings)?;
    let mut validation = Validation::new(algorithm);
    validation.validate_exp = true;
    validation.required_spec_claims.insert("exp".to_string());
    validation.required_spec_claims.insert("sub".to_string());

    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(settings.security().secret_key.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| SecurityError::TokenDecoding)
}

fn algorithm_from_settings(settings: &Settings) -> Result<Algorithm, SecurityError> {
    match settings.security().algorithm.as_str() {
        "HS256" => Ok(Algorithm::HS256),
        other => Err(SecurityError::UnsupportedAlgorithm(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn fingerprint_is_deterministic() {
        let a = derive_fingerprint("  Ann O'Brien ", "agent/1.0", "10.0.0.1");
        let b = derive_fingerprint("ann o'brien", "agent/1.0", "10.0.0.1");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_differs_when_any_input_differs() {
        let base = derive_fingerprint("Ann", "agent/1.0", "10.0.0.1");
        assert_ne!(base, derive_fingerprint("Bob", "agent/1.0", "10.0.0.1"));
        assert_ne!(base, derive_fingerprint("Ann", "agent/2.0", "10.0.0.1"));
        assert_ne!(base, derive_fingerprint("Ann", "agent/1.0", "10.0.0.2"));
    }

    #[test]
    fn session_token_roundtrip() {
        let _guard = test_support::env_lock();
        test_support::set_test_env();
        let settings = Settings::load().expect("settings");

        let token = create_session_token("attempt-123", &settings, Duration::minutes(1))
            .expect("token");
        let claims = verify_session_token(&token, &settings).expect("claims");

        assert_eq!(claims.sub, "attempt-123");
    }

    #[test]
    fn expired_session_token_is_rejected() {
        let _guard = test_support::env_lock();
        test_support::set_test_env();
        let settings = Settings::load().expect("settings");

        let token = create_session_token("attempt-123", &settings, Duration::minutes(-5))
            .expect("token");
        assert!(verify_session_token(&token, &settings).is_err());
    }
}
