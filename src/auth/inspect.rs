//! Lightweight JWT inspection. No signature verification is performed; the
//! claims are only used to warn about expired tokens before connecting.

#[cfg(test)]
#[path = "inspect_test.rs"]
mod inspect_test;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct TokenInspection {
    pub claims: Value,
    /// Seconds until `exp`; negative when already expired.
    pub expires_in: Option<i64>,
    pub is_expired: Option<bool>,
}

/// Decode the payload segment of a JWT into its JSON claims.
///
/// Returns `None` for opaque tokens and malformed payloads.
#[must_use]
pub fn decode_claims(token: &str) -> Option<Value> {
    let mut parts = token.split('.');
    let _header = parts.next()?;
    let payload = parts.next()?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    claims.is_object().then_some(claims)
}

/// Inspect a token's claims relative to `now_secs` (Unix seconds).
#[must_use]
pub fn inspect_token(token: &str, now_secs: i64) -> Option<TokenInspection> {
    if token.trim().is_empty() {
        tracing::warn!("no access token provided to inspect");
        return None;
    }

    let Some(claims) = decode_claims(token) else {
        tracing::debug!("token payload could not be decoded (opaque token?)");
        return None;
    };

    let expires_in = claims.get("exp").and_then(Value::as_i64).map(|exp| exp - now_secs);
    Some(TokenInspection { claims, expires_in, is_expired: expires_in.map(|secs| secs <= 0) })
}

/// Current Unix time in seconds.
#[must_use]
pub fn now_secs() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}
