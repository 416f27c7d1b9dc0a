//! JWT payload decoding.
//!
//! The client never verifies signatures (it has no key); it only reads the
//! payload to learn who is signed in and when the token stops being useful.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use thiserror::Error;

use autoparts_core::{UserId, UserRole};

/// Errors decoding a token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Not three dot-separated segments.
    #[error("token is not a JWT")]
    Malformed,

    /// Payload segment is not base64url.
    #[error("token payload is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Payload is not the expected JSON object.
    #[error("token payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Claims the storefront reads from a token payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject (user ID).
    pub user_id: Option<UserId>,
    /// User email, when the backend embeds it.
    pub email: Option<String>,
    /// Display name, when the backend embeds it.
    pub name: Option<String>,
    /// Role, when present and recognized.
    pub role: Option<UserRole>,
    /// Expiry (seconds since the Unix epoch).
    pub exp: Option<i64>,
    /// Issued-at (seconds since the Unix epoch).
    pub iat: Option<i64>,
}

/// Payload as sent. Backends disagree on the subject claim name, so each
/// spelling is a separate field.
#[derive(Deserialize)]
struct RawClaims {
    #[serde(default)]
    sub: Option<UserId>,
    #[serde(default)]
    id: Option<UserId>,
    #[serde(default, rename = "userId")]
    user_id_camel: Option<UserId>,
    #[serde(default, rename = "user_id")]
    user_id_snake: Option<UserId>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    exp: Option<f64>,
    #[serde(default)]
    iat: Option<f64>,
}

impl TokenClaims {
    /// Expiry as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single())
    }

    /// Whether the token is expired at `now`.
    ///
    /// A token without `exp` never expires on the client side.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp.is_some_and(|exp| exp <= now.timestamp())
    }

    /// Whether the token is expired right now.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Decode the payload of a JWT without verifying it.
///
/// # Errors
///
/// Returns `TokenError` if the token does not have three segments or the
/// payload is not base64url-encoded JSON.
pub fn decode_token(token: &str) -> Result<TokenClaims, TokenError> {
    let mut segments = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Malformed);
    };

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    let raw: RawClaims = serde_json::from_slice(&bytes)?;

    #[allow(clippy::cast_possible_truncation)] // Unix seconds fit comfortably in i64
    let seconds = |v: f64| v.trunc() as i64;

    Ok(TokenClaims {
        user_id: raw
            .sub
            .or(raw.id)
            .or(raw.user_id_camel)
            .or(raw.user_id_snake),
        email: raw.email,
        name: raw.name,
        role: raw.role.and_then(|r| r.parse().ok()),
        exp: raw.exp.map(seconds),
        iat: raw.iat.map(seconds),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn make_token(payload: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{body}.signature")
    }

    #[test]
    fn test_decode_standard_claims() {
        let token = make_token(&serde_json::json!({
            "sub": "64b7f0",
            "email": "taller@example.com",
            "role": "ADMIN",
            "exp": 1_900_000_000,
            "iat": 1_800_000_000
        }));
        let claims = decode_token(&token).unwrap();
        assert_eq!(claims.user_id, Some(UserId::new("64b7f0")));
        assert_eq!(claims.email.as_deref(), Some("taller@example.com"));
        assert_eq!(claims.role, Some(UserRole::Admin));
        assert_eq!(claims.exp, Some(1_900_000_000));
        assert_eq!(claims.iat, Some(1_800_000_000));
    }

    #[test]
    fn test_decode_numeric_user_id_alias() {
        let token = make_token(&serde_json::json!({ "userId": 12, "role": "user" }));
        let claims = decode_token(&token).unwrap();
        assert_eq!(claims.user_id, Some(UserId::new("12")));
        assert_eq!(claims.role, Some(UserRole::User));
        assert!(claims.exp.is_none());
    }

    #[test]
    fn test_unknown_role_is_ignored() {
        let token = make_token(&serde_json::json!({ "id": "1", "role": "superhero" }));
        assert!(decode_token(&token).unwrap().role.is_none());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_token("nope"), Err(TokenError::Malformed)));
        assert!(matches!(decode_token("a.b.c.d"), Err(TokenError::Malformed)));
        assert!(matches!(decode_token("a.!!!.c"), Err(TokenError::Base64(_))));
        let not_json = format!("a.{}.c", URL_SAFE_NO_PAD.encode("hello"));
        assert!(matches!(decode_token(&not_json), Err(TokenError::Json(_))));
    }

    #[test]
    fn test_expiry() {
        let now = Utc.timestamp_opt(1_000, 0).single().unwrap();
        let claims = |exp| TokenClaims {
            user_id: None,
            email: None,
            name: None,
            role: None,
            exp,
            iat: None,
        };
        assert!(claims(Some(999)).is_expired_at(now));
        assert!(claims(Some(1_000)).is_expired_at(now));
        assert!(!claims(Some(1_001)).is_expired_at(now));
        assert!(!claims(None).is_expired_at(now));
        assert_eq!(
            claims(Some(1_000)).expires_at().unwrap().timestamp(),
            1_000
        );
    }
}
