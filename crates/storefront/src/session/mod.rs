//! Authentication: token storage, JWT decoding and sign-in/register/sign-out.
//!
//! A session is usable while its token decodes and has not expired. Expired
//! or undecodable tokens are removed from the store the first time they are
//! looked at, so the rest of the crate only ever sees valid sessions.

mod store;
mod token;

pub use store::{FileTokenStore, MemoryTokenStore, StoreError, StoredSession, TokenStore};
pub use token::{TokenClaims, TokenError, decode_token};

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use autoparts_core::Email;

use crate::api::ApiClient;
use crate::error::{ApiError, Result};
use crate::types::User;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

/// The signed-in user and the claims of their token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub claims: TokenClaims,
}

impl AuthSession {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.user.role.is_admin()
    }
}

#[derive(Serialize)]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

impl ApiClient {
    /// The current session, if a valid one is stored.
    ///
    /// An expired or undecodable token is cleared from the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read or cleared.
    pub fn current_session(&self) -> Result<Option<AuthSession>> {
        let store = self.token_store();
        let Some(stored) = store.load()? else {
            return Ok(None);
        };

        let claims = match decode_token(stored.token.expose_secret()) {
            Ok(claims) if !claims.is_expired() => claims,
            Ok(claims) => {
                debug!(expires_at = ?claims.expires_at(), "Stored token expired, clearing session");
                store.clear()?;
                return Ok(None);
            }
            Err(e) => {
                debug!(error = %e, "Stored token is not a valid JWT, clearing session");
                store.clear()?;
                return Ok(None);
            }
        };

        let Some(user) = stored.user.or_else(|| user_from_claims(&claims)) else {
            debug!("Stored token carries no user");
            return Ok(None);
        };
        Ok(Some(AuthSession { user, claims }))
    }

    /// The signed-in user, if any.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::current_session`].
    pub fn current_user(&self) -> Result<Option<User>> {
        Ok(self.current_session()?.map(|s| s.user))
    }

    /// The current session, or `NotAuthenticated` naming what was attempted.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotAuthenticated` when no valid session is stored.
    pub fn require_session(&self, action: &str) -> Result<AuthSession> {
        self.current_session()?
            .ok_or_else(|| ApiError::NotAuthenticated(format!("Debes iniciar sesión para {action}")))
    }

    /// Sign in with email and password and persist the session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` for a malformed email or empty password,
    /// or the backend's error (401 for bad credentials).
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let email = parse_email(email)?;
        if password.is_empty() {
            return Err(ApiError::Validation("La contraseña es obligatoria".to_string()));
        }

        let body = SignInRequest {
            email: email.as_str(),
            password,
        };
        let response = self.post_raw("/auth/signin", &body).await?;
        self.establish_session(&response)
    }

    /// Create an account and sign in to it.
    ///
    /// If the backend does not return a token on registration, a sign-in
    /// with the same credentials follows.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` for an empty name, malformed email or a
    /// password shorter than [`MIN_PASSWORD_LEN`], or the backend's error
    /// (409 when the email is taken).
    #[instrument(skip(self, password))]
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthSession> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::Validation("El nombre es obligatorio".to_string()));
        }
        let email = parse_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::Validation(format!(
                "La contraseña debe tener al menos {MIN_PASSWORD_LEN} caracteres"
            )));
        }

        let body = RegisterRequest {
            name,
            email: email.as_str(),
            password,
        };
        let response = self.post_raw("/auth/register", &body).await?;
        if find_token(&response).is_none() {
            debug!("Registration returned no token, signing in");
            return self.sign_in(email.as_str(), password).await;
        }
        self.establish_session(&response)
    }

    /// Forget the stored session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be cleared.
    pub fn sign_out(&self) -> Result<()> {
        self.token_store().clear()?;
        info!("Signed out");
        Ok(())
    }

    fn establish_session(&self, response: &Value) -> Result<AuthSession> {
        let token = find_token(response)
            .ok_or_else(|| unexpected_response("authentication response has no token"))?;
        let claims = decode_token(token)
            .map_err(|e| unexpected_response(&format!("authentication token is invalid: {e}")))?;

        let user = find_user(response)
            .or_else(|| user_from_claims(&claims))
            .ok_or_else(|| unexpected_response("authentication response has no user"))?;

        self.token_store()
            .save(&StoredSession::new(token, Some(user.clone())))?;
        info!(user_id = %user.id, role = %user.role, "Signed in");

        Ok(AuthSession { user, claims })
    }
}

fn parse_email(raw: &str) -> Result<Email> {
    Email::parse(raw).map_err(|e| ApiError::Validation(format!("Email inválido: {e}")))
}

/// Token from `token`/`accessToken`/`access_token`, at the top level or under `data`.
fn find_token(response: &Value) -> Option<&str> {
    let scopes = [Some(response), response.get("data")];
    scopes.into_iter().flatten().find_map(|scope| {
        ["token", "accessToken", "access_token"]
            .iter()
            .find_map(|key| scope.get(*key).and_then(Value::as_str))
            .filter(|t| !t.is_empty())
    })
}

/// User from `user`, at the top level or under `data`.
fn find_user(response: &Value) -> Option<User> {
    let scopes = [Some(response), response.get("data")];
    scopes
        .into_iter()
        .flatten()
        .filter_map(|scope| scope.get("user"))
        .find_map(|user| User::deserialize(user).ok())
}

fn user_from_claims(claims: &TokenClaims) -> Option<User> {
    let id = claims.user_id.clone()?;
    let email = claims.email.clone().unwrap_or_default();
    Some(User {
        id,
        name: claims.name.clone().unwrap_or_else(|| email.clone()),
        email,
        role: claims.role.unwrap_or_default(),
        is_banned: false,
        created_at: None,
    })
}

fn unexpected_response(message: &str) -> ApiError {
    ApiError::Decode(<serde_json::Error as serde::de::Error>::custom(message))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    use autoparts_core::{UserId, UserRole};

    #[test]
    fn test_find_token_variants() {
        assert_eq!(find_token(&json!({ "token": "a" })), Some("a"));
        assert_eq!(find_token(&json!({ "accessToken": "b" })), Some("b"));
        assert_eq!(find_token(&json!({ "data": { "access_token": "c" } })), Some("c"));
        assert_eq!(find_token(&json!({ "token": "" })), None);
        assert_eq!(find_token(&json!({ "user": {} })), None);
    }

    #[test]
    fn test_find_user_nested() {
        let user = find_user(&json!({
            "data": { "token": "t", "user": { "id": 1, "email": "a@b.co", "role": "admin" } }
        }))
        .unwrap();
        assert_eq!(user.id, UserId::new("1"));
        assert_eq!(user.role, UserRole::Admin);
    }

    #[test]
    fn test_user_from_claims() {
        let claims = TokenClaims {
            user_id: Some(UserId::new("9")),
            email: Some("x@y.com".to_string()),
            name: None,
            role: Some(UserRole::Admin),
            exp: None,
            iat: None,
        };
        let user = user_from_claims(&claims).unwrap();
        assert_eq!(user.name, "x@y.com");
        assert!(user.role.is_admin());

        let anonymous = TokenClaims {
            user_id: None,
            ..claims
        };
        assert!(user_from_claims(&anonymous).is_none());
    }
}
