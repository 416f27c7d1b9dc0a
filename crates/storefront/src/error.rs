//! Unified error type for calls against the REST backend.
//!
//! Every HTTP status is mapped once, here, to a variant carrying the
//! customer-facing (Spanish) message. Services propagate `ApiError` with `?`
//! and the state contexts decide whether to surface it as a toast or to
//! silently drop the session-bound state.

use reqwest::StatusCode;
use thiserror::Error;

use crate::session::StoreError;

pub const MSG_UNAUTHORIZED: &str = "No autenticado. Por favor inicia sesión.";
pub const MSG_FORBIDDEN: &str = "No tienes permiso para realizar esta acción.";
pub const MSG_NOT_FOUND: &str = "Recurso no encontrado.";
pub const MSG_SERVER: &str = "Error del servidor. Intenta nuevamente más tarde.";
pub const MSG_CONNECTION: &str = "No se pudo conectar con el servidor.";
pub const MSG_DECODE: &str = "Respuesta inesperada del servidor.";
pub const MSG_SESSION: &str = "No se pudo acceder a la sesión guardada.";

/// Errors produced by the storefront client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401 from the backend.
    #[error("{}", MSG_UNAUTHORIZED)]
    Unauthorized,

    /// 403 from the backend.
    #[error("{}", MSG_FORBIDDEN)]
    Forbidden,

    /// 404 from the backend.
    #[error("{}", MSG_NOT_FOUND)]
    NotFound,

    /// 409 from the backend, with the server's explanation when present.
    #[error("Conflicto: {}", .0.as_deref().unwrap_or("el recurso ya existe."))]
    Conflict(Option<String>),

    /// Any 5xx from the backend.
    #[error("{}", MSG_SERVER)]
    Server(StatusCode),

    /// Any other non-success status; the server message is passed through,
    /// falling back to "Error HTTP {code}".
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    /// An operation that needs a signed-in user was attempted without one.
    #[error("{0}")]
    NotAuthenticated(String),

    /// Input rejected locally before any request was sent.
    #[error("{0}")]
    Validation(String),

    /// Transport-level failure (connection refused, timeout, TLS...).
    #[error("{}", MSG_CONNECTION)]
    Http(#[from] reqwest::Error),

    /// The response body was not the JSON shape we expected.
    #[error("{}", MSG_DECODE)]
    Decode(#[from] serde_json::Error),

    /// Reading or writing the persisted session failed.
    #[error("{}", MSG_SESSION)]
    Session(#[from] StoreError),
}

impl ApiError {
    /// Map a non-success HTTP status and optional server message to an error.
    #[must_use]
    pub fn from_status(status: StatusCode, message: Option<String>) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::FORBIDDEN => Self::Forbidden,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::CONFLICT => Self::Conflict(message),
            s if s.is_server_error() => Self::Server(s),
            s => Self::Status {
                status: s,
                message: message.unwrap_or_else(|| format!("Error HTTP {}", s.as_u16())),
            },
        }
    }

    /// HTTP status behind the error, if it came from a response.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            Self::Forbidden => Some(StatusCode::FORBIDDEN),
            Self::NotFound => Some(StatusCode::NOT_FOUND),
            Self::Conflict(_) => Some(StatusCode::CONFLICT),
            Self::Server(s) | Self::Status { status: s, .. } => Some(*s),
            Self::Http(e) => e.status(),
            _ => None,
        }
    }

    /// Whether this is an authentication-class error.
    ///
    /// Covers 401/403 responses, local "not signed in" short-circuits and any
    /// server message that talks about the token (expired, malformed, ...).
    #[must_use]
    pub fn is_auth_error(&self) -> bool {
        match self {
            Self::Unauthorized | Self::Forbidden | Self::NotAuthenticated(_) => true,
            Self::Status { message: m, .. } | Self::Conflict(Some(m)) => {
                m.to_lowercase().contains("token")
            }
            _ => false,
        }
    }

    /// Whether the error is a 404.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Message suitable for showing to the customer.
    #[must_use]
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Extract a human-readable message from an error response body.
///
/// Understands `{"message": "..."}`, `{"message": ["...", "..."]}` (validation
/// pipes) and `{"error": "..."}`. Non-JSON bodies are used verbatim when short.
#[must_use]
pub fn extract_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) else {
        return (trimmed.len() <= 200 && !trimmed.starts_with('<')).then(|| trimmed.to_string());
    };

    let from_field = |field: &str| match value.get(field)? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(serde_json::Value::as_str).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    };

    from_field("message").or_else(|| from_field("error"))
}
