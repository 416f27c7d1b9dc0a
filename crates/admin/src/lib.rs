//! Autoparts store administration.
//!
//! Every operation here requires a signed-in user with the `admin` role.
//! The check happens locally, before any request is sent; the backend
//! enforces the same rule independently.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod dashboard;
mod orders;
pub mod products;
mod users;

use tracing::warn;

use autoparts_storefront::session::AuthSession;
use autoparts_storefront::{ApiClient, ApiError, Result};

pub use dashboard::{DashboardStats, LOW_STOCK_THRESHOLD};
pub use products::{ProductInput, ProductPatch};

/// Client for the administration operations.
#[derive(Debug, Clone)]
pub struct AdminClient {
    api: ApiClient,
}

impl AdminClient {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Underlying REST client.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// The current session, if it belongs to an admin.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` when signed out or signed in without the
    /// admin role, or an error if the session store cannot be read.
    pub fn require_admin(&self) -> Result<AuthSession> {
        match self.api.current_session()? {
            Some(session) if session.is_admin() => Ok(session),
            Some(session) => {
                warn!(user_id = %session.user.id, "Admin operation refused for non-admin user");
                Err(ApiError::Forbidden)
            }
            None => {
                warn!("Admin operation refused without a session");
                Err(ApiError::Forbidden)
            }
        }
    }
}
