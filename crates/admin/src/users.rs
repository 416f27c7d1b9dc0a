//! User management.

use serde::de::IgnoredAny;
use tracing::{info, instrument};

use autoparts_core::UserId;
use autoparts_storefront::api::{segment, unwrap_list};
use autoparts_storefront::types::User;
use autoparts_storefront::{ApiError, Result};

use super::AdminClient;

impl AdminClient {
    /// List every account.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` without an admin session, or the request error.
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.require_admin()?;
        let value = self.api.get_raw("/users", &[]).await?;
        unwrap_list(value, "users")
    }

    /// Get an account.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` without an admin session, or the request error.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn get_user(&self, id: &UserId) -> Result<User> {
        self.require_admin()?;
        self.api.get(&format!("/users/{}", segment(id.as_str()))).await
    }

    /// Ban or unban an account and return it as updated.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` without an admin session,
    /// `ApiError::Validation` when targeting the signed-in admin, or the
    /// request error.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn toggle_ban(&self, id: &UserId) -> Result<User> {
        let session = self.require_admin()?;
        if &session.user.id == id {
            return Err(ApiError::Validation(
                "No puedes bloquear tu propia cuenta".to_string(),
            ));
        }

        let path = format!("/users/{}", segment(id.as_str()));
        let _: IgnoredAny = self.api.patch_empty(&format!("{path}/toggle-ban")).await?;

        let user: User = self.api.get(&path).await?;
        info!(banned = user.is_banned, "User ban toggled");
        Ok(user)
    }
}
