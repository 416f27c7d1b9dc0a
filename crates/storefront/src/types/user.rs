//! User accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use autoparts_core::{UserId, UserRole};

/// An account as returned by `/auth/*` and `/users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default, alias = "banned")]
    pub is_banned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Name for display, falling back to the email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_user() {
        let user: User = serde_json::from_value(json!({
            "id": 4,
            "email": "ana@example.com",
            "role": "ADMIN",
            "banned": true
        }))
        .unwrap();
        assert_eq!(user.id, UserId::new("4"));
        assert!(user.is_admin());
        assert!(user.is_banned);
        assert_eq!(user.display_name(), "ana@example.com");
    }

    #[test]
    fn test_serialize_is_readable_back() {
        let user = User {
            id: UserId::new("u1"),
            name: "Luis".to_string(),
            email: "luis@example.com".to_string(),
            role: UserRole::User,
            is_banned: false,
            created_at: None,
        };
        let back: User = serde_json::from_value(serde_json::to_value(&user).unwrap()).unwrap();
        assert_eq!(back, user);
    }
}
