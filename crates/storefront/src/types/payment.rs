//! MercadoPago checkout preferences.

use serde::Deserialize;

use autoparts_core::PaymentPreferenceId;

/// A checkout session created from a cart.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPreference {
    #[serde(default, alias = "preferenceId")]
    pub id: Option<PaymentPreferenceId>,
    #[serde(default, alias = "init_point", alias = "url", alias = "redirectUrl")]
    pub init_point: Option<String>,
    #[serde(default, alias = "sandbox_init_point")]
    pub sandbox_init_point: Option<String>,
}

impl PaymentPreference {
    /// Where to send the customer. Prefers the sandbox URL when `sandbox` is
    /// set and one was returned.
    #[must_use]
    pub fn redirect_url(&self, sandbox: bool) -> Option<&str> {
        let production = self.init_point.as_deref().filter(|u| !u.is_empty());
        let test = self.sandbox_init_point.as_deref().filter(|u| !u.is_empty());
        if sandbox {
            test.or(production)
        } else {
            production.or(test)
        }
    }
}
