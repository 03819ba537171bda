use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::DomainError;

/// Delivery window applied when the generated document omits the field or
/// carries a non-positive value.
pub const DEFAULT_DELIVERY_DAYS: i64 = 30;

/// Immutable input to a single pipeline run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub client_name: String,
    pub client_email: String,
    pub customer_request: String,
}

impl QuoteRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.client_name.trim().is_empty() {
            return Err(DomainError::InvalidRequest {
                field: "client_name",
                reason: "must not be empty".to_owned(),
            });
        }
        if !is_valid_email(&self.client_email) {
            return Err(DomainError::InvalidRequest {
                field: "client_email",
                reason: format!("`{}` is not a valid email address", self.client_email),
            });
        }
        if self.customer_request.trim().is_empty() {
            return Err(DomainError::InvalidRequest {
                field: "customer_request",
                reason: "must not be empty".to_owned(),
            });
        }
        Ok(())
    }
}

/// Syntactic address check: one `@`, non-empty local part, dotted domain
/// without leading/trailing dots. Deliverability is the SMTP server's call.
pub fn is_valid_email(address: &str) -> bool {
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || address.contains(char::is_whitespace) {
        return false;
    }
    if domain.contains('@') || !domain.contains('.') {
        return false;
    }
    !domain.starts_with('.') && !domain.ends_with('.') && !domain.contains("..")
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    #[serde(default)]
    pub subtotal: i64,
    #[serde(default)]
    pub vat: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    crate::pricing::CURRENCY_KRW.to_owned()
}

impl Default for Pricing {
    fn default() -> Self {
        Self { subtotal: 0, vat: 0, total: 0, currency: default_currency() }
    }
}

/// Canonical structured quote. Every field carries a serde default so a
/// partially populated generated object still deserializes; missing list
/// fields become empty sequences.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteDocument {
    #[serde(default)]
    pub project_summary: String,
    #[serde(default)]
    pub scope: Vec<String>,
    #[serde(default)]
    pub deliverables: Vec<String>,
    #[serde(default)]
    pub milestones: Vec<String>,
    #[serde(default)]
    pub assumptions: Vec<String>,
    #[serde(default)]
    pub exclusions: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub disclaimer: String,
    #[serde(default)]
    pub delivery_days: i64,
    #[serde(default)]
    pub pricing: Pricing,
}

impl QuoteDocument {
    /// Clamp an absent, zero, or negative delivery window to the default.
    /// Zero is never accepted as a sentinel for "unset".
    pub fn normalize_delivery_days(&mut self, default_days: i64) {
        if self.delivery_days < 1 {
            warn!(
                delivery_days = self.delivery_days,
                default_days, "non-positive delivery_days replaced with default"
            );
            self.delivery_days = default_days;
        }
    }
}
