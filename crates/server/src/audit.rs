//! Best-effort audit trail: each fulfilled quote is appended as a row to a
//! Google Sheet. Missing credentials make the logger report itself
//! unavailable instead of failing the run.

use async_trait::async_trait;
use chrono::Utc;
use quoteforge_core::config::AuditConfig;
use quoteforge_core::document::QuoteDocument;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::info;

use crate::orchestrator::AuditLogger;

#[derive(Debug, thiserror::Error)]
pub enum AuditLogError {
    #[error("audit log unavailable: {0}")]
    Unavailable(String),
    #[error("audit request failed: {0}")]
    Request(String),
    #[error("audit endpoint rejected the append (status {0})")]
    Rejected(u16),
}

pub struct SheetsAuditLogger {
    client: reqwest::Client,
    sheet_id: Option<String>,
    api_token: Option<SecretString>,
}

impl SheetsAuditLogger {
    pub fn from_config(config: &AuditConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            sheet_id: config.sheet_id.clone(),
            api_token: config.api_token.clone(),
        }
    }
}

#[async_trait]
impl AuditLogger for SheetsAuditLogger {
    async fn log(
        &self,
        client_name: &str,
        client_email: &str,
        document: &QuoteDocument,
    ) -> Result<(), AuditLogError> {
        let (sheet_id, api_token) = match (&self.sheet_id, &self.api_token) {
            (Some(sheet_id), Some(api_token)) => (sheet_id, api_token),
            _ => {
                return Err(AuditLogError::Unavailable(
                    "sheet id or API token not configured".to_owned(),
                ));
            }
        };

        let row = json!([[
            Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            client_name,
            client_email,
            document.project_summary,
            document.delivery_days,
            document.pricing.subtotal,
            document.pricing.vat,
            document.pricing.total,
            document.pricing.currency,
        ]]);

        let url = format!(
            "https://sheets.googleapis.com/v4/spreadsheets/{sheet_id}/values/A1:append\
             ?valueInputOption=USER_ENTERED"
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_token.expose_secret())
            .json(&json!({ "values": row }))
            .send()
            .await
            .map_err(|error| AuditLogError::Request(error.to_string()))?;

        if !response.status().is_success() {
            return Err(AuditLogError::Rejected(response.status().as_u16()));
        }

        info!(event_name = "audit.appended", client = %client_name, "audit row appended");
        Ok(())
    }
}
