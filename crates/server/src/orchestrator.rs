//! Fulfillment orchestration: given a validated quote request, drive the
//! pipeline, document rendering, notification dispatch, and audit logging
//! under a per-step failure policy.
//!
//! The run walks named steps (`Generating → Rendering → Notifying →
//! Logging → Done`); each step's failure disposition comes from one table
//! rather than ad hoc nested handling. Audit logging is strictly
//! best-effort and never alters the caller-visible outcome.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use quoteforge_agent::pipeline::QuotePipeline;
use quoteforge_core::document::{QuoteDocument, QuoteRequest};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::audit::AuditLogError;
use crate::notify::NotificationError;
use crate::render::RenderError;

#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(
        &self,
        document: &QuoteDocument,
        client_name: &str,
        filename: &str,
    ) -> Result<PathBuf, RenderError>;
}

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send(
        &self,
        to_address: &str,
        client_name: &str,
        attachment: &Path,
        subject: &str,
        body: &str,
    ) -> Result<(), NotificationError>;
}

#[async_trait]
pub trait AuditLogger: Send + Sync {
    async fn log(
        &self,
        client_name: &str,
        client_email: &str,
        document: &QuoteDocument,
    ) -> Result<(), AuditLogError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentStatus {
    Success,
    Degraded,
    Error,
}

/// Terminal result of one fulfillment run; also the wire model returned by
/// the gateway.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FulfillmentResult {
    pub status: FulfillmentStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FulfillmentStep {
    Generating,
    Rendering,
    Notifying,
    Logging,
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepDisposition {
    /// Status the run takes when this step fails; `None` leaves the status
    /// untouched.
    pub status: Option<FulfillmentStatus>,
    /// Whether later steps still run after this step fails.
    pub continue_run: bool,
}

impl FulfillmentStep {
    /// The per-step failure table: generation and rendering abort the run,
    /// notification degrades it, audit logging is invisible to the caller.
    pub const fn on_failure(self) -> StepDisposition {
        match self {
            Self::Generating | Self::Rendering => {
                StepDisposition { status: Some(FulfillmentStatus::Error), continue_run: false }
            }
            Self::Notifying => {
                StepDisposition { status: Some(FulfillmentStatus::Degraded), continue_run: true }
            }
            Self::Logging | Self::Done => StepDisposition { status: None, continue_run: true },
        }
    }
}

pub struct FulfillmentOrchestrator {
    pipeline: QuotePipeline,
    renderer: Arc<dyn DocumentRenderer>,
    notifier: Arc<dyn NotificationDispatcher>,
    audit: Arc<dyn AuditLogger>,
}

impl FulfillmentOrchestrator {
    pub fn new(
        pipeline: QuotePipeline,
        renderer: Arc<dyn DocumentRenderer>,
        notifier: Arc<dyn NotificationDispatcher>,
        audit: Arc<dyn AuditLogger>,
    ) -> Self {
        Self { pipeline, renderer, notifier, audit }
    }

    /// Drive the full lifecycle for one request and return exactly one
    /// terminal result. Never panics a request into an ambiguous state.
    pub async fn fulfill(&self, request: &QuoteRequest) -> FulfillmentResult {
        let client_name = request.client_name.trim();

        // Generating: backend/extraction faults are already absorbed inside
        // the pipeline; an error here is a pipeline control-flow anomaly.
        let outcome = match self.pipeline.run(&request.customer_request).await {
            Ok(outcome) => outcome,
            Err(pipeline_error) => {
                return self.abort(
                    FulfillmentStep::Generating,
                    "quote generation failed",
                    pipeline_error.to_string(),
                );
            }
        };
        let fallback_used = outcome.is_fallback();
        let document = outcome.into_document();

        // Rendering
        let filename = proposal_filename();
        let path = match self.renderer.render(&document, client_name, &filename).await {
            Ok(path) => path,
            Err(render_error) => {
                return self.abort(
                    FulfillmentStep::Rendering,
                    "document rendering failed",
                    render_error.to_string(),
                );
            }
        };
        info!(
            event_name = "fulfillment.rendered",
            path = %path.display(),
            fallback_used,
            "quote document rendered"
        );

        // Notifying
        let mut status = FulfillmentStatus::Success;
        let subject = format!("[Quote] Request from {client_name}");
        let body = notification_body(client_name);
        if let Err(notify_error) = self
            .notifier
            .send(&request.client_email, client_name, &path, &subject, &body)
            .await
        {
            let disposition = FulfillmentStep::Notifying.on_failure();
            warn!(
                event_name = "fulfillment.notification_failed",
                cause = %notify_error,
                "quote email delivery failed, continuing"
            );
            if let Some(degraded) = disposition.status {
                status = degraded;
            }
        }

        // Logging: failure is recorded in diagnostics only.
        if let Err(audit_error) = self.audit.log(client_name, &request.client_email, &document).await
        {
            let disposition = FulfillmentStep::Logging.on_failure();
            debug_assert!(disposition.status.is_none() && disposition.continue_run);
            match audit_error {
                AuditLogError::Unavailable(reason) => {
                    debug!(event_name = "fulfillment.audit_skipped", %reason, "audit log skipped")
                }
                other => {
                    warn!(event_name = "fulfillment.audit_failed", cause = %other, "audit log failed")
                }
            }
        }

        let message = if status == FulfillmentStatus::Success {
            "Quote generated and sent."
        } else {
            "Quote generated. (email delivery failed)"
        };

        info!(event_name = "fulfillment.done", status = ?status, "fulfillment complete");
        FulfillmentResult {
            status,
            message: message.to_owned(),
            document_filename: Some(filename),
            document_path: Some(path.display().to_string()),
            error: None,
        }
    }

    fn abort(&self, step: FulfillmentStep, message: &str, cause: String) -> FulfillmentResult {
        let disposition = step.on_failure();
        debug_assert!(!disposition.continue_run);
        error!(
            event_name = "fulfillment.aborted",
            step = ?step,
            cause = %cause,
            "fulfillment aborted"
        );
        FulfillmentResult {
            status: disposition.status.unwrap_or(FulfillmentStatus::Error),
            message: message.to_owned(),
            document_filename: None,
            document_path: None,
            error: Some(cause),
        }
    }
}

fn notification_body(client_name: &str) -> String {
    format!(
        "Hello {client_name},\n\n\
         Please find attached an indicative quote for your requested project.\n\
         This quote is for reference; amounts and schedule may be adjusted once \
         the scope is finalized.\n\n\
         Best regards,\n\
         Quoteforge"
    )
}

/// Time-based name with a random suffix so two requests completing within
/// the same second still get distinct files.
pub fn proposal_filename() -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("quote_{timestamp}_{}.pdf", &suffix[..8])
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use quoteforge_core::document::QuoteRequest;

    use super::{proposal_filename, FulfillmentStatus, FulfillmentStep, FulfillmentOrchestrator};
    use crate::test_support::{
        scripted_pipeline, MockAudit, MockNotifier, MockRenderer, PROPOSAL_FIXTURE,
    };

    fn request() -> QuoteRequest {
        QuoteRequest {
            client_name: "Hana Trading".to_owned(),
            client_email: "ops@hana.example.com".to_owned(),
            customer_request: "Build an inventory dashboard".to_owned(),
        }
    }

    struct Harness {
        orchestrator: FulfillmentOrchestrator,
        renderer: Arc<MockRenderer>,
        notifier: Arc<MockNotifier>,
        audit: Arc<MockAudit>,
    }

    fn harness(render_ok: bool, notify_ok: bool, audit_ok: bool) -> Harness {
        let renderer = Arc::new(MockRenderer::new(render_ok));
        let notifier = Arc::new(MockNotifier::new(notify_ok));
        let audit = Arc::new(MockAudit::new(audit_ok));
        let orchestrator = FulfillmentOrchestrator::new(
            scripted_pipeline(vec![
                Ok("SCOPE".to_owned()),
                Ok("ESTIMATE".to_owned()),
                Ok(PROPOSAL_FIXTURE.to_owned()),
            ]),
            renderer.clone(),
            notifier.clone(),
            audit.clone(),
        );
        Harness { orchestrator, renderer, notifier, audit }
    }

    #[tokio::test]
    async fn all_steps_succeeding_yields_success() {
        let harness = harness(true, true, true);
        let result = harness.orchestrator.fulfill(&request()).await;

        assert_eq!(result.status, FulfillmentStatus::Success);
        assert_eq!(result.message, "Quote generated and sent.");
        assert!(result.document_filename.is_some());
        assert!(result.document_path.is_some());
        assert!(result.error.is_none());
        assert_eq!(harness.renderer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(harness.notifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(harness.audit.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn render_failure_aborts_with_no_downstream_effects() {
        let harness = harness(false, true, true);
        let result = harness.orchestrator.fulfill(&request()).await;

        assert_eq!(result.status, FulfillmentStatus::Error);
        assert!(result.document_filename.is_none());
        assert!(result.document_path.is_none());
        assert!(result.error.is_some());
        assert_eq!(harness.notifier.calls.load(Ordering::SeqCst), 0);
        assert_eq!(harness.audit.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn notification_failure_degrades_but_audit_still_runs() {
        let harness = harness(true, false, true);
        let result = harness.orchestrator.fulfill(&request()).await;

        assert_eq!(result.status, FulfillmentStatus::Degraded);
        assert_eq!(result.message, "Quote generated. (email delivery failed)");
        assert!(result.document_path.is_some());
        assert_eq!(harness.audit.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn audit_failure_is_invisible_to_the_caller() {
        let harness = harness(true, true, false);
        let result = harness.orchestrator.fulfill(&request()).await;

        assert_eq!(result.status, FulfillmentStatus::Success);
        assert!(result.error.is_none());
        assert_eq!(harness.audit.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn generation_fallback_still_fulfills() {
        let renderer = Arc::new(MockRenderer::new(true));
        let notifier = Arc::new(MockNotifier::new(true));
        let audit = Arc::new(MockAudit::new(true));
        let orchestrator = FulfillmentOrchestrator::new(
            scripted_pipeline(vec![
                Ok("SCOPE".to_owned()),
                Ok("ESTIMATE".to_owned()),
                Ok("no structured output".to_owned()),
            ]),
            renderer,
            notifier,
            audit,
        );

        let result = orchestrator.fulfill(&request()).await;
        assert_eq!(result.status, FulfillmentStatus::Success);
    }

    #[test]
    fn failure_table_matches_the_policy() {
        let generating = FulfillmentStep::Generating.on_failure();
        assert_eq!(generating.status, Some(FulfillmentStatus::Error));
        assert!(!generating.continue_run);

        let rendering = FulfillmentStep::Rendering.on_failure();
        assert_eq!(rendering.status, Some(FulfillmentStatus::Error));
        assert!(!rendering.continue_run);

        let notifying = FulfillmentStep::Notifying.on_failure();
        assert_eq!(notifying.status, Some(FulfillmentStatus::Degraded));
        assert!(notifying.continue_run);

        let logging = FulfillmentStep::Logging.on_failure();
        assert_eq!(logging.status, None);
        assert!(logging.continue_run);
    }

    #[test]
    fn proposal_filenames_are_distinct_within_a_second() {
        let first = proposal_filename();
        let second = proposal_filename();
        assert_ne!(first, second);
        assert!(first.starts_with("quote_"));
        assert!(first.ends_with(".pdf"));
    }
}
