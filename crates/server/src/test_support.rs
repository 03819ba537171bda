//! Shared mocks for server-side tests: a scripted generation backend plus
//! renderer, notifier, and audit doubles that count invocations.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quoteforge_agent::llm::GenerationBackend;
use quoteforge_agent::pipeline::QuotePipeline;
use quoteforge_agent::stage::StageContext;
use quoteforge_core::document::QuoteDocument;
use quoteforge_core::errors::GenerationBackendError;
use quoteforge_core::fallback::FallbackPolicy;
use quoteforge_core::pricing::PricingPolicy;
use rust_decimal::Decimal;

use crate::audit::AuditLogError;
use crate::notify::NotificationError;
use crate::orchestrator::{AuditLogger, DocumentRenderer, NotificationDispatcher};
use crate::render::RenderError;

pub const PROPOSAL_FIXTURE: &str = r#"Final proposal below.
```json
{
  "project_summary": "Inventory dashboard for a mid-size retailer.",
  "scope": ["Data model design", "Dashboard implementation"],
  "deliverables": ["Deployed dashboard"],
  "milestones": ["Design sign-off", "Launch"],
  "assumptions": ["API access provided"],
  "exclusions": ["Mobile app"],
  "risks": ["Data quality"],
  "disclaimer": "This quote is indicative and subject to change once scope is finalized.",
  "delivery_days": 21,
  "pricing": {"subtotal": 800000, "vat": 0, "total": 0, "currency": "USD"}
}
```"#;

struct ScriptedBackend {
    responses: Mutex<Vec<Result<String, GenerationBackendError>>>,
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn run(&self, _context: &StageContext) -> Result<String, GenerationBackendError> {
        self.responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(Err(GenerationBackendError::EmptyCompletion))
    }
}

pub fn scripted_pipeline(responses: Vec<Result<String, GenerationBackendError>>) -> QuotePipeline {
    let mut reversed = responses;
    reversed.reverse();
    QuotePipeline::new(
        Arc::new(ScriptedBackend { responses: Mutex::new(reversed) }),
        PricingPolicy::new(500_000, Decimal::new(1, 1)),
        FallbackPolicy::default(),
    )
}

pub struct MockRenderer {
    ok: bool,
    pub calls: AtomicUsize,
}

impl MockRenderer {
    pub fn new(ok: bool) -> Self {
        Self { ok, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl DocumentRenderer for MockRenderer {
    async fn render(
        &self,
        _document: &QuoteDocument,
        _client_name: &str,
        filename: &str,
    ) -> Result<PathBuf, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.ok {
            Ok(PathBuf::from("output").join(filename))
        } else {
            Err(RenderError::Conversion("converter exited with status 1".to_owned()))
        }
    }
}

pub struct MockNotifier {
    ok: bool,
    pub calls: AtomicUsize,
}

impl MockNotifier {
    pub fn new(ok: bool) -> Self {
        Self { ok, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl NotificationDispatcher for MockNotifier {
    async fn send(
        &self,
        _to_address: &str,
        _client_name: &str,
        _attachment: &Path,
        _subject: &str,
        _body: &str,
    ) -> Result<(), NotificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.ok {
            Ok(())
        } else {
            Err(NotificationError::Transport("connection refused".to_owned()))
        }
    }
}

pub struct MockAudit {
    ok: bool,
    pub calls: AtomicUsize,
}

impl MockAudit {
    pub fn new(ok: bool) -> Self {
        Self { ok, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl AuditLogger for MockAudit {
    async fn log(
        &self,
        _client_name: &str,
        _client_email: &str,
        _document: &QuoteDocument,
    ) -> Result<(), AuditLogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.ok {
            Ok(())
        } else {
            Err(AuditLogError::Rejected(503))
        }
    }
}
