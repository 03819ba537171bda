//! Assembly of the running service from configuration: generation backend,
//! pipeline, renderer, notifier, and audit logger wired into one
//! orchestrator behind the HTTP state.

use std::sync::Arc;

use quoteforge_agent::backend::OpenAiCompatibleBackend;
use quoteforge_agent::pipeline::QuotePipeline;
use quoteforge_core::config::AppConfig;
use quoteforge_core::errors::GenerationBackendError;
use quoteforge_core::fallback::FallbackPolicy;
use quoteforge_core::pricing::PricingPolicy;
use tracing::info;

use crate::audit::SheetsAuditLogger;
use crate::notify::{EmailNotifier, NotificationError};
use crate::orchestrator::FulfillmentOrchestrator;
use crate::render::PdfRenderer;
use crate::routes::AppState;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Backend(#[from] GenerationBackendError),
    #[error(transparent)]
    Notifier(#[from] NotificationError),
    #[error("could not create output directory: {0}")]
    OutputDir(#[source] std::io::Error),
}

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let proposals_dir = config.output.proposals_dir();
    std::fs::create_dir_all(&proposals_dir).map_err(BootstrapError::OutputDir)?;

    let backend = OpenAiCompatibleBackend::from_config(&config.generation)?;
    let pricing = PricingPolicy::new(config.pricing.min_subtotal, config.pricing.vat_rate);
    let pipeline = QuotePipeline::new(Arc::new(backend), pricing, FallbackPolicy::default());

    let renderer = Arc::new(PdfRenderer::embedded(proposals_dir.clone()));
    let notifier = Arc::new(EmailNotifier::from_config(&config.email)?);
    let audit = Arc::new(SheetsAuditLogger::from_config(&config.audit));

    let orchestrator = FulfillmentOrchestrator::new(pipeline, renderer, notifier, audit);

    info!(
        event_name = "bootstrap.ready",
        provider = ?config.generation.provider,
        model = %config.generation.model,
        output_dir = %proposals_dir.display(),
        "application assembled"
    );

    Ok(Application {
        config,
        state: AppState { orchestrator: Arc::new(orchestrator) },
    })
}

#[cfg(test)]
mod tests {
    use quoteforge_core::config::{AppConfig, ConfigOverrides, LoadOptions};

    use super::bootstrap_with_config;

    #[test]
    fn bootstrap_creates_the_proposals_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                output_dir: Some(dir.path().join("artifacts")),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .unwrap();

        let application = bootstrap_with_config(config).unwrap();
        assert!(dir.path().join("artifacts").join("proposals").is_dir());
        assert_eq!(application.config.server.port, 8000);
    }
}
