//! The three-stage quote generation pipeline: scope analysis → estimation →
//! proposal synthesis, then extraction and validation of the final
//! structured quote. Backend and extraction faults are absorbed by the
//! fallback policy; the pipeline always completes with a usable document.

use std::sync::Arc;

use quoteforge_core::document::{QuoteDocument, DEFAULT_DELIVERY_DAYS};
use quoteforge_core::errors::{ExtractionFailure, PipelineError};
use quoteforge_core::extract::extract_object;
use quoteforge_core::fallback::{FallbackPolicy, PipelineFault};
use quoteforge_core::pricing::PricingPolicy;
use tracing::{debug, info, warn};

use crate::llm::GenerationBackend;
use crate::stage;

/// Result of one pipeline run: a document generated by the backend, or the
/// deterministic fallback. Both are fully validated; the caller decides
/// whether the distinction matters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PipelineOutcome {
    Generated(QuoteDocument),
    Fallback(QuoteDocument),
}

impl PipelineOutcome {
    pub fn document(&self) -> &QuoteDocument {
        match self {
            Self::Generated(document) | Self::Fallback(document) => document,
        }
    }

    pub fn into_document(self) -> QuoteDocument {
        match self {
            Self::Generated(document) | Self::Fallback(document) => document,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

pub struct QuotePipeline {
    backend: Arc<dyn GenerationBackend>,
    pricing: PricingPolicy,
    fallback: FallbackPolicy,
}

impl QuotePipeline {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        pricing: PricingPolicy,
        fallback: FallbackPolicy,
    ) -> Self {
        Self { backend, pricing, fallback }
    }

    /// Produce a validated quote for the customer request. Faults covered by
    /// the fallback policy yield the default document instead of an error;
    /// only faults the policy declines surface as `PipelineError`.
    ///
    /// The pipeline never sees the client name, so the generated summary
    /// cannot contain it.
    pub async fn run(&self, customer_request: &str) -> Result<PipelineOutcome, PipelineError> {
        match self.generate(customer_request).await {
            Ok(document) => {
                info!(event_name = "pipeline.generated", "quote document generated");
                Ok(PipelineOutcome::Generated(document))
            }
            Err(fault) if self.fallback.covers(&fault) => {
                warn!(
                    event_name = "pipeline.fallback",
                    cause = %fault,
                    "generation failed, substituting default document"
                );
                Ok(PipelineOutcome::Fallback(self.fallback.default_document(&self.pricing)))
            }
            Err(fault) => Err(PipelineError::Internal(fault.to_string())),
        }
    }

    async fn generate(&self, customer_request: &str) -> Result<QuoteDocument, PipelineFault> {
        let scope_text = self.backend.run(&stage::scope_analysis(customer_request)).await?;
        debug!(stage = "scope_analysis", chars = scope_text.len(), "stage complete");

        let estimate_text = self.backend.run(&stage::estimation(&scope_text, &self.pricing)).await?;
        debug!(stage = "estimation", chars = estimate_text.len(), "stage complete");

        let proposal_text = self
            .backend
            .run(&stage::proposal_synthesis(&scope_text, &estimate_text, &self.pricing))
            .await?;
        debug!(stage = "proposal_synthesis", chars = proposal_text.len(), "stage complete");

        let extracted = extract_object(&proposal_text)?;
        let mut document: QuoteDocument = serde_json::from_value(extracted.object)
            .map_err(|error| ExtractionFailure::Parse(error.to_string()))?;

        document.normalize_delivery_days(DEFAULT_DELIVERY_DAYS);
        self.pricing.enforce(&mut document);

        Ok(document)
    }
}
