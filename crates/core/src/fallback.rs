use thiserror::Error;

use crate::document::{Pricing, QuoteDocument};
use crate::errors::{ExtractionFailure, GenerationBackendError};
use crate::pricing::PricingPolicy;

/// The faults a generation run can produce before a validated document
/// exists. The fallback policy decides which of these it absorbs.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PipelineFault {
    #[error(transparent)]
    Backend(#[from] GenerationBackendError),
    #[error(transparent)]
    Extraction(#[from] ExtractionFailure),
}

/// Deterministic document substituted when generation or extraction fails.
/// Field contents are configuration, not control flow, so tests and
/// deployments can swap the template without touching the pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefaultQuoteTemplate {
    pub project_summary: String,
    pub scope: Vec<String>,
    pub deliverables: Vec<String>,
    pub milestones: Vec<String>,
    pub assumptions: Vec<String>,
    pub exclusions: Vec<String>,
    pub risks: Vec<String>,
    pub disclaimer: String,
    pub delivery_days: i64,
}

impl Default for DefaultQuoteTemplate {
    fn default() -> Self {
        let items = |values: &[&str]| values.iter().map(|v| (*v).to_owned()).collect();
        Self {
            project_summary: "Project quote prepared from the submitted request.".to_owned(),
            scope: items(&["Requirement analysis", "Technical review", "Implementation"]),
            deliverables: items(&["Final deliverables"]),
            milestones: items(&["Requirements sign-off", "Development complete", "Delivery"]),
            assumptions: items(&[
                "Existing infrastructure can be reused",
                "Client cooperation is available",
            ]),
            exclusions: items(&["Additional requirements", "Maintenance"]),
            risks: items(&["Possible scope changes", "Possible schedule delays"]),
            disclaimer: "This quote is indicative and subject to change once the project \
                         scope is finalized. Amounts may be revised after the detailed scope \
                         is confirmed at contract time."
                .to_owned(),
            delivery_days: 30,
        }
    }
}

impl DefaultQuoteTemplate {
    /// Materialize the template as a document whose pricing already
    /// satisfies the active pricing policy.
    pub fn document(&self, pricing: &PricingPolicy) -> QuoteDocument {
        QuoteDocument {
            project_summary: self.project_summary.clone(),
            scope: self.scope.clone(),
            deliverables: self.deliverables.clone(),
            milestones: self.milestones.clone(),
            assumptions: self.assumptions.clone(),
            exclusions: self.exclusions.clone(),
            risks: self.risks.clone(),
            disclaimer: self.disclaimer.clone(),
            delivery_days: self.delivery_days,
            pricing: pricing.apply(&Pricing::default()),
        }
    }
}

/// Fallback-on-failure as an explicit policy object: the configured default
/// document plus the predicate deciding which faults it covers. Faults it
/// declines escalate to a pipeline-level error instead.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FallbackPolicy {
    template: DefaultQuoteTemplate,
}

impl FallbackPolicy {
    pub fn new(template: DefaultQuoteTemplate) -> Self {
        Self { template }
    }

    pub fn covers(&self, fault: &PipelineFault) -> bool {
        matches!(fault, PipelineFault::Backend(_) | PipelineFault::Extraction(_))
    }

    pub fn default_document(&self, pricing: &PricingPolicy) -> QuoteDocument {
        self.template.document(pricing)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{DefaultQuoteTemplate, FallbackPolicy, PipelineFault};
    use crate::errors::{ExtractionFailure, GenerationBackendError};
    use crate::pricing::PricingPolicy;

    fn policy() -> PricingPolicy {
        PricingPolicy::new(500_000, Decimal::new(1, 1))
    }

    #[test]
    fn default_document_is_deterministic() {
        let fallback = FallbackPolicy::default();
        assert_eq!(
            fallback.default_document(&policy()),
            fallback.default_document(&policy())
        );
    }

    #[test]
    fn default_document_satisfies_pricing_invariant() {
        let doc = FallbackPolicy::default().default_document(&policy());
        assert_eq!(doc.pricing.subtotal, 500_000);
        assert_eq!(doc.pricing.vat, 50_000);
        assert_eq!(doc.pricing.total, 550_000);
        assert_eq!(doc.pricing.currency, "KRW");
        assert_eq!(doc.delivery_days, 30);
    }

    #[test]
    fn policy_covers_backend_and_extraction_faults() {
        let fallback = FallbackPolicy::default();
        assert!(fallback.covers(&PipelineFault::Backend(GenerationBackendError::Timeout(30))));
        assert!(fallback.covers(&PipelineFault::Extraction(ExtractionFailure::NoPayload)));
    }

    #[test]
    fn custom_template_flows_through() {
        let template = DefaultQuoteTemplate {
            project_summary: "Placeholder quote.".to_owned(),
            delivery_days: 10,
            ..DefaultQuoteTemplate::default()
        };
        let doc = FallbackPolicy::new(template).default_document(&policy());
        assert_eq!(doc.project_summary, "Placeholder quote.");
        assert_eq!(doc.delivery_days, 10);
    }
}
