//! Domain core for the quote generation and fulfillment pipeline: data
//! model, pricing policy, structured-output extraction, fallback policy,
//! error taxonomy, and application configuration.

pub mod config;
pub mod document;
pub mod errors;
pub mod extract;
pub mod fallback;
pub mod pricing;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use document::{Pricing, QuoteDocument, QuoteRequest, DEFAULT_DELIVERY_DAYS};
pub use errors::{DomainError, ExtractionFailure, GenerationBackendError, PipelineError};
pub use extract::{extract_object, Extracted, ExtractionStrategy};
pub use fallback::{DefaultQuoteTemplate, FallbackPolicy, PipelineFault};
pub use pricing::{PricingPolicy, CURRENCY_KRW};
