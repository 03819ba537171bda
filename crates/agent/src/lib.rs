//! Generation layer for quoteforge: stage contexts, the backend seam, and
//! the three-stage quote generation pipeline.
//!
//! The generation backend is strictly a text producer. It never decides
//! final prices or validity; the pricing policy and extractor in
//! `quoteforge-core` are the deterministic authorities over whatever text
//! comes back.

pub mod backend;
pub mod llm;
pub mod pipeline;
pub mod stage;

pub use backend::OpenAiCompatibleBackend;
pub use llm::GenerationBackend;
pub use pipeline::{PipelineOutcome, QuotePipeline};
pub use stage::StageContext;
