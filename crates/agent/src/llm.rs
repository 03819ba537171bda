use async_trait::async_trait;
use quoteforge_core::errors::GenerationBackendError;

use crate::stage::StageContext;

/// One call to the external text-generation service for a single stage.
/// No retries happen at this layer; retry policy, if any, belongs to the
/// backend adapter.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn run(&self, context: &StageContext) -> Result<String, GenerationBackendError>;
}
