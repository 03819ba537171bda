use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid request field `{field}`: {reason}")]
    InvalidRequest { field: &'static str, reason: String },
}

/// Failure of the external text-generation backend for a single stage call.
///
/// The stage runner performs no retries; callers decide whether a failed
/// stage aborts generation or triggers the fallback document.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GenerationBackendError {
    #[error("generation backend unreachable: {0}")]
    Unreachable(String),
    #[error("generation backend rejected the request: {0}")]
    Rejected(String),
    #[error("generation backend timed out after {0}s")]
    Timeout(u64),
    #[error("generation backend returned an empty completion")]
    EmptyCompletion,
}

/// Expected "no match" outcomes of structured-output recovery. These are
/// ordinary values, not exceptions: the extractor reports which attempt
/// failed and never returns a partially parsed object.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExtractionFailure {
    #[error("no structured payload found in generated text")]
    NoPayload,
    #[error("selected payload failed to parse: {0}")]
    Parse(String),
    #[error("parsed payload is not an object")]
    NotAnObject,
}

/// Anomaly in the pipeline's own control flow. Backend and extraction
/// faults are absorbed by the fallback policy and never surface as this.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("quote pipeline failure: {0}")]
    Internal(String),
}
