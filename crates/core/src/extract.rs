//! Recovery of a structured object from free-text generation output.
//!
//! The backend returns prose, not a typed value, so extraction is an ordered
//! set of pattern-match attempts with tagged outcomes. The first matching
//! candidate is authoritative: if its content fails to parse, the whole
//! extraction fails rather than falling through to a later pattern.

use serde_json::Value;

use crate::errors::ExtractionFailure;

const TAGGED_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Which candidate pattern produced the parsed payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// A fenced block explicitly tagged as JSON.
    TaggedFence,
    /// The first fenced block, whatever its tag.
    AnyFence,
    /// The span from the first `{` to the last `}`.
    BraceSpan,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Extracted {
    pub strategy: ExtractionStrategy,
    pub object: Value,
}

pub fn extract_object(raw: &str) -> Result<Extracted, ExtractionFailure> {
    let (strategy, candidate) = select_candidate(raw).ok_or(ExtractionFailure::NoPayload)?;

    let value: Value = serde_json::from_str(candidate)
        .map_err(|error| ExtractionFailure::Parse(error.to_string()))?;
    if !value.is_object() {
        return Err(ExtractionFailure::NotAnObject);
    }

    Ok(Extracted { strategy, object: value })
}

fn select_candidate(raw: &str) -> Option<(ExtractionStrategy, &str)> {
    if let Some(start) = raw.find(TAGGED_FENCE) {
        let body = &raw[start + TAGGED_FENCE.len()..];
        let end = body.find(FENCE).unwrap_or(body.len());
        return Some((ExtractionStrategy::TaggedFence, body[..end].trim()));
    }

    if let Some(start) = raw.find(FENCE) {
        let body = &raw[start + FENCE.len()..];
        let end = body.find(FENCE).unwrap_or(body.len());
        return Some((ExtractionStrategy::AnyFence, body[..end].trim()));
    }

    let open = raw.find('{')?;
    let close = raw.rfind('}')?;
    if close < open {
        return None;
    }
    Some((ExtractionStrategy::BraceSpan, &raw[open..=close]))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{extract_object, ExtractionStrategy};
    use crate::errors::ExtractionFailure;

    #[test]
    fn tagged_fence_wins_over_surrounding_prose() {
        let raw = "prefix ```json {\"scope\":[\"a\"],\"pricing\":{\"subtotal\":600000}} ``` suffix";
        let extracted = extract_object(raw).unwrap();
        assert_eq!(extracted.strategy, ExtractionStrategy::TaggedFence);
        assert_eq!(
            extracted.object,
            json!({"scope": ["a"], "pricing": {"subtotal": 600000}})
        );
    }

    #[test]
    fn untagged_fence_is_second_choice() {
        let raw = "here you go:\n```\n{\"delivery_days\": 21}\n```\nthanks";
        let extracted = extract_object(raw).unwrap();
        assert_eq!(extracted.strategy, ExtractionStrategy::AnyFence);
        assert_eq!(extracted.object, json!({"delivery_days": 21}));
    }

    #[test]
    fn brace_span_is_last_resort() {
        let raw = "The final quote is {\"project_summary\": \"dashboard build\"} as requested.";
        let extracted = extract_object(raw).unwrap();
        assert_eq!(extracted.strategy, ExtractionStrategy::BraceSpan);
        assert_eq!(extracted.object["project_summary"], "dashboard build");
    }

    #[test]
    fn text_without_braces_reports_no_payload() {
        assert_eq!(
            extract_object("I could not produce a quote this time."),
            Err(ExtractionFailure::NoPayload)
        );
    }

    #[test]
    fn unparseable_fence_content_fails_without_falling_through() {
        // The brace span after the fence would parse, but the fence matched first.
        let raw = "```json not-json``` trailing {\"ok\": true}";
        assert!(matches!(
            extract_object(raw),
            Err(ExtractionFailure::Parse(_))
        ));
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert_eq!(
            extract_object("```json [1, 2, 3] ```"),
            Err(ExtractionFailure::NotAnObject)
        );
    }

    #[test]
    fn unterminated_fence_consumes_the_rest_of_the_text() {
        let raw = "```json {\"scope\": []}";
        let extracted = extract_object(raw).unwrap();
        assert_eq!(extracted.strategy, ExtractionStrategy::TaggedFence);
        assert_eq!(extracted.object, json!({"scope": []}));
    }

    #[test]
    fn reparsing_extracted_output_yields_identical_object() {
        let raw = "```json {\"scope\":[\"a\",\"b\"],\"delivery_days\":14} ```";
        let first = extract_object(raw).unwrap();
        let serialized = serde_json::to_string(&first.object).unwrap();
        let second = extract_object(&serialized).unwrap();
        assert_eq!(first.object, second.object);
    }
}
