use serde_json::Value;

use crate::errors::ParseError;

const PREVIEW_CHARS: usize = 80;

/// Parse the span between the first `{` and the last `}` of `raw`.
///
/// Generators often wrap the object in prose or code fences; everything
/// outside that span is ignored.
pub fn extract_json_object(raw: &str) -> Result<Value, ParseError> {
    let span = match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => &raw[start..=end],
        _ => {
            return Err(ParseError::NoObject {
                preview: raw.chars().take(PREVIEW_CHARS).collect(),
            });
        }
    };
    Ok(serde_json::from_str(span)?)
}
