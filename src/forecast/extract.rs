use super::ForecastError;

/// Slices the JSON object out of a free-text model reply.
///
/// Takes everything from the first `{` to the last `}` inclusive. Leading
/// prose and markdown fences are dropped. A reply without both delimiters (or
/// with the last `}` before the first `{`) is rejected outright.
pub fn extract_json_payload(text: &str) -> Result<&str, ForecastError> {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&text[start..=end]),
        _ => Err(ForecastError::Unavailable("non-JSON response".to_string())),
    }
}
