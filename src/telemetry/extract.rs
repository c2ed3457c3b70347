//! Field extraction from request/response bodies
//!
//! Each field is resolved by an ordered list of rules: the first rule whose
//! key is present in the top-level JSON object wins. Anything unparseable
//! falls back to the field default.

use serde_json::Value;

/// Key name plus the transform applied to its value
pub struct ExtractorRule<T> {
    pub key: &'static str,
    pub transform: fn(&Value) -> T,
}

/// Response keys for `predicted_tip`, highest priority first
pub const PREDICTION_RULES: [ExtractorRule<String>; 4] = [
    ExtractorRule { key: "predicted_tip", transform: value_text },
    ExtractorRule { key: "tip", transform: value_text },
    ExtractorRule { key: "prediction", transform: value_text },
    ExtractorRule { key: "result", transform: value_text },
];

/// Request keys for `words_count`, highest priority first
pub const WORDS_RULES: [ExtractorRule<i32>; 4] = [
    ExtractorRule { key: "text", transform: word_count },
    ExtractorRule { key: "message", transform: word_count },
    ExtractorRule { key: "input", transform: word_count },
    ExtractorRule { key: "prompt", transform: word_count },
];

/// Strings verbatim, everything else as JSON text
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn word_count(value: &Value) -> i32 {
    let count = value_text(value).split_whitespace().count();
    i32::try_from(count).unwrap_or(i32::MAX)
}

/// Apply `rules` to `body`, or return `None` when the body is not a JSON
/// object or no rule key is present.
pub fn apply_rules<T>(body: &[u8], rules: &[ExtractorRule<T>]) -> Option<T> {
    let parsed: Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "Body is not valid JSON, using default");
            return None;
        }
    };

    let Some(object) = parsed.as_object() else {
        tracing::warn!("Body is not a JSON object, using default");
        return None;
    };

    rules
        .iter()
        .find_map(|rule| object.get(rule.key).map(rule.transform))
}

pub fn extract_predicted_tip(response_body: &[u8]) -> String {
    apply_rules(response_body, &PREDICTION_RULES).unwrap_or_else(|| {
        tracing::debug!("No prediction field in response");
        String::new()
    })
}

pub fn extract_words_count(request_body: &[u8]) -> i32 {
    apply_rules(request_body, &WORDS_RULES).unwrap_or_else(|| {
        tracing::debug!("No text field in request");
        0
    })
}

/// `(predicted_tip, words_count)` for one request/response pair
pub fn extract_fields(request_body: &[u8], response_body: &[u8]) -> (String, i32) {
    (
        extract_predicted_tip(response_body),
        extract_words_count(request_body),
    )
}
