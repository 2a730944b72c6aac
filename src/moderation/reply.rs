//! Normalization of the classification endpoint's reply.
//!
//! The upstream capability is genuinely shape-variable: depending on
//! deployment it answers with a bare string, `{"response": ...}`, a
//! `{"result": {"response": ...}}` envelope, or a batch array. The checks
//! below run in that order; an unrecognized shape degrades to a fixed
//! literal reply rather than a fault.

use serde_json::Value;

/// Reply recorded when no shape check matches. A valid, degraded verdict —
/// it is still appended to the transcript and returned to the caller.
pub const UNEXPECTED_SHAPE_REPLY: &str = "Error: Unexpected AI response format";

pub fn normalize_verdict(raw: &Value) -> String {
    if let Some(text) = raw.as_str() {
        return text.trim().to_owned();
    }
    if let Some(text) = raw.get("response").and_then(Value::as_str) {
        return text.trim().to_owned();
    }
    if let Some(text) = raw.pointer("/result/response").and_then(Value::as_str) {
        return text.trim().to_owned();
    }
    if let Some(first) = raw.as_array().and_then(|batch| batch.first()) {
        let text = first
            .get("response")
            .and_then(Value::as_str)
            .or_else(|| first.get("content").and_then(Value::as_str));
        return match text {
            Some(text) => text.trim().to_owned(),
            None => first.to_string(),
        };
    }

    tracing::warn!("unexpected moderation response shape: {raw}");
    UNEXPECTED_SHAPE_REPLY.to_owned()
}
