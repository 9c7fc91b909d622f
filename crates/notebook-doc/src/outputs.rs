//! Output payloads and the rendering selector.
//!
//! `select_rendering` is pure: given a cell's outputs it picks one rendering
//! by fixed precedence and never mutates or performs I/O. The caller (a UI
//! layer outside this crate) decides how to display the result.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A single execution output as stored in the notebook document.
///
/// Stream outputs carry `text`; display/execute-result outputs carry a
/// `data` mime bundle. Anything else is preserved in `additional` for the
/// raw-JSON fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Output {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_type: Option<String>,

    /// Stream text; stored documents may write it as a line array.
    #[serde(default, deserialize_with = "opt_string_or_lines", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Mime bundle keyed by media type (`text/plain`, `image/png`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Map<String, Value>>,

    #[serde(flatten)]
    pub additional: serde_json::Map<String, Value>,
}

/// One chosen rendering for a cell's output.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendering {
    /// Plain stream text.
    PlainText(String),
    /// Binary-encoded image payload (base64 as stored).
    Image { mime: String, data: String },
    /// Combined textual and rich-markup representation.
    RichText {
        plain: Option<String>,
        html: Option<String>,
    },
    /// Raw JSON fallback for unrecognized output shapes.
    Json(Value),
}

/// Select one rendering for the first output, by precedence:
/// stream text, then `image/png`, then `text/plain` + `text/html`,
/// then the raw output JSON. No outputs means no rendering.
pub fn select_rendering(outputs: &[Output]) -> Option<Rendering> {
    let first = outputs.first()?;

    if let Some(text) = &first.text {
        return Some(Rendering::PlainText(text.clone()));
    }

    if let Some(data) = &first.data {
        if let Some(png) = data.get("image/png").and_then(media_text) {
            return Some(Rendering::Image {
                mime: "image/png".to_string(),
                data: png,
            });
        }
        let plain = data.get("text/plain").and_then(media_text);
        let html = data.get("text/html").and_then(media_text);
        if plain.is_some() || html.is_some() {
            return Some(Rendering::RichText { plain, html });
        }
    }

    serde_json::to_value(first).ok().map(Rendering::Json)
}

/// Mime bundle values are either a string or a list of lines.
fn media_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(lines) => Some(
            lines
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .concat(),
        ),
        _ => None,
    }
}

fn opt_string_or_lines<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        One(String),
        Lines(Vec<String>),
    }
    Ok(Option::<Repr>::deserialize(deserializer)?.map(|repr| match repr {
        Repr::One(s) => s,
        Repr::Lines(lines) => lines.concat(),
    }))
}
