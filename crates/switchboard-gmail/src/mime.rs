use base64::alphabet;
use base64::engine::{DecodePaddingMode, Engine, GeneralPurpose, GeneralPurposeConfig};
use serde::{Deserialize, Serialize};

/// Gmail emits URL-safe base64 with inconsistent padding; accept both.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// One node of a message's MIME part tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    /// MIME type of this part.
    pub mime_type: Option<String>,
    /// Body of this part, if it is a leaf.
    pub body: Option<PartBody>,
    /// Child parts for multipart containers.
    #[serde(default)]
    pub parts: Vec<MessagePart>,
    /// Headers attached to this part.
    #[serde(default)]
    pub headers: Vec<Header>,
}

/// Encoded body data of a leaf part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartBody {
    /// URL-safe base64 content.
    pub data: Option<String>,
}

/// A single message header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    /// Header name.
    pub name: String,
    /// Header value.
    pub value: String,
}

/// Which body type wins when a message carries both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyPreference {
    /// Prefer `text/plain` leaves.
    Plain,
    /// Prefer `text/html` leaves.
    Html,
}

impl BodyPreference {
    /// `"html"` selects HTML; anything else selects plain text.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("html") {
            Self::Html
        } else {
            Self::Plain
        }
    }
}

/// Case-insensitive header lookup.
pub fn header_value<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// Extracts a single textual body from a part tree.
///
/// Depth-first over the preferred MIME type; falls back to the other
/// textual type when no preferred leaf decodes. Malformed content never
/// errors, it just keeps the search going.
pub fn extract_text(part: &MessagePart, prefer: BodyPreference) -> Option<String> {
    let (first, second) = match prefer {
        BodyPreference::Plain => ("text/plain", "text/html"),
        BodyPreference::Html => ("text/html", "text/plain"),
    };
    find_text(part, first).or_else(|| find_text(part, second))
}

/// First leaf of the given MIME type whose data decodes.
fn find_text(part: &MessagePart, mime: &str) -> Option<String> {
    if part.mime_type.as_deref() == Some(mime) {
        if let Some(data) = part.body.as_ref().and_then(|b| b.data.as_deref()) {
            if let Some(text) = decode_body(data) {
                return Some(text);
            }
        }
    }
    part.parts.iter().find_map(|child| find_text(child, mime))
}

/// Best-effort body decoding; `None` on malformed base64.
fn decode_body(data: &str) -> Option<String> {
    let raw = URL_SAFE_LENIENT.decode(data).ok()?;
    Some(String::from_utf8_lossy(&raw).into_owned())
}
