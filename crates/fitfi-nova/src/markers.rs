//! The Nova data-line micro-protocol.
//!
//! The backend streams newline-delimited text where data lines carry a
//! `data: ` prefix. A data line is either plain incremental text or an
//! embedded JSON block wrapped between two sentinel tokens on the same
//! logical line. This is a closed protocol between this client and the
//! Nova backend, not a general escaping scheme: marker text occurring
//! inside legitimate content will be misread, and the backend is
//! responsible for never producing it.

use fitfi_schema::Product;

pub const DATA_PREFIX: &str = "data: ";
pub const JSON_START: &str = "<<<FITFI_JSON>>>";
pub const JSON_END: &str = "<<<END_FITFI_JSON>>>";

/// Classification of one complete stream line.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    /// Line without the `data: ` prefix; ignored.
    NotData,
    /// Plain incremental text, verbatim (empty payloads included).
    Content(String),
    /// Well-formed embedded block carrying a `products` array.
    Products(Vec<Product>),
    /// Well-formed embedded block without a `products` array; nothing
    /// to surface.
    Empty,
    /// Start marker present but the block is unusable: end marker
    /// missing, enclosed text not valid JSON, or products not
    /// decodable. Recoverable; the stream continues.
    Malformed,
}

pub fn parse_line(line: &str) -> ParsedLine {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return ParsedLine::NotData;
    };

    let Some(start) = payload.find(JSON_START) else {
        return ParsedLine::Content(payload.to_string());
    };

    let body_start = start + JSON_START.len();
    let Some(body_len) = payload[body_start..].find(JSON_END) else {
        return ParsedLine::Malformed;
    };

    let raw = &payload[body_start..body_start + body_len];
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(%error, "invalid json in embedded block");
            return ParsedLine::Malformed;
        }
    };

    match value.get("products") {
        Some(products) if products.is_array() => {
            match serde_json::from_value::<Vec<Product>>(products.clone()) {
                Ok(products) => ParsedLine::Products(products),
                Err(error) => {
                    tracing::warn!(%error, "undecodable products in embedded block");
                    ParsedLine::Malformed
                }
            }
        }
        _ => ParsedLine::Empty,
    }
}
