use serde::{Deserialize, Serialize};

/// Role of a chat message author.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One turn in a conversation. Immutable once sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// A message with empty or whitespace-only content is invalid to send.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Assistant conversation mode, sent verbatim in the request body.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    #[default]
    Chat,
    Outfits,
}

impl ChatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Outfits => "outfits",
        }
    }
}

/// Catalog product as carried in an embedded stream payload.
///
/// Only the id is identity; everything else is optional and decoded
/// leniently so older backend payloads keep parsing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub retailer: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
}

/// Event emitted while consuming one assistant stream.
///
/// `Done` is the terminal success marker. `Error` is terminal when the
/// stream itself failed (validation, HTTP status, read failure) but
/// non-terminal when a single embedded payload was malformed: in that
/// case the stream keeps going and still ends with exactly one terminal
/// event, which is always last. `Content` and `Products` may interleave
/// arbitrarily before the terminal event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Content { text: String },
    Products { products: Vec<Product> },
    Done,
    Error,
}

impl StreamEvent {
    pub fn content(text: impl Into<String>) -> Self {
        Self::Content { text: text.into() }
    }

    pub fn is_terminal_candidate(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}
