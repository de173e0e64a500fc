//! Annotation record types
//!
//! Three kinds of user annotation, all anchored to an opaque range token
//! supplied by the render surface:
//!
//! - Highlights: colored fills, one per range
//! - Notes: user-authored text attached to a range, one per range
//! - Discussions: prompt/response threads, any number per range

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque token identifying a contiguous span of document content.
///
/// Two keys are equal iff byte-equal; the engine never parses the token.
/// `Ord` is plain lexicographic comparison of the raw string, which the list
/// display uses as an approximation of document order. It is not guaranteed
/// monotonic for arbitrary token formats; hosts needing true document order
/// should supply order-comparable tokens.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RangeKey(String);

impl RangeKey {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RangeKey {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl From<String> for RangeKey {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl std::fmt::Display for RangeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Available highlight colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightColor {
    Yellow,
    Green,
    Blue,
    Pink,
    Purple,
}

impl Default for HighlightColor {
    fn default() -> Self {
        HighlightColor::Yellow
    }
}

impl HighlightColor {
    /// CSS color value used for the fill decoration
    pub fn css(&self) -> &'static str {
        match self {
            HighlightColor::Yellow => "#ffeb3b",
            HighlightColor::Green => "#a5d6a7",
            HighlightColor::Blue => "#90caf9",
            HighlightColor::Pink => "#f48fb1",
            HighlightColor::Purple => "#ce93d8",
        }
    }
}

/// A colored text highlight. At most one per range; re-creating on an
/// occupied range revises the existing record in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Highlight {
    pub id: String,
    #[serde(rename = "documentId")]
    pub document_id: String,
    pub range: RangeKey,
    pub color: HighlightColor,
    /// The text that was selected when the highlight was created
    #[serde(rename = "sourceText")]
    pub source_text: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Highlight {
    pub fn new(
        document_id: &str,
        range: RangeKey,
        color: HighlightColor,
        source_text: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            document_id: document_id.to_string(),
            range,
            color,
            source_text: source_text.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Revise color and selection text, keeping id and creation time.
    pub fn revise(&mut self, color: HighlightColor, source_text: &str) {
        self.color = color;
        self.source_text = source_text.to_string();
        self.updated_at = Utc::now();
    }
}

/// A user note attached to a range. Same per-range uniqueness rule as
/// [`Highlight`], independent of whether a highlight also occupies the range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    #[serde(rename = "documentId")]
    pub document_id: String,
    pub range: RangeKey,
    #[serde(rename = "sourceText")]
    pub source_text: String,
    /// The note text the user wrote
    pub body: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn new(document_id: &str, range: RangeKey, source_text: &str, body: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            document_id: document_id.to_string(),
            range,
            source_text: source_text.to_string(),
            body: body.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn revise(&mut self, source_text: &str, body: &str) {
        self.source_text = source_text.to_string();
        self.body = body.to_string();
        self.updated_at = Utc::now();
    }
}

/// One discussion thread about a text selection: the user's prompt and an
/// optional response filled in later. A range may host any number of these,
/// kept in creation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discussion {
    pub id: String,
    #[serde(rename = "documentId")]
    pub document_id: String,
    pub range: RangeKey,
    #[serde(rename = "sourceText")]
    pub source_text: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Discussion {
    pub fn new(
        document_id: &str,
        range: RangeKey,
        source_text: &str,
        prompt: &str,
        response: Option<&str>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            document_id: document_id.to_string(),
            range,
            source_text: source_text.to_string(),
            prompt: prompt.to_string(),
            response: response.map(|r| r.to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    /// Fill in (or replace) the response to this thread.
    pub fn answer(&mut self, response: &str) {
        self.response = Some(response.to_string());
        self.updated_at = Utc::now();
    }
}

/// Everything anchored at one range: the read-only snapshot handed to UI
/// collaborators for building a context menu.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RangeAnnotations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Highlight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<Note>,
    pub discussions: Vec<Discussion>,
}

impl RangeAnnotations {
    pub fn is_empty(&self) -> bool {
        self.highlight.is_none() && self.note.is_none() && self.discussions.is_empty()
    }
}
