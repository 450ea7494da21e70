use chrono::{DateTime, Utc}; // Creation timestamps
use serde::{Deserialize, Deserializer, Serialize}; // For document and request wire shapes
use std::borrow::Borrow;
use std::fmt;
use uuid::Uuid;

// --- Document ID ---
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Generates a fresh random identifier (UUID v4, hyphenated).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A blank id is the "not yet assigned" sentinel.
    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::new(id.to_string())
    }
}

impl From<DocumentId> for String {
    fn from(doc_id: DocumentId) -> Self {
        doc_id.0
    }
}

// Lets maps keyed by DocumentId be queried with a plain &str.
impl Borrow<str> for DocumentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Author ---

/// Author of a document. Embedded by value, no lifecycle of its own.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Author {
    pub id: String,
    pub name: String,
}

// --- Document ---

/// A stored document. Every field is optional until the repository assigns an id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<Author>,
    /// Supplied by the caller; the repository stores it verbatim.
    pub created: Option<DateTime<Utc>>,
}

impl Document {
    /// Returns the id only when it is set and non-blank.
    pub fn assigned_id(&self) -> Option<&DocumentId> {
        self.id.as_ref().filter(|id| !id.is_blank())
    }
}

// --- Search Request ---

/// Conjunction of independently optional filters. Empty lists and unset
/// bounds disable their clause.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title_prefixes: Vec<String>,
    /// Matched as prefixes of the content, not as substrings.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub contains_contents: Vec<String>,
    /// Matched as prefixes of the document's own id, not `author.id`.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub author_ids: Vec<String>,
    /// Inclusive lower bound on `created`.
    pub created_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created`.
    pub created_to: Option<DateTime<Utc>>,
}

impl SearchRequest {
    /// Evaluates every clause against `document`; all must hold.
    ///
    /// A document without a `created` timestamp is never excluded by the
    /// date bounds.
    pub fn matches(&self, document: &Document) -> bool {
        matches_any_prefix(document.title.as_deref(), &self.title_prefixes)
            && matches_any_prefix(document.content.as_deref(), &self.contains_contents)
            && matches_any_prefix(
                document.assigned_id().map(DocumentId::as_str),
                &self.author_ids,
            )
            && self.within_created_bounds(document.created)
    }

    fn within_created_bounds(&self, created: Option<DateTime<Utc>>) -> bool {
        let Some(created) = created else {
            return true;
        };
        self.created_from.is_none_or(|from| created >= from)
            && self.created_to.is_none_or(|to| created <= to)
    }
}

/// True when no prefixes are requested, otherwise `value` must be present
/// and start with at least one of them.
fn matches_any_prefix(value: Option<&str>, prefixes: &[String]) -> bool {
    if prefixes.is_empty() {
        return true;
    }
    value.is_some_and(|value| prefixes.iter().any(|prefix| value.starts_with(prefix.as_str())))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<String>>::deserialize(deserializer).map(Option::unwrap_or_default)
}
