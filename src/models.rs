// Core data structures for book cover retrieval

use serde::de::{self, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::utils::error::FetchError;

/// Identifier of a book, owned by the external book store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(Uuid);

impl BookId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BookId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Token naming one candidate cover resource on the cover service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoverId(String);

impl CoverId {
    /// Suffix prepended to the 1-based slot number
    pub const SLOT_SUFFIX: &'static str = "dummycover";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier of cover slot `slot` (1-based) for `book_id`
    ///
    /// The result is `{book_id}-dummycover{slot}`.
    pub fn for_slot(book_id: &BookId, slot: usize) -> Self {
        Self(format!("{book_id}-{}{slot}", Self::SLOT_SUFFIX))
    }

    /// All cover identifiers of a book, in slot order `1..=slots`
    pub fn for_book(book_id: &BookId, slots: usize) -> Vec<Self> {
        (1..=slots).map(|slot| Self::for_slot(book_id, slot)).collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CoverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cover document returned by the cover service
///
/// Deserialization matches field names case-insensitively; see
/// [`CoverRecord::from_json_case_insensitive`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverRecord {
    pub id: String,

    /// Image payload as sent by the service (base64 text)
    pub content: Option<String>,
}

impl CoverRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: None,
        }
    }

    /// Decode a cover document, matching field names case-insensitively
    ///
    /// `{"Id": "x"}`, `{"ID": "x"}` and `{"id": "x"}` all decode to the same
    /// record. Unknown fields are ignored; `id` is required. When a field is
    /// spelled more than once, the last occurrence in the document wins.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Decode` if the body is not a JSON object or the
    /// object lacks a string `id`
    pub fn from_json_case_insensitive(body: &[u8]) -> Result<Self, FetchError> {
        serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

impl<'de> Deserialize<'de> for CoverRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(CoverRecordVisitor)
    }
}

/// Walks a cover document in document order; a later spelling of a field
/// overwrites an earlier one
struct CoverRecordVisitor;

impl<'de> Visitor<'de> for CoverRecordVisitor {
    type Value = CoverRecord;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a cover document object")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut id = None;
        let mut content = None;

        while let Some(key) = map.next_key::<String>()? {
            if key.eq_ignore_ascii_case("id") {
                id = Some(map.next_value::<String>()?);
            } else if key.eq_ignore_ascii_case("content") {
                content = map.next_value::<Option<String>>()?;
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }

        let id = id.ok_or_else(|| <A::Error as de::Error>::missing_field("id"))?;
        Ok(CoverRecord { id, content })
    }
}

/// Terminal state of one cover fetch
#[derive(Debug)]
pub enum FetchOutcome {
    /// The cover was fetched and decoded
    Success(CoverRecord),

    /// The service answered with a non-success status, an unparsable body,
    /// or the transport failed before cancellation was requested
    RemoteFailure(FetchError),

    /// The fetch observed the shared cancellation signal
    Cancelled,
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_remote_failure(&self) -> bool {
        matches!(self, Self::RemoteFailure(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn into_record(self) -> Option<CoverRecord> {
        match self {
            Self::Success(record) => Some(record),
            _ => None,
        }
    }

    /// Short label used in structured logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::RemoteFailure(_) => "remote_failure",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Book record as provided by the book store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub description: Option<String>,
    /// Display name of the author ("First Last")
    pub author: String,
}

impl Book {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: BookId::new(),
            title: title.into(),
            description: None,
            author: author.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A book together with its retrieved covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookWithCovers {
    #[serde(flatten)]
    pub book: Book,
    pub covers: Vec<CoverRecord>,
}
