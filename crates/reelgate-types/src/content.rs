//! Catalog content types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AccessLevel;

/// Unique content identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(pub Uuid);

impl ContentId {
    /// Create a new random content ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a content ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for ContentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ContentId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Catalog item as seen by the streaming path.
///
/// Catalog browsing/CRUD is out of scope here; only the fields the access
/// check and stream admission need are modeled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    /// Content ID
    pub id: ContentId,
    /// Title
    pub title: String,
    /// Minimum access level required to stream
    pub access_level: AccessLevel,
    /// Upstream URL handed to admitted clients
    pub stream_url: String,
    /// Whether the item is streamable
    pub active: bool,
}
