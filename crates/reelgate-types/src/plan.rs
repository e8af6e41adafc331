//! Subscription plan types
//!
//! Quality tiers and content access levels are small closed enums with a
//! total order. Entitlement checks compare ranks, so a higher tier always
//! implies every capability of a lower one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique plan identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(pub Uuid);

impl PlanId {
    /// Create a new random plan ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a plan ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for PlanId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for PlanId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Streaming quality tier, ordered SD < HD < 4K
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Quality {
    /// Standard definition
    #[serde(rename = "SD")]
    Sd,
    /// High definition
    #[serde(rename = "HD")]
    Hd,
    /// Ultra high definition
    #[serde(rename = "4K")]
    Uhd,
}

impl Quality {
    /// Ordinal rank used for entitlement comparison (SD=0, HD=1, 4K=2)
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Sd => 0,
            Self::Hd => 1,
            Self::Uhd => 2,
        }
    }

    /// Canonical wire representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sd => "SD",
            Self::Hd => "HD",
            Self::Uhd => "4K",
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Quality {
    type Err = QualityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SD" => Ok(Self::Sd),
            "HD" => Ok(Self::Hd),
            "4K" | "UHD" => Ok(Self::Uhd),
            _ => Err(QualityParseError(s.to_string())),
        }
    }
}

/// Error parsing a quality string
#[derive(Debug, Clone)]
pub struct QualityParseError(pub String);

impl std::fmt::Display for QualityParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid quality: {}", self.0)
    }
}

impl std::error::Error for QualityParseError {}

/// Content access level, ordered Free < Basic < Premium < Ultimate
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Free-to-watch content
    Free,
    /// Entry paid tier
    Basic,
    /// Premium catalog
    Premium,
    /// Full catalog including early releases
    Ultimate,
}

impl AccessLevel {
    /// Ordinal rank used for entitlement comparison
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Free => 0,
            Self::Basic => 1,
            Self::Premium => 2,
            Self::Ultimate => 3,
        }
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Basic => write!(f, "basic"),
            Self::Premium => write!(f, "premium"),
            Self::Ultimate => write!(f, "ultimate"),
        }
    }
}

impl std::str::FromStr for AccessLevel {
    type Err = AccessLevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "basic" => Ok(Self::Basic),
            "premium" => Ok(Self::Premium),
            "ultimate" => Ok(Self::Ultimate),
            _ => Err(AccessLevelParseError(s.to_string())),
        }
    }
}

/// Error parsing an access level string
#[derive(Debug, Clone)]
pub struct AccessLevelParseError(pub String);

impl std::fmt::Display for AccessLevelParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid access level: {}", self.0)
    }
}

impl std::error::Error for AccessLevelParseError {}

/// Subscription plan definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Plan ID
    pub id: PlanId,
    /// Display name
    pub name: String,
    /// Marketing description
    pub description: String,
    /// Price in cents
    pub price_cents: i64,
    /// ISO currency code
    pub currency: String,
    /// Subscription duration in days
    pub duration_days: i32,
    /// Maximum streaming quality
    pub quality: Quality,
    /// Maximum content access level
    pub access_level: AccessLevel,
    /// Maximum registered devices
    pub max_devices: i32,
    /// Maximum concurrent streams
    pub max_concurrent_streams: i32,
    /// Free trial length in days (0 = no trial)
    pub trial_days: i32,
    /// Whether the plan can be subscribed to
    pub active: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}
