//! Typed views of the resources the lookup helpers need.
//!
//! Only the fields used for lookups are modelled; everything else the API
//! returns is kept in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reference to a region embedded in other resources.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegionRef {
    /// Region identifier.
    pub id: String,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A region (data centre).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Region {
    /// Region identifier.
    pub id: String,
    /// Short code such as `SY3`.
    #[serde(default)]
    pub code: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Performance tier for instances or disks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceTier {
    /// Tier identifier.
    pub id: String,
    /// Tier name such as `Standard`.
    #[serde(default)]
    pub name: Option<String>,
    /// Region the tier belongs to.
    #[serde(default)]
    pub region: Option<RegionRef>,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Disk template (OS image).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Template {
    /// Template identifier.
    pub id: String,
    /// Template name such as `Ubuntu 16.10`.
    #[serde(default)]
    pub name: Option<String>,
    /// Region the template is available in.
    #[serde(default)]
    pub region: Option<RegionRef>,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Which list of performance tiers to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierKind {
    /// `/performance_tiers/instances`
    Instance,
    /// `/performance_tiers/disks`
    Disk,
}

impl TierKind {
    /// Path of the tier listing.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Instance => "/performance_tiers/instances",
            Self::Disk => "/performance_tiers/disks",
        }
    }
}

pub(crate) fn in_region(region: Option<&RegionRef>, region_id: &str) -> bool {
    region.is_some_and(|region| region.id == region_id)
}
