//! Resource wrappers for the Hypercloud REST API.
//!
//! Each operation on [`Hypercloud`] is a single authenticated call through
//! [`hypercloud_core::HypercloudClient::request`]. Responses come back as raw
//! JSON; the `find_*` helpers decode the few fields needed for lookups into
//! the types in [`models`].

#![deny(missing_docs)]

pub mod client;
mod disks;
mod instances;
pub mod models;
mod networks;
mod performance_tiers;
mod regions;
mod templates;

#[cfg(test)]
mod test_support;

pub use client::Hypercloud;
pub use hypercloud_core::{Error, HypercloudConfig, Result};
pub use models::{PerformanceTier, Region, RegionRef, Template, TierKind};
