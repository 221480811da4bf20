//! Performance tier listings and lookup.

use crate::models::{in_region, PerformanceTier, TierKind};
use crate::Hypercloud;
use hypercloud_core::{Result, Value};
use tracing::debug;

impl Hypercloud {
    /// List instance performance tiers.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn performance_tier_list_instances(&self) -> Result<Value> {
        self.get(TierKind::Instance.path()).await
    }

    /// List disk performance tiers.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn performance_tier_list_disks(&self) -> Result<Value> {
        self.get(TierKind::Disk.path()).await
    }

    /// Find the tier called `name` in `region_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the list call fails or the listing is not an
    /// array of tiers.
    pub async fn find_performance_tier(
        &self,
        kind: TierKind,
        region_id: &str,
        name: &str,
    ) -> Result<Option<PerformanceTier>> {
        let tiers: Vec<PerformanceTier> = serde_json::from_value(self.get(kind.path()).await?)?;
        let found = tiers.into_iter().find(|tier| {
            tier.name.as_deref() == Some(name) && in_region(tier.region.as_ref(), region_id)
        });

        debug!(?kind, region_id, tier = name, found = found.is_some(), "Performance tier lookup");
        Ok(found)
    }
}
