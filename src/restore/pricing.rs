// glacier-restore/src/restore/pricing.rs
use serde::Deserialize;

use crate::storage::Tier;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
const DAYS_PER_MONTH: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TierPrice {
    pub per_gb: f64,
    pub per_thousand_requests: f64,
}

/// Retrieval and storage prices in USD. Any field missing from a pricing file keeps
/// its default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Pricing {
    pub expedited: TierPrice,
    pub standard: TierPrice,
    pub bulk: TierPrice,
    pub storage_gb_month: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            expedited: TierPrice { per_gb: 0.03, per_thousand_requests: 10.0 },
            standard: TierPrice { per_gb: 0.01, per_thousand_requests: 0.05 },
            bulk: TierPrice { per_gb: 0.0025, per_thousand_requests: 0.025 },
            storage_gb_month: 0.023,
        }
    }
}

impl Pricing {
    pub fn tier(&self, tier: Tier) -> &TierPrice {
        match tier {
            Tier::Expedited => &self.expedited,
            Tier::Standard => &self.standard,
            Tier::Bulk => &self.bulk,
        }
    }

    /// Size-proportional plus per-request cost of restoring `objects` objects totalling `bytes`.
    pub fn retrieval_cost(&self, tier: Tier, bytes: u64, objects: usize) -> f64 {
        let price = self.tier(tier);
        bytes as f64 / BYTES_PER_GB * price.per_gb
            + objects as f64 / 1000.0 * price.per_thousand_requests
    }

    /// Cost of keeping `bytes` of restored copies for one day.
    pub fn daily_storage_cost(&self, bytes: u64) -> f64 {
        bytes as f64 / BYTES_PER_GB * self.storage_gb_month / DAYS_PER_MONTH
    }
}
