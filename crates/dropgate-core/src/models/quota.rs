use serde::{Deserialize, Serialize};
use std::str::FromStr;

const GIB: u64 = 1024 * 1024 * 1024;

/// Subscription plan, determining the storage ceiling for an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Free,
    Basic,
    Premium,
    Enterprise,
}

impl PlanType {
    /// Plan-assigned storage ceiling in bytes.
    pub fn quota_bytes(&self) -> u64 {
        match self {
            PlanType::Free => GIB,
            PlanType::Basic => 5 * GIB,
            PlanType::Premium => 20 * GIB,
            PlanType::Enterprise => 100 * GIB,
        }
    }
}

impl FromStr for PlanType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(PlanType::Free),
            "basic" => Ok(PlanType::Basic),
            "premium" => Ok(PlanType::Premium),
            "enterprise" => Ok(PlanType::Enterprise),
            _ => Err(anyhow::anyhow!("Invalid plan type: {}", s)),
        }
    }
}

/// Quota usage snapshot for one account.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct QuotaUsage {
    pub used_bytes: u64,
    pub total_bytes: u64,
}

impl QuotaUsage {
    pub fn available_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.used_bytes)
    }

    pub fn percentage_used(&self) -> f64 {
        if self.total_bytes > 0 {
            (self.used_bytes as f64 * 100.0) / self.total_bytes as f64
        } else {
            0.0
        }
    }
}
