//! Verification thresholds.

use serde::{Deserialize, Serialize};

use crate::error::RulesError;

/// Default proximity tolerance in meters.
///
/// Consumer GPS is typically off by 5-15 m. Much larger radii let someone pass
/// verification from the general area; much smaller ones reject honest visits.
pub const DEFAULT_TOLERANCE_M: f64 = 20.0;

/// Inspection checkpoints placed per generated route.
pub const DEFAULT_CHECKPOINT_COUNT: usize = 4;

/// Configuration for checkpoint placement and proximity checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRules {
    /// Maximum distance between a live fix and a checkpoint for a match
    pub tolerance_m: f64,
    /// Number of checkpoints generated per route path
    pub checkpoint_count: usize,
}

impl Default for VerificationRules {
    fn default() -> Self {
        Self {
            tolerance_m: DEFAULT_TOLERANCE_M,
            checkpoint_count: DEFAULT_CHECKPOINT_COUNT,
        }
    }
}

impl VerificationRules {
    pub fn with_tolerance(tolerance_m: f64) -> Self {
        Self {
            tolerance_m,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), RulesError> {
        if !self.tolerance_m.is_finite() || self.tolerance_m <= 0.0 {
            return Err(RulesError::InvalidTolerance(self.tolerance_m));
        }
        if self.checkpoint_count == 0 {
            return Err(RulesError::NoCheckpoints);
        }
        Ok(())
    }
}
