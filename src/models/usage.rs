//! Per-user daily regexp usage tracking.
//!
//! Regexp calculations are rate limited per user per calendar day. The snapshot
//! type is what [`crate::services::ExpressionService::regexp_usage_for_today`]
//! returns to handlers deciding whether another calculation is allowed.

use serde::{Deserialize, Serialize};

/// Usage counters for one user on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegexpUsageSnapshot {
    pub used: u32,
    pub remaining: u32,
}

impl RegexpUsageSnapshot {
    pub fn new(used: u32, limit: u32) -> Self {
        Self {
            used,
            remaining: limit.saturating_sub(used),
        }
    }

    pub fn exhausted(&self) -> bool {
        self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_saturates_at_zero() {
        let snapshot = RegexpUsageSnapshot::new(7, 5);
        assert_eq!(snapshot.remaining, 0);
        assert!(snapshot.exhausted());
    }

    #[test]
    fn fresh_user_has_full_allowance() {
        let snapshot = RegexpUsageSnapshot::new(0, 5);
        assert_eq!(snapshot.remaining, 5);
        assert!(!snapshot.exhausted());
    }
}
