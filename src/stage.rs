//! Growth stage classification from day counts.
//!
//! Maps any numeric day count onto the lettuce growth curve's three ordered
//! stages via fixed threshold comparison. The same function classifies both
//! the resolved cycle day number and the externally supplied predicted
//! maturity estimate, which need not be an integer.

use serde::{Deserialize, Serialize};

/// Upper day-count bound (inclusive) of the initial stage.
pub const INITIAL_STAGE_MAX_DAYS: f64 = 5.5;

/// Upper day-count bound (inclusive) of the rapid growth stage.
pub const RAPID_GROWTH_MAX_DAYS: f64 = 26.2;

/// Standard growth duration of the hydroponic crop in days.
pub const EXPECTED_CYCLE_DAYS: u32 = 30;

/// Ordered growth stages of a single crop cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GrowthStage {
    /// Germination and early establishment
    Initial,
    /// Vegetative growth, bulk of the cycle
    RapidGrowth,
    /// Maturity reached, harvest-ready signal
    Senescent,
}

impl GrowthStage {
    /// Classify a day count into a growth stage.
    ///
    /// Total over all reals: zero and negative inputs fall into the first
    /// bucket. Fractional inputs are accepted (predicted maturity estimates
    /// are not integers).
    #[must_use]
    pub fn classify(day_count: f64) -> Self {
        if day_count <= INITIAL_STAGE_MAX_DAYS {
            GrowthStage::Initial
        } else if day_count <= RAPID_GROWTH_MAX_DAYS {
            GrowthStage::RapidGrowth
        } else {
            GrowthStage::Senescent
        }
    }

    /// Human-readable stage label as shown to growers.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            GrowthStage::Initial => "Initial Stage",
            GrowthStage::RapidGrowth => "Rapid Growth Stage",
            GrowthStage::Senescent => "Senescent Stage (May Harvest)",
        }
    }

    /// Whether this stage signals the crop may be harvested.
    #[must_use]
    pub fn is_harvest_ready(&self) -> bool {
        matches!(self, GrowthStage::Senescent)
    }

    /// The next stage, if any.
    #[must_use]
    pub fn next(&self) -> Option<GrowthStage> {
        match self {
            GrowthStage::Initial => Some(GrowthStage::RapidGrowth),
            GrowthStage::RapidGrowth => Some(GrowthStage::Senescent),
            GrowthStage::Senescent => None,
        }
    }
}

impl std::fmt::Display for GrowthStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_initial_stage() {
        assert_eq!(GrowthStage::classify(1.0), GrowthStage::Initial);
        assert_eq!(GrowthStage::classify(5.5), GrowthStage::Initial);
    }

    #[test]
    fn test_classify_rapid_growth_boundaries() {
        assert_eq!(GrowthStage::classify(5.50001), GrowthStage::RapidGrowth);
        assert_eq!(GrowthStage::classify(15.0), GrowthStage::RapidGrowth);
        assert_eq!(GrowthStage::classify(26.2), GrowthStage::RapidGrowth);
    }

    #[test]
    fn test_classify_senescent() {
        assert_eq!(GrowthStage::classify(26.20001), GrowthStage::Senescent);
        assert_eq!(GrowthStage::classify(30.0), GrowthStage::Senescent);
        assert!(GrowthStage::classify(45.0).is_harvest_ready());
    }

    #[test]
    fn test_classify_is_total_over_nonpositive_inputs() {
        assert_eq!(GrowthStage::classify(0.0), GrowthStage::Initial);
        assert_eq!(GrowthStage::classify(-3.0), GrowthStage::Initial);
    }

    #[test]
    fn test_stage_ordering() {
        assert!(GrowthStage::Initial < GrowthStage::RapidGrowth);
        assert!(GrowthStage::RapidGrowth < GrowthStage::Senescent);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(format!("{}", GrowthStage::Initial), "Initial Stage");
        assert_eq!(
            format!("{}", GrowthStage::Senescent),
            "Senescent Stage (May Harvest)"
        );
    }
}
