use serde::{Deserialize, Serialize};

/// Scoring dials: category weights, severity caps, and tier thresholds.
///
/// The weighted three-category formula is the canonical one; earlier
/// two-category variants of the computation are intentionally not kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub ce_weight: f64,
    pub customs_weight: f64,
    pub coherence_weight: f64,
    /// Ceiling applied when exactly one critical anomaly is present.
    pub single_critical_cap: u8,
    /// Ceiling applied when two or more critical anomalies are present.
    pub multi_critical_cap: u8,
    /// Composite scores at or above this are tier `low`.
    pub low_floor: u8,
    /// Composite scores at or above this are tier `medium`.
    pub medium_floor: u8,
    /// Composite scores at or above this are tier `high`; below is `critical`.
    pub high_floor: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            ce_weight: 0.50,
            customs_weight: 0.35,
            coherence_weight: 0.15,
            single_critical_cap: 65,
            multi_critical_cap: 45,
            low_floor: 80,
            medium_floor: 60,
            high_floor: 40,
        }
    }
}
