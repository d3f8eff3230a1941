//! Reduction of the anomaly list to sub-scores, a capped composite, and a
//! deduplicated recommendation list. Categories are independent: a penalty
//! in one category never touches another category's sub-score.

use serde::{Deserialize, Serialize};

use super::super::domain::{Anomaly, RiskCategory, RiskTier, Severity};
use super::config::ScoringConfig;

/// Per-category completeness scores, each clamped to 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub ce: u8,
    pub customs: u8,
    pub coherence: u8,
}

fn sub_score(anomalies: &[Anomaly], category: RiskCategory) -> u8 {
    let penalty: u32 = anomalies
        .iter()
        .filter(|anomaly| anomaly.category == category)
        .map(|anomaly| u32::from(anomaly.penalty))
        .sum();
    100u32.saturating_sub(penalty) as u8
}

pub(crate) fn category_scores(anomalies: &[Anomaly]) -> CategoryScores {
    CategoryScores {
        ce: sub_score(anomalies, RiskCategory::Ce),
        customs: sub_score(anomalies, RiskCategory::Customs),
        coherence: sub_score(anomalies, RiskCategory::Coherence),
    }
}

/// Ceiling implied by the number of critical anomalies. A single severe
/// gap must not be diluted by unrelated good sub-scores.
fn critical_cap(anomalies: &[Anomaly], config: &ScoringConfig) -> u8 {
    let criticals = anomalies
        .iter()
        .filter(|anomaly| anomaly.severity == Severity::Critical)
        .count();
    match criticals {
        0 => 100,
        1 => config.single_critical_cap,
        _ => config.multi_critical_cap,
    }
}

pub(crate) fn composite(
    scores: CategoryScores,
    anomalies: &[Anomaly],
    config: &ScoringConfig,
) -> u8 {
    let weighted = f64::from(scores.ce) * config.ce_weight
        + f64::from(scores.customs) * config.customs_weight
        + f64::from(scores.coherence) * config.coherence_weight;
    let capped = weighted.min(f64::from(critical_cap(anomalies, config)));
    capped.round().clamp(0.0, 100.0) as u8
}

pub(crate) fn tier(score: u8, config: &ScoringConfig) -> RiskTier {
    if score >= config.low_floor {
        RiskTier::Low
    } else if score >= config.medium_floor {
        RiskTier::Medium
    } else if score >= config.high_floor {
        RiskTier::High
    } else {
        RiskTier::Critical
    }
}

/// Collect recommendations in anomaly order, dropping duplicates.
pub(crate) fn recommendations(anomalies: &[Anomaly]) -> Vec<String> {
    let mut seen = Vec::new();
    for anomaly in anomalies {
        if !seen.contains(&anomaly.recommendation) {
            seen.push(anomaly.recommendation.clone());
        }
    }
    seen
}
