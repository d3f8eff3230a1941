mod config;
mod rules;
mod scoring;

pub use config::ScoringConfig;
pub use scoring::CategoryScores;

#[cfg(test)]
pub(crate) use rules::REGISTRY;
#[cfg(test)]
pub(crate) use scoring::{category_scores, composite, recommendations, tier};

use serde::{Deserialize, Serialize};

use super::domain::{Anomaly, CaseDossier, RiskTier};
use super::validate::InputError;

/// Stateless evaluator turning a case dossier into a risk assessment.
///
/// The computation is pure and deterministic: identical dossiers always
/// produce identical results, and nothing is read from the environment.
pub struct RiskEngine {
    config: ScoringConfig,
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

impl RiskEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Validate the dossier, run the rule battery, and reduce the findings
    /// to scores, a tier, and recommendations.
    pub fn assess(&self, dossier: &CaseDossier) -> Result<ScoreResult, InputError> {
        dossier.validate()?;

        let anomalies = rules::evaluate(dossier);
        let scores = scoring::category_scores(&anomalies);
        let score_global = scoring::composite(scores, &anomalies, &self.config);
        let risk_tier = scoring::tier(score_global, &self.config);
        let recommendations = scoring::recommendations(&anomalies);

        Ok(ScoreResult {
            score_global,
            score_ce: scores.ce,
            score_customs: scores.customs,
            score_coherence: scores.coherence,
            risk_tier,
            anomalies,
            recommendations,
        })
    }
}

/// Assessment output. The serialized field shape is a stable contract
/// consumed by the persistence and rendering collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score_global: u8,
    pub score_ce: u8,
    pub score_customs: u8,
    pub score_coherence: u8,
    pub risk_tier: RiskTier,
    pub anomalies: Vec<Anomaly>,
    pub recommendations: Vec<String>,
}
