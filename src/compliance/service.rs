use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use super::domain::{CaseDossier, RiskTier};
use super::engine::{RiskEngine, ScoreResult, ScoringConfig};
use super::repository::{
    AlertError, AlertPublisher, AssessmentRecord, AssessmentRepository, CaseRef, DossierStatus,
    RepositoryError, RiskAlert,
};
use super::validate::InputError;

/// Service composing the risk engine, the repository, and the alert hook.
pub struct CaseAssessmentService<R, A> {
    repository: Arc<R>,
    alerts: Arc<A>,
    engine: Arc<RiskEngine>,
}

static CASE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_case_ref() -> CaseRef {
    let id = CASE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    CaseRef(format!("case-{id:06}"))
}

impl<R, A> CaseAssessmentService<R, A>
where
    R: AssessmentRepository + 'static,
    A: AlertPublisher + 'static,
{
    pub fn new(repository: Arc<R>, alerts: Arc<A>, config: ScoringConfig) -> Self {
        Self {
            repository,
            alerts,
            engine: Arc::new(RiskEngine::new(config)),
        }
    }

    /// Register a dossier, rejecting malformed input before it is stored.
    pub fn submit(&self, dossier: CaseDossier) -> Result<AssessmentRecord, AssessmentServiceError> {
        dossier.validate()?;

        let record = AssessmentRecord {
            case_ref: next_case_ref(),
            dossier,
            status: DossierStatus::Received,
            result: None,
            received_at: Utc::now(),
            assessed_at: None,
        };

        let stored = self.repository.insert(record)?;
        Ok(stored)
    }

    /// Run the risk engine over a stored dossier and persist the outcome.
    pub fn assess(&self, case_ref: &CaseRef) -> Result<ScoreResult, AssessmentServiceError> {
        let mut record = self
            .repository
            .fetch(case_ref)?
            .ok_or(RepositoryError::NotFound)?;

        let result = self.engine.assess(&record.dossier)?;

        record.status = DossierStatus::Assessed;
        record.result = Some(result.clone());
        record.assessed_at = Some(Utc::now());
        self.repository.update(record)?;

        tracing::info!(
            case_ref = %case_ref.0,
            score_global = result.score_global,
            risk_tier = result.risk_tier.label(),
            anomalies = result.anomalies.len(),
            "case assessed"
        );

        if result.risk_tier == RiskTier::Critical {
            self.alerts.publish(RiskAlert {
                case_ref: case_ref.clone(),
                risk_tier: result.risk_tier,
                score_global: result.score_global,
                anomaly_count: result.anomalies.len(),
            })?;
        }

        Ok(result)
    }

    /// Fetch a case record and its current assessment state.
    pub fn get(&self, case_ref: &CaseRef) -> Result<AssessmentRecord, AssessmentServiceError> {
        let record = self
            .repository
            .fetch(case_ref)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }
}

/// Error raised by the assessment service.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentServiceError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Alert(#[from] AlertError),
}
