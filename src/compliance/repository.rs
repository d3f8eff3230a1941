use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{CaseDossier, RiskTier};
use super::engine::ScoreResult;

/// Identifier assigned to a submitted dossier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaseRef(pub String);

/// Lifecycle of a stored dossier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DossierStatus {
    Received,
    Assessed,
}

impl DossierStatus {
    pub const fn label(self) -> &'static str {
        match self {
            DossierStatus::Received => "received",
            DossierStatus::Assessed => "assessed",
        }
    }
}

/// Repository row: the dossier, its status, and the assessment outcome.
/// Timestamps are collaborator metadata and never leak into `ScoreResult`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub case_ref: CaseRef,
    pub dossier: CaseDossier,
    pub status: DossierStatus,
    pub result: Option<ScoreResult>,
    pub received_at: DateTime<Utc>,
    pub assessed_at: Option<DateTime<Utc>>,
}

impl AssessmentRecord {
    pub fn view(&self) -> AssessmentView {
        AssessmentView {
            case_ref: self.case_ref.clone(),
            status: self.status.label(),
            risk_tier: self.result.as_ref().map(|result| result.risk_tier.label()),
            score_global: self.result.as_ref().map(|result| result.score_global),
            anomaly_count: self.result.as_ref().map(|result| result.anomalies.len()),
        }
    }
}

/// Sanitized representation of a case's exposed assessment state.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentView {
    pub case_ref: CaseRef,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_tier: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_global: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_count: Option<usize>,
}

/// Storage abstraction so the service module can be exercised in isolation.
pub trait AssessmentRepository: Send + Sync {
    fn insert(&self, record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError>;
    fn update(&self, record: AssessmentRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, case_ref: &CaseRef) -> Result<Option<AssessmentRecord>, RepositoryError>;
    fn pending(&self, limit: usize) -> Result<Vec<AssessmentRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Process-local store backing the server binary and demos. Real
/// deployments swap in a database-backed implementation.
#[derive(Default)]
pub struct InMemoryAssessmentRepository {
    records: Mutex<HashMap<CaseRef, AssessmentRecord>>,
}

impl InMemoryAssessmentRepository {
    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<CaseRef, AssessmentRecord>>, RepositoryError>
    {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("assessment store poisoned".to_string()))
    }
}

impl AssessmentRepository for InMemoryAssessmentRepository {
    fn insert(&self, record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError> {
        let mut records = self.lock()?;
        if records.contains_key(&record.case_ref) {
            return Err(RepositoryError::Conflict);
        }
        records.insert(record.case_ref.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: AssessmentRecord) -> Result<(), RepositoryError> {
        let mut records = self.lock()?;
        records.insert(record.case_ref.clone(), record);
        Ok(())
    }

    fn fetch(&self, case_ref: &CaseRef) -> Result<Option<AssessmentRecord>, RepositoryError> {
        let records = self.lock()?;
        Ok(records.get(case_ref).cloned())
    }

    fn pending(&self, limit: usize) -> Result<Vec<AssessmentRecord>, RepositoryError> {
        let records = self.lock()?;
        let mut waiting: Vec<AssessmentRecord> = records
            .values()
            .filter(|record| record.status == DossierStatus::Received)
            .cloned()
            .collect();
        waiting.sort_by(|a, b| a.case_ref.0.cmp(&b.case_ref.0));
        waiting.truncate(limit);
        Ok(waiting)
    }
}

/// Outbound hook notified when an assessment lands in the critical tier.
pub trait AlertPublisher: Send + Sync {
    fn publish(&self, alert: RiskAlert) -> Result<(), AlertError>;
}

/// Alert payload handed to notification adapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAlert {
    pub case_ref: CaseRef,
    pub risk_tier: RiskTier,
    pub score_global: u8,
    pub anomaly_count: usize,
}

/// Alert dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("alert transport unavailable: {0}")]
    Transport(String),
}

/// Default publisher: surfaces critical assessments in the service log.
#[derive(Debug, Default, Clone)]
pub struct TracingAlertPublisher;

impl AlertPublisher for TracingAlertPublisher {
    fn publish(&self, alert: RiskAlert) -> Result<(), AlertError> {
        tracing::warn!(
            case_ref = %alert.case_ref.0,
            risk_tier = alert.risk_tier.label(),
            score_global = alert.score_global,
            anomalies = alert.anomaly_count,
            "critical compliance risk detected"
        );
        Ok(())
    }
}
