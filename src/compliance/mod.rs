//! Compliance risk & cross-check engine plus the seams that host it.
//!
//! The engine is a pure function over one case dossier: an ordered rule
//! battery produces typed anomalies, and a scoring pass reduces them to
//! per-category sub-scores, a capped composite score, a risk tier, and
//! deduplicated recommendations. Persistence, alerting, and HTTP transport
//! are collaborator concerns behind the repository/alert/router seams.

pub mod domain;
pub mod engine;
pub mod repository;
pub mod router;
pub mod service;
pub mod validate;

#[cfg(test)]
mod tests;

pub use domain::{
    Anomaly, CaseDossier, CaseInfo, CeDocument, CeDocumentKind, ComponentId, ComponentInfo,
    ComponentMatch, CustomsDocument, CustomsDocumentKind, DriveType, ExtractedFields,
    MachineCondition, MachineInfo, RiskCategory, RiskTier, Severity, ValidationStatus,
};
pub use engine::{CategoryScores, RiskEngine, ScoreResult, ScoringConfig};
pub use repository::{
    AlertError, AlertPublisher, AssessmentRecord, AssessmentRepository, AssessmentView, CaseRef,
    DossierStatus, InMemoryAssessmentRepository, RepositoryError, RiskAlert,
    TracingAlertPublisher,
};
pub use router::assessment_router;
pub use service::{AssessmentServiceError, CaseAssessmentService};
pub use validate::InputError;
