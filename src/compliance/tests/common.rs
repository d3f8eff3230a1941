use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::compliance::domain::{
    CaseDossier, CaseInfo, CeDocument, CeDocumentKind, ComponentId, ComponentInfo, ComponentMatch,
    CustomsDocument, CustomsDocumentKind, DriveType, ExtractedFields, MachineCondition,
    MachineInfo, ValidationStatus,
};
use crate::compliance::repository::{
    AlertError, AlertPublisher, AssessmentRecord, AssessmentRepository, CaseRef,
    InMemoryAssessmentRepository, RepositoryError, RiskAlert,
};
use crate::compliance::{
    assessment_router, CaseAssessmentService, RiskEngine, ScoringConfig,
};

pub(super) fn case() -> CaseInfo {
    CaseInfo {
        customs_identifier: Some("FR12345678901234".to_string()),
        trade_terms: Some("FOB".to_string()),
        arrival_port: Some("Le Havre".to_string()),
        supplier_name: Some("Chen Machinery Co.".to_string()),
        tariff_code: Some("8457.10".to_string()),
    }
}

pub(super) fn machine() -> MachineInfo {
    MachineInfo {
        name: "Vertical machining center".to_string(),
        make_model: "VMC-850".to_string(),
        serial_number: "VMC850-2209".to_string(),
        production_year: 2022,
        condition: MachineCondition::New,
        drive_type: DriveType::Electric,
        power_kw: Some(15.0),
        gross_weight_kg: Some(6400.0),
        net_weight_kg: Some(6000.0),
        package_count: 2,
        integrated_robot: false,
        auxiliary_pneumatics: false,
    }
}

pub(super) fn ce_document(kind: CeDocumentKind) -> CeDocument {
    CeDocument {
        kind,
        status: ValidationStatus::Validated,
        harmonized_standards: Vec::new(),
        regulation: None,
        signed: true,
        eu_representative: None,
        extracted: ExtractedFields::default(),
        component_id: None,
    }
}

pub(super) fn declaration() -> CeDocument {
    CeDocument {
        harmonized_standards: vec!["EN ISO 12100".to_string(), "EN 60204-1".to_string()],
        regulation: Some("2006/42/EC".to_string()),
        eu_representative: Some("Müller Maschinen GmbH".to_string()),
        extracted: ExtractedFields {
            serial_number: Some("VMC-850-2209".to_string()),
            model: Some("VMC-850".to_string()),
        },
        ..ce_document(CeDocumentKind::DeclarationOfConformity)
    }
}

pub(super) fn customs_document(kind: CustomsDocumentKind) -> CustomsDocument {
    CustomsDocument {
        kind,
        status: ValidationStatus::Validated,
        declared_weight_kg: None,
        declared_value: None,
        declared_hs_code: None,
        declared_trade_terms: None,
        component_matches: Vec::new(),
    }
}

pub(super) fn component(id: &str, requires_own_ce_marking: bool) -> ComponentInfo {
    ComponentInfo {
        id: ComponentId(id.to_string()),
        description: "Chip conveyor".to_string(),
        serial_number: Some(format!("{id}-sn")),
        weight_kg: Some(120.0),
        quantity: 1,
        commercial_value: Some(4800.0),
        requires_own_ce_marking,
    }
}

/// Fully consistent dossier: every mandatory document present, weights and
/// codes aligned. The engine must find nothing to complain about.
pub(super) fn complete_dossier() -> CaseDossier {
    CaseDossier {
        case: case(),
        machine: machine(),
        components: Vec::new(),
        ce_documents: vec![
            declaration(),
            ce_document(CeDocumentKind::UserManual),
            ce_document(CeDocumentKind::TechnicalFile),
            ce_document(CeDocumentKind::ElectricalSchematics),
        ],
        customs_documents: vec![
            CustomsDocument {
                declared_weight_kg: Some(6400.0),
                ..customs_document(CustomsDocumentKind::BillOfLading)
            },
            CustomsDocument {
                declared_value: Some(185_000.0),
                declared_hs_code: Some("8457.10".to_string()),
                declared_trade_terms: Some("FOB".to_string()),
                ..customs_document(CustomsDocumentKind::CommercialInvoice)
            },
            CustomsDocument {
                declared_weight_kg: Some(6400.0),
                ..customs_document(CustomsDocumentKind::PackingList)
            },
        ],
    }
}

/// Scenario: used machine with CE gaps and a component missing from the
/// invoice. One critical anomaly (no updated risk analysis).
pub(super) fn used_machine_dossier() -> CaseDossier {
    let mut dossier = complete_dossier();
    dossier.machine.condition = MachineCondition::Used;
    dossier.components = vec![component("comp-1", true)];

    dossier.ce_documents = vec![
        CeDocument {
            harmonized_standards: vec!["EN 60204-1".to_string()],
            ..declaration()
        },
        ce_document(CeDocumentKind::UserManual),
        ce_document(CeDocumentKind::ElectricalSchematics),
    ];

    for document in &mut dossier.customs_documents {
        match document.kind {
            CustomsDocumentKind::BillOfLading | CustomsDocumentKind::PackingList => {
                document.declared_weight_kg = Some(6520.0);
            }
            _ => {}
        }
    }
    dossier.customs_documents[1].component_matches = vec![ComponentMatch {
        component_id: ComponentId("comp-1".to_string()),
        found: false,
        manually_confirmed: false,
    }];
    dossier.customs_documents[2].component_matches = vec![ComponentMatch {
        component_id: ComponentId("comp-1".to_string()),
        found: true,
        manually_confirmed: false,
    }];

    dossier
}

/// Scenario: customs identity and document gaps plus cross-document
/// inconsistencies (HS code, trade terms, overweight bill of lading).
pub(super) fn customs_gap_dossier() -> CaseDossier {
    let mut dossier = complete_dossier();
    dossier.case.customs_identifier = None;
    dossier.case.trade_terms = Some("CIF".to_string());

    for document in &mut dossier.customs_documents {
        match document.kind {
            CustomsDocumentKind::BillOfLading | CustomsDocumentKind::PackingList => {
                document.declared_weight_kg = Some(7500.0);
            }
            CustomsDocumentKind::CommercialInvoice => {
                document.declared_hs_code = Some("8207.13".to_string());
                document.declared_trade_terms = Some("EXW".to_string());
            }
            _ => {}
        }
    }

    dossier
}

pub(super) fn engine() -> RiskEngine {
    RiskEngine::default()
}

#[derive(Default, Clone)]
pub(super) struct MemoryAlerts {
    events: Arc<Mutex<Vec<RiskAlert>>>,
}

impl MemoryAlerts {
    pub(super) fn events(&self) -> Vec<RiskAlert> {
        self.events.lock().expect("alert mutex poisoned").clone()
    }
}

impl AlertPublisher for MemoryAlerts {
    fn publish(&self, alert: RiskAlert) -> Result<(), AlertError> {
        self.events
            .lock()
            .expect("alert mutex poisoned")
            .push(alert);
        Ok(())
    }
}

pub(super) struct ConflictRepository;

impl AssessmentRepository for ConflictRepository {
    fn insert(&self, _record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn update(&self, _record: AssessmentRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn fetch(&self, _case_ref: &CaseRef) -> Result<Option<AssessmentRecord>, RepositoryError> {
        Ok(None)
    }

    fn pending(&self, _limit: usize) -> Result<Vec<AssessmentRecord>, RepositoryError> {
        Ok(Vec::new())
    }
}

pub(super) struct UnavailableRepository;

impl AssessmentRepository for UnavailableRepository {
    fn insert(&self, _record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: AssessmentRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _case_ref: &CaseRef) -> Result<Option<AssessmentRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn pending(&self, _limit: usize) -> Result<Vec<AssessmentRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn build_service() -> (
    CaseAssessmentService<InMemoryAssessmentRepository, MemoryAlerts>,
    Arc<InMemoryAssessmentRepository>,
    Arc<MemoryAlerts>,
) {
    let repository = Arc::new(InMemoryAssessmentRepository::default());
    let alerts = Arc::new(MemoryAlerts::default());
    let service =
        CaseAssessmentService::new(repository.clone(), alerts.clone(), ScoringConfig::default());
    (service, repository, alerts)
}

pub(super) fn assessment_router_with_service(
    service: CaseAssessmentService<InMemoryAssessmentRepository, MemoryAlerts>,
) -> axum::Router {
    assessment_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
