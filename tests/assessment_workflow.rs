//! Integration coverage for the dossier intake and risk assessment flow,
//! exercised through the public service facade and the HTTP router.

mod common {
    use std::sync::{Arc, Mutex};

    use machconform::compliance::{
        AlertError, AlertPublisher, CaseAssessmentService, CaseDossier, CaseInfo, CeDocument,
        CeDocumentKind, CustomsDocument, CustomsDocumentKind, DriveType, ExtractedFields,
        InMemoryAssessmentRepository, MachineCondition, MachineInfo, RiskAlert, ScoringConfig,
        ValidationStatus,
    };

    pub fn case() -> CaseInfo {
        CaseInfo {
            customs_identifier: Some("FR12345678901234".to_string()),
            trade_terms: Some("FOB".to_string()),
            arrival_port: Some("Le Havre".to_string()),
            supplier_name: Some("Chen Machinery Co.".to_string()),
            tariff_code: Some("8457.10".to_string()),
        }
    }

    pub fn machine() -> MachineInfo {
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

    pub fn ce_document(kind: CeDocumentKind) -> CeDocument {
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

    pub fn customs_document(kind: CustomsDocumentKind) -> CustomsDocument {
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

    pub fn complete_dossier() -> CaseDossier {
        CaseDossier {
            case: case(),
            machine: machine(),
            components: Vec::new(),
            ce_documents: vec![
                CeDocument {
                    harmonized_standards: vec!["EN ISO 12100".to_string()],
                    regulation: Some("2006/42/EC".to_string()),
                    eu_representative: Some("Müller Maschinen GmbH".to_string()),
                    extracted: ExtractedFields {
                        serial_number: Some("VMC-850-2209".to_string()),
                        model: Some("VMC-850".to_string()),
                    },
                    ..ce_document(CeDocumentKind::DeclarationOfConformity)
                },
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

    pub fn gap_dossier() -> CaseDossier {
        let mut dossier = complete_dossier();
        dossier.machine.condition = MachineCondition::Used;
        dossier
            .ce_documents
            .retain(|doc| doc.kind != CeDocumentKind::TechnicalFile);
        dossier
    }

    #[derive(Default, Clone)]
    pub struct MemoryAlerts {
        events: Arc<Mutex<Vec<RiskAlert>>>,
    }

    impl MemoryAlerts {
        pub fn events(&self) -> Vec<RiskAlert> {
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

    pub fn build_service() -> (
        CaseAssessmentService<InMemoryAssessmentRepository, MemoryAlerts>,
        Arc<InMemoryAssessmentRepository>,
        Arc<MemoryAlerts>,
    ) {
        let repository = Arc::new(InMemoryAssessmentRepository::default());
        let alerts = Arc::new(MemoryAlerts::default());
        let service = CaseAssessmentService::new(
            repository.clone(),
            alerts.clone(),
            ScoringConfig::default(),
        );
        (service, repository, alerts)
    }
}

mod workflow {
    use super::common::*;
    use machconform::compliance::{AssessmentRepository, DossierStatus, RiskTier};

    #[test]
    fn clean_dossier_flows_to_a_low_risk_record() {
        let (service, repository, alerts) = build_service();

        let record = service.submit(complete_dossier()).expect("submission");
        let result = service.assess(&record.case_ref).expect("assessment");

        assert_eq!(result.score_global, 100);
        assert_eq!(result.risk_tier, RiskTier::Low);
        assert!(result.anomalies.is_empty());

        let stored = repository
            .fetch(&record.case_ref)
            .expect("repo fetch")
            .expect("record present");
        assert_eq!(stored.status, DossierStatus::Assessed);
        assert!(alerts.events().is_empty());
    }

    #[test]
    fn gap_dossier_is_capped_and_recommends_fixes() {
        let (service, _, _) = build_service();

        let record = service.submit(gap_dossier()).expect("submission");
        let result = service.assess(&record.case_ref).expect("assessment");

        // Used machine without risk analysis: one critical anomaly.
        assert!(result.score_global <= 65);
        assert!(!result.recommendations.is_empty());

        let unique: std::collections::BTreeSet<&String> =
            result.recommendations.iter().collect();
        assert_eq!(unique.len(), result.recommendations.len());
    }
}

mod serialization {
    use super::common::*;
    use machconform::compliance::RiskEngine;
    use serde_json::Value;

    #[test]
    fn score_result_keeps_the_contract_field_shape() {
        let result = RiskEngine::default()
            .assess(&gap_dossier())
            .expect("assessment");
        let payload = serde_json::to_value(&result).expect("serialize");

        for field in [
            "score_global",
            "score_ce",
            "score_customs",
            "score_coherence",
            "risk_tier",
            "anomalies",
            "recommendations",
        ] {
            assert!(payload.get(field).is_some(), "missing field {field}");
        }

        let anomaly = payload
            .get("anomalies")
            .and_then(Value::as_array)
            .and_then(|list| list.first())
            .expect("at least one anomaly");
        for field in [
            "code",
            "category",
            "severity",
            "message",
            "recommendation",
            "penalty",
        ] {
            assert!(anomaly.get(field).is_some(), "missing anomaly field {field}");
        }

        let category = anomaly.get("category").and_then(Value::as_str).expect("category");
        assert!(matches!(category, "ce" | "customs" | "coherence"));
        let severity = anomaly.get("severity").and_then(Value::as_str).expect("severity");
        assert!(matches!(severity, "critical" | "high" | "medium" | "low"));
    }

    #[test]
    fn dossiers_round_trip_through_json() {
        let dossier = complete_dossier();
        let raw = serde_json::to_string(&dossier).expect("serialize");
        let parsed: machconform::compliance::CaseDossier =
            serde_json::from_str(&raw).expect("parse");
        assert_eq!(parsed, dossier);
    }
}

mod routing {
    use super::common::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    use machconform::compliance::assessment_router;

    #[tokio::test]
    async fn submitted_case_can_be_assessed_over_http() {
        let (service, _, _) = build_service();
        let router = assessment_router(Arc::new(service));

        let submit = Request::builder()
            .method("POST")
            .uri("/api/v1/compliance/cases")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_vec(&complete_dossier()).expect("serialize dossier"),
            ))
            .expect("request");

        let response = router.clone().oneshot(submit).await.expect("dispatch");
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let payload: Value = serde_json::from_slice(&body).expect("json");
        let case_ref = payload
            .get("case_ref")
            .and_then(Value::as_str)
            .expect("case ref")
            .to_string();

        let assess = Request::builder()
            .method("POST")
            .uri(format!("/api/v1/compliance/cases/{case_ref}/assessment"))
            .body(Body::empty())
            .expect("request");

        let response = router.clone().oneshot(assess).await.expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let payload: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload.get("score_global").and_then(Value::as_u64), Some(100));
        assert_eq!(payload.get("risk_tier").and_then(Value::as_str), Some("low"));
    }
}
