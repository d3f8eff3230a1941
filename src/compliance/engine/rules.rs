//! The rule battery: an ordered registry of independent checks over a case
//! dossier. Each rule owns its code, category, severity, penalty weight,
//! and recommendation; its check reads the dossier and reports zero or
//! more findings. Registry order fixes the emitted anomaly order.

use super::super::domain::{
    Anomaly, CaseDossier, CeDocument, CeDocumentKind, ComponentInfo, CustomsDocument,
    CustomsDocumentKind, DriveType, MachineCondition, MachineInfo, RiskCategory, Severity,
    ValidationStatus,
};

/// Relative deviation tolerated between declared and expected weights.
const WEIGHT_TOLERANCE: f64 = 0.05;
/// Deviation above which the bill-of-lading weight rule escalates.
const WEIGHT_ESCALATION: f64 = 0.15;

/// One reported occurrence of a rule. Severity and penalty are normally
/// taken from the rule; a finding may override both (weight escalation).
pub(crate) struct Finding {
    message: String,
    severity: Option<Severity>,
    penalty: Option<u16>,
}

impl Finding {
    fn new(message: String) -> Self {
        Self {
            message,
            severity: None,
            penalty: None,
        }
    }

    fn escalated(message: String, severity: Severity, penalty: u16) -> Self {
        Self {
            message,
            severity: Some(severity),
            penalty: Some(penalty),
        }
    }
}

type CheckFn = fn(&CaseDossier) -> Vec<Finding>;

/// Registry entry: anomaly template plus the predicate that instantiates it.
pub(crate) struct RiskRule {
    pub code: &'static str,
    pub category: RiskCategory,
    pub severity: Severity,
    pub penalty: u16,
    pub recommendation: &'static str,
    check: CheckFn,
}

/// Run every rule in registry order and collect the typed anomalies.
pub(crate) fn evaluate(dossier: &CaseDossier) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();
    for rule in REGISTRY {
        for finding in (rule.check)(dossier) {
            anomalies.push(Anomaly {
                code: rule.code.to_string(),
                category: rule.category,
                severity: finding.severity.unwrap_or(rule.severity),
                message: finding.message,
                recommendation: rule.recommendation.to_string(),
                penalty: finding.penalty.unwrap_or(rule.penalty),
            });
        }
    }
    anomalies
}

pub(crate) static REGISTRY: &[RiskRule] = &[
    RiskRule {
        code: "customs.missing_importer_id",
        category: RiskCategory::Customs,
        severity: Severity::Critical,
        penalty: 45,
        recommendation: "Record the importer's EORI number before lodging the customs declaration.",
        check: missing_importer_id,
    },
    RiskRule {
        code: "customs.missing_trade_terms",
        category: RiskCategory::Customs,
        severity: Severity::Medium,
        penalty: 12,
        recommendation: "Agree and record the Incoterms governing the transaction.",
        check: missing_trade_terms,
    },
    RiskRule {
        code: "customs.missing_machine_weight",
        category: RiskCategory::Customs,
        severity: Severity::High,
        penalty: 25,
        recommendation: "Weigh the machine and record its gross weight on the case.",
        check: missing_machine_weight,
    },
    RiskRule {
        code: "customs.missing_insurance_certificate",
        category: RiskCategory::Customs,
        severity: Severity::High,
        penalty: 25,
        recommendation: "Obtain the insurance certificate covering the seller-insured transport.",
        check: missing_insurance_certificate,
    },
    RiskRule {
        code: "customs.missing_bill_of_lading",
        category: RiskCategory::Customs,
        severity: Severity::Critical,
        penalty: 30,
        recommendation: "Request the bill of lading from the carrier.",
        check: missing_bill_of_lading,
    },
    RiskRule {
        code: "customs.missing_commercial_invoice",
        category: RiskCategory::Customs,
        severity: Severity::Critical,
        penalty: 30,
        recommendation: "Request the commercial invoice from the supplier.",
        check: missing_commercial_invoice,
    },
    RiskRule {
        code: "customs.missing_packing_list",
        category: RiskCategory::Customs,
        severity: Severity::Critical,
        penalty: 30,
        recommendation: "Request the packing list from the supplier.",
        check: missing_packing_list,
    },
    RiskRule {
        code: "ce.missing_declaration_of_conformity",
        category: RiskCategory::Ce,
        severity: Severity::Critical,
        penalty: 40,
        recommendation: "Obtain the EC declaration of conformity from the manufacturer.",
        check: missing_declaration,
    },
    RiskRule {
        code: "ce.missing_user_manual",
        category: RiskCategory::Ce,
        severity: Severity::High,
        penalty: 25,
        recommendation: "Obtain the user manual for the machine.",
        check: missing_user_manual,
    },
    RiskRule {
        code: "ce.missing_technical_file",
        category: RiskCategory::Ce,
        severity: Severity::High,
        penalty: 25,
        recommendation: "Request the technical file from the manufacturer.",
        check: missing_technical_file,
    },
    RiskRule {
        code: "ce.missing_electrical_schematics",
        category: RiskCategory::Ce,
        severity: Severity::Medium,
        penalty: 12,
        recommendation: "Add the electrical schematics to the technical documentation.",
        check: missing_electrical_schematics,
    },
    RiskRule {
        code: "ce.missing_hydraulic_schematics",
        category: RiskCategory::Ce,
        severity: Severity::Medium,
        penalty: 12,
        recommendation: "Add the hydraulic schematics to the technical documentation.",
        check: missing_hydraulic_schematics,
    },
    RiskRule {
        code: "ce.missing_pneumatic_schematics",
        category: RiskCategory::Ce,
        severity: Severity::Low,
        penalty: 6,
        recommendation: "Add the pneumatic schematics to the technical documentation.",
        check: missing_pneumatic_schematics,
    },
    RiskRule {
        code: "ce.missing_harmonized_standard",
        category: RiskCategory::Ce,
        severity: Severity::High,
        penalty: 25,
        recommendation: "Have the declaration reissued citing the applicable harmonized standard.",
        check: missing_harmonized_standard,
    },
    RiskRule {
        code: "ce.declaration_unsigned",
        category: RiskCategory::Ce,
        severity: Severity::High,
        penalty: 20,
        recommendation: "Have the declaration signed by the manufacturer's authorized person.",
        check: declaration_unsigned,
    },
    RiskRule {
        code: "ce.declaration_missing_regulation",
        category: RiskCategory::Ce,
        severity: Severity::Medium,
        penalty: 12,
        recommendation: "Have the declaration cite Machinery Directive 2006/42/EC.",
        check: declaration_missing_regulation,
    },
    RiskRule {
        code: "ce.missing_eu_representative",
        category: RiskCategory::Ce,
        severity: Severity::Low,
        penalty: 6,
        recommendation: "Record the EU authorized representative on the declaration.",
        check: missing_eu_representative,
    },
    RiskRule {
        code: "ce.missing_risk_analysis_for_used",
        category: RiskCategory::Ce,
        severity: Severity::Critical,
        penalty: 40,
        recommendation: "Commission an updated risk analysis before importing the used machine.",
        check: missing_risk_analysis_for_used,
    },
    RiskRule {
        code: "ce.component_missing_certificate",
        category: RiskCategory::Ce,
        severity: Severity::High,
        penalty: 25,
        recommendation: "Collect a CE certificate for every component requiring its own marking.",
        check: component_missing_certificate,
    },
    RiskRule {
        code: "coherence.serial_number_mismatch",
        category: RiskCategory::Coherence,
        severity: Severity::Critical,
        penalty: 35,
        recommendation: "Reconcile the declaration's serial number with the machine plate.",
        check: serial_number_mismatch,
    },
    RiskRule {
        code: "coherence.bill_of_lading_weight_deviation",
        category: RiskCategory::Coherence,
        severity: Severity::Medium,
        penalty: 15,
        recommendation: "Reconcile the declared weights with the actual shipment weight.",
        check: bill_of_lading_weight_deviation,
    },
    RiskRule {
        code: "coherence.weight_documents_divergence",
        category: RiskCategory::Coherence,
        severity: Severity::Medium,
        penalty: 12,
        recommendation: "Align the packing list weight with the bill of lading.",
        check: weight_documents_divergence,
    },
    RiskRule {
        code: "coherence.hs_code_mismatch",
        category: RiskCategory::Coherence,
        severity: Severity::High,
        penalty: 25,
        recommendation: "Reconcile the invoice HS code with the tariff code selected on the case.",
        check: hs_code_mismatch,
    },
    RiskRule {
        code: "coherence.trade_terms_mismatch",
        category: RiskCategory::Coherence,
        severity: Severity::Medium,
        penalty: 12,
        recommendation: "Align the invoice Incoterms with the case trade terms.",
        check: trade_terms_mismatch,
    },
    RiskRule {
        code: "coherence.component_not_on_invoice",
        category: RiskCategory::Coherence,
        severity: Severity::High,
        penalty: 25,
        recommendation: "Have the supplier reissue the commercial invoice listing every component.",
        check: component_not_on_invoice,
    },
    RiskRule {
        code: "coherence.component_not_on_packing_list",
        category: RiskCategory::Coherence,
        severity: Severity::Medium,
        penalty: 12,
        recommendation: "Have the supplier reissue the packing list listing every component.",
        check: component_not_on_packing_list,
    },
];

// Document lookups. Rejected uploads count as absent everywhere.

fn ce_document(dossier: &CaseDossier, kind: CeDocumentKind) -> Option<&CeDocument> {
    dossier
        .ce_documents
        .iter()
        .find(|doc| doc.kind == kind && doc.status != ValidationStatus::Rejected)
}

fn customs_document(dossier: &CaseDossier, kind: CustomsDocumentKind) -> Option<&CustomsDocument> {
    dossier
        .customs_documents
        .iter()
        .find(|doc| doc.kind == kind && doc.status != ValidationStatus::Rejected)
}

// Normalization helpers: comparisons always run on canonical forms.

fn normalize_serial(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn normalize_standard(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn normalize_trade_terms(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// First six digits of a tariff/HS code, punctuation stripped.
fn hs_prefix(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).take(6).collect()
}

fn seller_arranges_insurance(terms: &str) -> bool {
    matches!(normalize_trade_terms(terms).as_str(), "CIF" | "CIP")
}

/// Harmonized standard the declaration must cite for this machine.
fn required_standard(machine: &MachineInfo) -> &'static str {
    if machine.integrated_robot {
        "EN ISO 10218-2"
    } else {
        "EN ISO 12100"
    }
}

/// Machine gross weight plus quantity-weighted component weights.
fn expected_total_weight(dossier: &CaseDossier) -> Option<f64> {
    let machine = dossier.machine.gross_weight_kg?;
    let components: f64 = dossier
        .components
        .iter()
        .filter_map(|c| c.weight_kg.map(|w| w * f64::from(c.quantity)))
        .sum();
    Some(machine + components)
}

fn relative_deviation(declared: f64, expected: f64) -> Option<f64> {
    if expected <= 0.0 {
        return None;
    }
    Some((declared - expected).abs() / expected)
}

fn component_listed(document: &CustomsDocument, component: &ComponentInfo) -> bool {
    document
        .component_matches
        .iter()
        .any(|entry| entry.component_id == component.id && (entry.found || entry.manually_confirmed))
}

fn missing_doc(present: bool, message: String) -> Vec<Finding> {
    if present {
        Vec::new()
    } else {
        vec![Finding::new(message)]
    }
}

// Customs checks.

fn missing_importer_id(dossier: &CaseDossier) -> Vec<Finding> {
    missing_doc(
        dossier.case.customs_identifier.is_some(),
        "no importer customs identifier (EORI) recorded on the case".to_string(),
    )
}

fn missing_trade_terms(dossier: &CaseDossier) -> Vec<Finding> {
    missing_doc(
        dossier.case.trade_terms.is_some(),
        "no trade terms (Incoterms) recorded on the case".to_string(),
    )
}

fn missing_machine_weight(dossier: &CaseDossier) -> Vec<Finding> {
    missing_doc(
        dossier.machine.gross_weight_kg.is_some(),
        "machine gross weight is not declared".to_string(),
    )
}

fn missing_insurance_certificate(dossier: &CaseDossier) -> Vec<Finding> {
    let Some(terms) = dossier.case.trade_terms.as_deref() else {
        return Vec::new();
    };
    if !seller_arranges_insurance(terms) {
        return Vec::new();
    }
    missing_doc(
        customs_document(dossier, CustomsDocumentKind::InsuranceCertificate).is_some(),
        format!("trade terms {} require an insurance certificate, none uploaded", terms.trim()),
    )
}

fn missing_bill_of_lading(dossier: &CaseDossier) -> Vec<Finding> {
    missing_doc(
        customs_document(dossier, CustomsDocumentKind::BillOfLading).is_some(),
        "no bill of lading uploaded for the case".to_string(),
    )
}

fn missing_commercial_invoice(dossier: &CaseDossier) -> Vec<Finding> {
    missing_doc(
        customs_document(dossier, CustomsDocumentKind::CommercialInvoice).is_some(),
        "no commercial invoice uploaded for the case".to_string(),
    )
}

fn missing_packing_list(dossier: &CaseDossier) -> Vec<Finding> {
    missing_doc(
        customs_document(dossier, CustomsDocumentKind::PackingList).is_some(),
        "no packing list uploaded for the case".to_string(),
    )
}

// CE checks.

fn missing_declaration(dossier: &CaseDossier) -> Vec<Finding> {
    missing_doc(
        ce_document(dossier, CeDocumentKind::DeclarationOfConformity).is_some(),
        "no declaration of conformity uploaded for the machine".to_string(),
    )
}

fn missing_user_manual(dossier: &CaseDossier) -> Vec<Finding> {
    missing_doc(
        ce_document(dossier, CeDocumentKind::UserManual).is_some(),
        "no user manual uploaded for the machine".to_string(),
    )
}

fn missing_technical_file(dossier: &CaseDossier) -> Vec<Finding> {
    missing_doc(
        ce_document(dossier, CeDocumentKind::TechnicalFile).is_some(),
        "no technical file uploaded for the machine".to_string(),
    )
}

fn missing_electrical_schematics(dossier: &CaseDossier) -> Vec<Finding> {
    let machine = &dossier.machine;
    let required = matches!(machine.drive_type, DriveType::Electric | DriveType::Hybrid)
        || machine.integrated_robot;
    if !required {
        return Vec::new();
    }
    missing_doc(
        ce_document(dossier, CeDocumentKind::ElectricalSchematics).is_some(),
        "electrical schematics required for this drive type are missing".to_string(),
    )
}

fn missing_hydraulic_schematics(dossier: &CaseDossier) -> Vec<Finding> {
    if !matches!(
        dossier.machine.drive_type,
        DriveType::Hydraulic | DriveType::Hybrid
    ) {
        return Vec::new();
    }
    missing_doc(
        ce_document(dossier, CeDocumentKind::HydraulicSchematics).is_some(),
        "hydraulic schematics required for this drive type are missing".to_string(),
    )
}

fn missing_pneumatic_schematics(dossier: &CaseDossier) -> Vec<Finding> {
    if !dossier.machine.auxiliary_pneumatics {
        return Vec::new();
    }
    missing_doc(
        ce_document(dossier, CeDocumentKind::PneumaticSchematics).is_some(),
        "pneumatic schematics required by the auxiliary pneumatics are missing".to_string(),
    )
}

fn missing_harmonized_standard(dossier: &CaseDossier) -> Vec<Finding> {
    let Some(declaration) = ce_document(dossier, CeDocumentKind::DeclarationOfConformity) else {
        return Vec::new();
    };
    let required = required_standard(&dossier.machine);
    let wanted = normalize_standard(required);
    let cited = declaration
        .harmonized_standards
        .iter()
        .any(|standard| normalize_standard(standard) == wanted);
    missing_doc(
        cited,
        format!("declaration of conformity does not cite {required}"),
    )
}

fn declaration_unsigned(dossier: &CaseDossier) -> Vec<Finding> {
    let Some(declaration) = ce_document(dossier, CeDocumentKind::DeclarationOfConformity) else {
        return Vec::new();
    };
    missing_doc(
        declaration.signed,
        "declaration of conformity is not signed".to_string(),
    )
}

fn declaration_missing_regulation(dossier: &CaseDossier) -> Vec<Finding> {
    let Some(declaration) = ce_document(dossier, CeDocumentKind::DeclarationOfConformity) else {
        return Vec::new();
    };
    let cites_directive = declaration
        .regulation
        .as_deref()
        .map(|regulation| regulation.replace(' ', "").contains("2006/42"))
        .unwrap_or(false);
    missing_doc(
        cites_directive,
        "declaration of conformity does not cite Machinery Directive 2006/42/EC".to_string(),
    )
}

fn missing_eu_representative(dossier: &CaseDossier) -> Vec<Finding> {
    let Some(declaration) = ce_document(dossier, CeDocumentKind::DeclarationOfConformity) else {
        return Vec::new();
    };
    missing_doc(
        declaration.eu_representative.is_some(),
        "no EU authorized representative recorded on the declaration".to_string(),
    )
}

fn missing_risk_analysis_for_used(dossier: &CaseDossier) -> Vec<Finding> {
    if dossier.machine.condition != MachineCondition::Used {
        return Vec::new();
    }
    missing_doc(
        ce_document(dossier, CeDocumentKind::RiskAnalysis).is_some(),
        "used machine imported without an updated risk analysis".to_string(),
    )
}

fn component_missing_certificate(dossier: &CaseDossier) -> Vec<Finding> {
    dossier
        .components
        .iter()
        .filter(|component| component.requires_own_ce_marking)
        .filter(|component| {
            !dossier.ce_documents.iter().any(|doc| {
                doc.status != ValidationStatus::Rejected
                    && doc.component_id.as_ref() == Some(&component.id)
            })
        })
        .map(|component| {
            Finding::new(format!(
                "component {} ({}) requires its own CE marking but has no linked certificate",
                component.id.0, component.description
            ))
        })
        .collect()
}

// Coherence checks.

fn serial_number_mismatch(dossier: &CaseDossier) -> Vec<Finding> {
    let Some(declaration) = ce_document(dossier, CeDocumentKind::DeclarationOfConformity) else {
        return Vec::new();
    };
    let Some(extracted) = declaration.extracted.serial_number.as_deref() else {
        return Vec::new();
    };
    let machine_serial = dossier.machine.serial_number.as_str();
    if normalize_serial(extracted) == normalize_serial(machine_serial) {
        return Vec::new();
    }
    vec![Finding::new(format!(
        "declaration cites serial {extracted}, machine plate reads {machine_serial}"
    ))]
}

fn bill_of_lading_weight_deviation(dossier: &CaseDossier) -> Vec<Finding> {
    let Some(bill) = customs_document(dossier, CustomsDocumentKind::BillOfLading) else {
        return Vec::new();
    };
    let (Some(declared), Some(expected)) =
        (bill.declared_weight_kg, expected_total_weight(dossier))
    else {
        return Vec::new();
    };
    let Some(deviation) = relative_deviation(declared, expected) else {
        return Vec::new();
    };
    if deviation <= WEIGHT_TOLERANCE {
        return Vec::new();
    }
    let message = format!(
        "bill of lading declares {declared:.0} kg, expected {expected:.0} kg ({:.1} % deviation)",
        deviation * 100.0
    );
    if deviation > WEIGHT_ESCALATION {
        vec![Finding::escalated(message, Severity::High, 30)]
    } else {
        vec![Finding::new(message)]
    }
}

fn weight_documents_divergence(dossier: &CaseDossier) -> Vec<Finding> {
    let bill = customs_document(dossier, CustomsDocumentKind::BillOfLading);
    let packing = customs_document(dossier, CustomsDocumentKind::PackingList);
    let (Some(bill_weight), Some(packing_weight)) = (
        bill.and_then(|doc| doc.declared_weight_kg),
        packing.and_then(|doc| doc.declared_weight_kg),
    ) else {
        return Vec::new();
    };
    let Some(deviation) = relative_deviation(packing_weight, bill_weight) else {
        return Vec::new();
    };
    if deviation <= WEIGHT_TOLERANCE {
        return Vec::new();
    }
    vec![Finding::new(format!(
        "packing list declares {packing_weight:.0} kg against {bill_weight:.0} kg on the bill of lading"
    ))]
}

fn hs_code_mismatch(dossier: &CaseDossier) -> Vec<Finding> {
    let Some(invoice) = customs_document(dossier, CustomsDocumentKind::CommercialInvoice) else {
        return Vec::new();
    };
    let (Some(invoice_code), Some(tariff_code)) = (
        invoice.declared_hs_code.as_deref(),
        dossier.case.tariff_code.as_deref(),
    ) else {
        return Vec::new();
    };
    let invoice_prefix = hs_prefix(invoice_code);
    let tariff_prefix = hs_prefix(tariff_code);
    if invoice_prefix.is_empty() || tariff_prefix.is_empty() || invoice_prefix == tariff_prefix {
        return Vec::new();
    }
    vec![Finding::new(format!(
        "invoice HS code {invoice_code} does not match the selected tariff code {tariff_code}"
    ))]
}

fn trade_terms_mismatch(dossier: &CaseDossier) -> Vec<Finding> {
    let Some(invoice) = customs_document(dossier, CustomsDocumentKind::CommercialInvoice) else {
        return Vec::new();
    };
    let (Some(invoice_terms), Some(case_terms)) = (
        invoice.declared_trade_terms.as_deref(),
        dossier.case.trade_terms.as_deref(),
    ) else {
        return Vec::new();
    };
    if normalize_trade_terms(invoice_terms) == normalize_trade_terms(case_terms) {
        return Vec::new();
    }
    vec![Finding::new(format!(
        "invoice states {invoice_terms} while the case records {case_terms}"
    ))]
}

fn components_absent_from(
    dossier: &CaseDossier,
    kind: CustomsDocumentKind,
) -> Vec<Finding> {
    let Some(document) = customs_document(dossier, kind) else {
        return Vec::new();
    };
    dossier
        .components
        .iter()
        .filter(|component| !component_listed(document, component))
        .map(|component| {
            Finding::new(format!(
                "component {} ({}) is not listed on the {}",
                component.id.0,
                component.description,
                kind.label()
            ))
        })
        .collect()
}

fn component_not_on_invoice(dossier: &CaseDossier) -> Vec<Finding> {
    components_absent_from(dossier, CustomsDocumentKind::CommercialInvoice)
}

fn component_not_on_packing_list(dossier: &CaseDossier) -> Vec<Finding> {
    components_absent_from(dossier, CustomsDocumentKind::PackingList)
}
