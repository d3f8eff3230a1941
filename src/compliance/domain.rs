use serde::{Deserialize, Serialize};

/// Identifier wrapper for accessory components declared on a case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub String);

/// One import transaction under compliance review.
///
/// Optional fields are genuinely optional in the upstream intake forms;
/// absence is always `None`, never an empty string (see
/// [`CaseDossier::validate`](super::validate)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseInfo {
    /// Importer's customs identifier (EORI number).
    pub customs_identifier: Option<String>,
    /// Agreed Incoterms for the transaction (e.g. "FOB", "CIF").
    pub trade_terms: Option<String>,
    pub arrival_port: Option<String>,
    pub supplier_name: Option<String>,
    /// Tariff code selected by the importer for the main machine.
    pub tariff_code: Option<String>,
}

/// Condition of the machine as declared on intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineCondition {
    New,
    Used,
}

/// Primary drive technology of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveType {
    Hydraulic,
    Electric,
    Hybrid,
}

/// The declared machine at the center of the import case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineInfo {
    pub name: String,
    pub make_model: String,
    pub serial_number: String,
    pub production_year: u16,
    pub condition: MachineCondition,
    pub drive_type: DriveType,
    pub power_kw: Option<f64>,
    pub gross_weight_kg: Option<f64>,
    pub net_weight_kg: Option<f64>,
    pub package_count: u32,
    pub integrated_robot: bool,
    pub auxiliary_pneumatics: bool,
}

/// An accessory component shipped with the machine. Each is checked
/// independently by the per-component rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentInfo {
    pub id: ComponentId,
    pub description: String,
    pub serial_number: Option<String>,
    pub weight_kg: Option<f64>,
    pub quantity: u32,
    pub commercial_value: Option<f64>,
    pub requires_own_ce_marking: bool,
}

/// Closed set of CE conformity document kinds handled by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CeDocumentKind {
    DeclarationOfConformity,
    UserManual,
    TechnicalFile,
    RiskAnalysis,
    ElectricalSchematics,
    HydraulicSchematics,
    PneumaticSchematics,
    ComponentCertification,
}

impl CeDocumentKind {
    pub const fn label(self) -> &'static str {
        match self {
            CeDocumentKind::DeclarationOfConformity => "declaration of conformity",
            CeDocumentKind::UserManual => "user manual",
            CeDocumentKind::TechnicalFile => "technical file",
            CeDocumentKind::RiskAnalysis => "risk analysis",
            CeDocumentKind::ElectricalSchematics => "electrical schematics",
            CeDocumentKind::HydraulicSchematics => "hydraulic schematics",
            CeDocumentKind::PneumaticSchematics => "pneumatic schematics",
            CeDocumentKind::ComponentCertification => "component certification",
        }
    }
}

/// Reviewer state of an uploaded document. A `Rejected` document is
/// treated as absent by every rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Pending,
    Validated,
    Rejected,
}

/// Metadata extracted from a CE document upload. Kept as a side channel
/// next to the document, never mixed into the anomaly list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub serial_number: Option<String>,
    pub model: Option<String>,
}

/// A CE conformity document attached to the case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CeDocument {
    pub kind: CeDocumentKind,
    pub status: ValidationStatus,
    /// Harmonized standards cited by the document (e.g. "EN ISO 12100").
    #[serde(default)]
    pub harmonized_standards: Vec<String>,
    pub regulation: Option<String>,
    pub signed: bool,
    pub eu_representative: Option<String>,
    #[serde(default)]
    pub extracted: ExtractedFields,
    /// Set when the document certifies a single accessory component.
    pub component_id: Option<ComponentId>,
}

/// Closed set of customs/trade document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomsDocumentKind {
    BillOfLading,
    CommercialInvoice,
    PackingList,
    CertificateOfOrigin,
    InsuranceCertificate,
}

impl CustomsDocumentKind {
    pub const fn label(self) -> &'static str {
        match self {
            CustomsDocumentKind::BillOfLading => "bill of lading",
            CustomsDocumentKind::CommercialInvoice => "commercial invoice",
            CustomsDocumentKind::PackingList => "packing list",
            CustomsDocumentKind::CertificateOfOrigin => "certificate of origin",
            CustomsDocumentKind::InsuranceCertificate => "insurance certificate",
        }
    }
}

/// Whether a declared component was located on a customs document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentMatch {
    pub component_id: ComponentId,
    pub found: bool,
    pub manually_confirmed: bool,
}

/// A customs document attached to the case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomsDocument {
    pub kind: CustomsDocumentKind,
    pub status: ValidationStatus,
    pub declared_weight_kg: Option<f64>,
    pub declared_value: Option<f64>,
    pub declared_hs_code: Option<String>,
    pub declared_trade_terms: Option<String>,
    #[serde(default)]
    pub component_matches: Vec<ComponentMatch>,
}

/// Everything the engine reads for one evaluation call. Assembled by the
/// intake layer; the engine never mutates it and holds no state between
/// calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseDossier {
    pub case: CaseInfo,
    pub machine: MachineInfo,
    #[serde(default)]
    pub components: Vec<ComponentInfo>,
    #[serde(default)]
    pub ce_documents: Vec<CeDocument>,
    #[serde(default)]
    pub customs_documents: Vec<CustomsDocument>,
}

/// Scoring category an anomaly counts against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Ce,
    Customs,
    Coherence,
}

impl RiskCategory {
    pub const fn label(self) -> &'static str {
        match self {
            RiskCategory::Ce => "ce",
            RiskCategory::Customs => "customs",
            RiskCategory::Coherence => "coherence",
        }
    }
}

/// Severity attached to a detected gap or inconsistency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub const fn label(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

/// Qualitative level the composite score maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskTier {
    pub const fn label(self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
            RiskTier::Critical => "critical",
        }
    }
}

/// A detected gap or inconsistency, carrying its score penalty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anomaly {
    /// Stable rule identifier, e.g. `customs.missing_importer_id`.
    pub code: String,
    pub category: RiskCategory,
    pub severity: Severity,
    pub message: String,
    pub recommendation: String,
    /// Positive weight subtracted from the category sub-score.
    pub penalty: u16,
}
