//! Fail-fast validation of engine input.
//!
//! Missing data is business as usual for the rule battery and is expressed
//! as anomalies, never as errors. The only inputs the engine refuses are
//! malformed ones: blank strings smuggled inside `Some`, negative or
//! non-finite amounts, zero quantities, and dangling component references.

use std::collections::BTreeSet;

use super::domain::{CaseDossier, CeDocument, ComponentInfo, CustomsDocument};

/// Rejection raised before any rule runs, identifying the offending field.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("field `{field}` must be absent rather than blank")]
    BlankField { field: String },
    #[error("field `{field}` must be a non-negative finite number, found {value}")]
    InvalidAmount { field: String, value: f64 },
    #[error("component `{id}` declares a zero quantity")]
    ZeroQuantity { id: String },
    #[error("machine declares zero packages")]
    ZeroPackageCount,
    #[error("component id `{id}` is declared more than once")]
    DuplicateComponent { id: String },
    #[error("{document} references unknown component `{id}`")]
    UnknownComponent { document: String, id: String },
}

fn require_present(field: &str, value: &str) -> Result<(), InputError> {
    if value.trim().is_empty() {
        return Err(InputError::BlankField {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn require_optional(field: &str, value: Option<&String>) -> Result<(), InputError> {
    match value {
        Some(text) => require_present(field, text),
        None => Ok(()),
    }
}

fn require_amount(field: &str, value: Option<f64>) -> Result<(), InputError> {
    match value {
        Some(amount) if !amount.is_finite() || amount < 0.0 => Err(InputError::InvalidAmount {
            field: field.to_string(),
            value: amount,
        }),
        _ => Ok(()),
    }
}

fn validate_component(component: &ComponentInfo) -> Result<(), InputError> {
    let id = &component.id.0;
    require_present("component.id", id)?;
    require_present("component.description", &component.description)?;
    require_optional("component.serial_number", component.serial_number.as_ref())?;
    require_amount("component.weight_kg", component.weight_kg)?;
    require_amount("component.commercial_value", component.commercial_value)?;
    if component.quantity == 0 {
        return Err(InputError::ZeroQuantity { id: id.clone() });
    }
    Ok(())
}

fn validate_ce_document(
    document: &CeDocument,
    components: &BTreeSet<&str>,
) -> Result<(), InputError> {
    let label = document.kind.label();
    for standard in &document.harmonized_standards {
        require_present("ce_document.harmonized_standards", standard)?;
    }
    require_optional("ce_document.regulation", document.regulation.as_ref())?;
    require_optional(
        "ce_document.eu_representative",
        document.eu_representative.as_ref(),
    )?;
    require_optional(
        "ce_document.extracted.serial_number",
        document.extracted.serial_number.as_ref(),
    )?;
    require_optional(
        "ce_document.extracted.model",
        document.extracted.model.as_ref(),
    )?;
    if let Some(component_id) = &document.component_id {
        if !components.contains(component_id.0.as_str()) {
            return Err(InputError::UnknownComponent {
                document: label.to_string(),
                id: component_id.0.clone(),
            });
        }
    }
    Ok(())
}

fn validate_customs_document(
    document: &CustomsDocument,
    components: &BTreeSet<&str>,
) -> Result<(), InputError> {
    let label = document.kind.label();
    require_amount("customs_document.declared_weight_kg", document.declared_weight_kg)?;
    require_amount("customs_document.declared_value", document.declared_value)?;
    require_optional(
        "customs_document.declared_hs_code",
        document.declared_hs_code.as_ref(),
    )?;
    require_optional(
        "customs_document.declared_trade_terms",
        document.declared_trade_terms.as_ref(),
    )?;
    for entry in &document.component_matches {
        if !components.contains(entry.component_id.0.as_str()) {
            return Err(InputError::UnknownComponent {
                document: label.to_string(),
                id: entry.component_id.0.clone(),
            });
        }
    }
    Ok(())
}

impl CaseDossier {
    /// Reject malformed input before the rule battery runs.
    pub fn validate(&self) -> Result<(), InputError> {
        require_optional("case.customs_identifier", self.case.customs_identifier.as_ref())?;
        require_optional("case.trade_terms", self.case.trade_terms.as_ref())?;
        require_optional("case.arrival_port", self.case.arrival_port.as_ref())?;
        require_optional("case.supplier_name", self.case.supplier_name.as_ref())?;
        require_optional("case.tariff_code", self.case.tariff_code.as_ref())?;

        require_present("machine.name", &self.machine.name)?;
        require_present("machine.make_model", &self.machine.make_model)?;
        require_present("machine.serial_number", &self.machine.serial_number)?;
        require_amount("machine.power_kw", self.machine.power_kw)?;
        require_amount("machine.gross_weight_kg", self.machine.gross_weight_kg)?;
        require_amount("machine.net_weight_kg", self.machine.net_weight_kg)?;
        if self.machine.package_count == 0 {
            return Err(InputError::ZeroPackageCount);
        }

        let mut seen = BTreeSet::new();
        for component in &self.components {
            validate_component(component)?;
            if !seen.insert(component.id.0.as_str()) {
                return Err(InputError::DuplicateComponent {
                    id: component.id.0.clone(),
                });
            }
        }

        for document in &self.ce_documents {
            validate_ce_document(document, &seen)?;
        }
        for document in &self.customs_documents {
            validate_customs_document(document, &seen)?;
        }

        Ok(())
    }
}
