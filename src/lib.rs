//! Compliance dossier management for industrial machinery imports.
//!
//! The interesting part of the crate is [`compliance`]: a deterministic
//! risk and cross-check engine that inspects a case's machine, accessory
//! components, CE conformity documents, and customs documents, then reduces
//! its findings to a capped, weighted risk score with recommendations. The
//! surrounding modules (config, telemetry, HTTP error mapping) host that
//! engine inside a small axum service.

pub mod compliance;
pub mod config;
pub mod error;
pub mod telemetry;
