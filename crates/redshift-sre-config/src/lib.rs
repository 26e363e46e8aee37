// crates/redshift-sre-config/src/lib.rs
// ============================================================================
// Module: Redshift SRE Config Library
// Description: Canonical monitor configuration model and validation.
// Purpose: Single source of truth for monitor settings from TOML or environment.
// Dependencies: redshift-sre-core, serde, toml
// ============================================================================

//! ## Overview
//! `redshift-sre-config` defines the configuration model for the monitoring
//! job. Configuration comes from a TOML file or from process environment
//! variables; both paths share one fail-closed validation step and convert
//! into core [`redshift_sre_core::JobSettings`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod env;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use env::ENV_KEYS;
