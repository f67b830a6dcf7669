//! Data loading
//!
//! Tunables and synergy rules live in external RON files so they can be
//! balanced without recompiling. Every file falls back to hardcoded defaults.

pub mod config;
pub mod loader;
pub mod synergies;

pub use config::{ConfigError, ElementsConfig};
pub use loader::{config_directory, export_default_data, DataManager};
pub use synergies::{default_synergy_defs, SynergyDef, SynergyDefs};
