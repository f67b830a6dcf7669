//! Synergy definitions for data-driven element interactions
//!
//! These are loaded from `synergies.ron` and converted into the runtime
//! [`SynergyTable`].

use serde::{Deserialize, Serialize};

use crate::elements::{default_rules, ElementKind, SynergyKind, SynergyRule, SynergyTable};
use super::config::ConfigError;

/// One rule as written in the data file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergyDef {
    pub a: ElementKind,
    pub b: ElementKind,
    pub kind: SynergyKind,
    #[serde(default)]
    pub description: String,
}

impl SynergyDef {
    /// Convert to a runtime rule
    pub fn to_runtime(&self) -> SynergyRule {
        SynergyRule::new(self.a, self.b, self.kind, self.description.clone())
    }
}

impl From<&SynergyRule> for SynergyDef {
    fn from(rule: &SynergyRule) -> Self {
        Self {
            a: rule.a,
            b: rule.b,
            kind: rule.kind,
            description: rule.description.clone(),
        }
    }
}

/// Contents of `synergies.ron`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynergyDefs {
    pub synergies: Vec<SynergyDef>,
}

impl SynergyDefs {
    /// Build the lookup table. A pair defined twice (in either order) is rejected.
    pub fn to_table(&self) -> Result<SynergyTable, ConfigError> {
        let mut table = SynergyTable::new();
        for def in &self.synergies {
            if def.a == ElementKind::None || def.b == ElementKind::None {
                return Err(ConfigError::Invalid(format!(
                    "synergy '{}' references the None element",
                    def.description
                )));
            }
            if !table.add_rule(def.to_runtime()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate synergy for {:?} + {:?}",
                    def.a, def.b
                )));
            }
        }
        Ok(table)
    }
}

/// The stock rules in data form
pub fn default_synergy_defs() -> SynergyDefs {
    SynergyDefs {
        synergies: default_rules().iter().map(SynergyDef::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_build_stock_table() {
        let table = default_synergy_defs().to_table().unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.kind_of(ElementKind::Fire, ElementKind::Water), SynergyKind::Negative);
        assert_eq!(table.kind_of(ElementKind::Wind, ElementKind::Fire), SynergyKind::Positive);
        assert_eq!(table.kind_of(ElementKind::Wind, ElementKind::Water), SynergyKind::Positive);
    }

    #[test]
    fn test_reversed_duplicate_is_rejected() {
        let mut defs = default_synergy_defs();
        defs.synergies.push(SynergyDef {
            a: ElementKind::Fire,
            b: ElementKind::Water,
            kind: SynergyKind::Positive,
            description: "steam".into(),
        });
        assert!(matches!(defs.to_table(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_parse_from_ron() {
        let text = r#"(
            synergies: [
                (a: Fire, b: Ice, kind: Negative, description: "melt"),
                (a: Water, b: Wind, kind: Positive),
            ],
        )"#;
        let defs: SynergyDefs = ron::from_str(text).unwrap();
        let table = defs.to_table().unwrap();
        assert_eq!(table.kind_of(ElementKind::Ice, ElementKind::Fire), SynergyKind::Negative);
        assert_eq!(table.get_synergy(ElementKind::Wind, ElementKind::Water).unwrap().description, "");
    }
}
