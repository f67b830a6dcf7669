//! Engine configuration
//!
//! `ElementsConfig` is the root of `elements.ron`. Missing sections take
//! their defaults, so a file only needs the values it changes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ambient::AmbientConfig;
use crate::elements::ElementKind;
use crate::status::{EffectDefaults, EffectFactory, ManagerSettings};

/// Failure to read, parse, write or validate configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("failed to serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: ron::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Everything tunable about the engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementsConfig {
    pub manager: ManagerSettings,
    pub effects: EffectDefaults,
    pub ambient: AmbientConfig,
}

impl ElementsConfig {
    /// Check every duration, interval, fraction and multiplier
    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.manager;
        positive("manager.sweep_interval", m.sweep_interval)?;
        non_negative("manager.reaction_delay", m.reaction_delay)?;
        positive("manager.freeze_shatter_multiplier", m.freeze_shatter_multiplier)?;
        if m.explosion_damage < 0 {
            return Err(invalid("manager.explosion_damage", m.explosion_damage));
        }

        let e = &self.effects;
        if e.burn.total_damage < 0 {
            return Err(invalid("effects.burn.total_damage", e.burn.total_damage));
        }
        positive("effects.burn.duration", e.burn.duration)?;
        positive("effects.burn.tick_interval", e.burn.tick_interval)?;
        if !(0.0..1.0).contains(&e.drench.reduction) {
            return Err(invalid("effects.drench.reduction", e.drench.reduction));
        }
        positive("effects.drench.duration", e.drench.duration)?;
        positive("effects.winded_duration", e.winded_duration)?;
        positive("effects.freeze_duration", e.freeze_duration)?;
        positive("effects.shattered.multiplier", e.shattered.multiplier)?;
        positive("effects.shattered.duration", e.shattered.duration)?;

        let a = &self.ambient;
        if !(0.0..=1.0).contains(&a.probability) {
            return Err(invalid("ambient.probability", a.probability));
        }
        positive("ambient.duration", a.duration)?;
        non_negative("ambient.cooldown", a.cooldown)?;
        positive("ambient.cycle_interval", a.cycle_interval)?;
        if a.elements.is_empty() {
            return Err(ConfigError::Invalid("ambient.elements must not be empty".into()));
        }
        if let Some(bad) = a.elements.iter().find(|e| !ElementKind::all().contains(e)) {
            return Err(invalid("ambient.elements", bad.name()));
        }
        Ok(())
    }

    /// Factory using the configured effect parameters
    pub fn factory(&self) -> EffectFactory {
        EffectFactory::new(self.effects.clone())
    }
}

fn invalid(field: &str, value: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid(format!("{} = {}", field, value))
}

fn positive(field: &str, value: f64) -> Result<(), ConfigError> {
    // NaN fails too
    if value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value))
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ElementsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.manager.explosion_damage, 35);
        assert_eq!(config.effects.shattered.multiplier, 1.25);
        assert_eq!(config.ambient.cycle_interval, 1.0);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = ElementsConfig::default();
        config.effects.drench.reduction = 1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(msg)) if msg.contains("drench")));

        let mut config = ElementsConfig::default();
        config.manager.sweep_interval = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = ElementsConfig::default();
        config.ambient.probability = 1.5;
        assert!(config.validate().is_err());

        let mut config = ElementsConfig::default();
        config.ambient.elements = vec![ElementKind::Fire, ElementKind::None];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config: ElementsConfig = ron::from_str("(manager: (explosion_damage: 50))").unwrap();
        assert_eq!(config.manager.explosion_damage, 50);
        assert_eq!(config.manager.reaction_delay, 0.5);
        assert_eq!(config.effects, EffectDefaults::default());
    }
}
