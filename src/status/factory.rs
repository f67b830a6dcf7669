//! Effect factory
//!
//! Turns an element identity into a concrete status effect using the
//! configured per-kind parameters.

use serde::{Deserialize, Serialize};

use crate::elements::ElementKind;
use crate::target::TargetId;
use super::effect::{EffectError, StatusEffect};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurnParams {
    pub total_damage: i32,
    pub duration: f64,
    pub tick_interval: f64,
}

impl Default for BurnParams {
    fn default() -> Self {
        Self {
            total_damage: 20,
            duration: 5.0,
            tick_interval: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrenchParams {
    /// Fraction of speed removed, in [0, 1)
    pub reduction: f64,
    pub duration: f64,
}

impl Default for DrenchParams {
    fn default() -> Self {
        Self {
            reduction: 0.3,
            duration: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShatteredParams {
    pub multiplier: f64,
    pub duration: f64,
}

impl Default for ShatteredParams {
    fn default() -> Self {
        Self {
            multiplier: 1.25,
            duration: 4.0,
        }
    }
}

/// Parameters for every effect kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectDefaults {
    pub burn: BurnParams,
    pub drench: DrenchParams,
    pub winded_duration: f64,
    pub freeze_duration: f64,
    pub shattered: ShatteredParams,
}

impl Default for EffectDefaults {
    fn default() -> Self {
        Self {
            burn: BurnParams::default(),
            drench: DrenchParams::default(),
            winded_duration: 5.0,
            freeze_duration: 3.0,
            shattered: ShatteredParams::default(),
        }
    }
}

/// Builds status effects from element identities
#[derive(Debug, Clone, Default)]
pub struct EffectFactory {
    defaults: EffectDefaults,
}

impl EffectFactory {
    pub fn new(defaults: EffectDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &EffectDefaults {
        &self.defaults
    }

    /// Build the effect an element inflicts. `Ok(None)` when the element
    /// has no status effect.
    pub fn create(
        &self,
        element: ElementKind,
        target: TargetId,
        inflicter: Option<TargetId>,
        now: f64,
    ) -> Result<Option<StatusEffect>, EffectError> {
        let d = &self.defaults;
        let effect = match element {
            ElementKind::Fire => StatusEffect::burn(
                target,
                d.burn.total_damage,
                d.burn.duration,
                d.burn.tick_interval,
                now,
            )?,
            ElementKind::Water => StatusEffect::drench(target, d.drench.reduction, d.drench.duration, now)?,
            ElementKind::Wind => StatusEffect::winded(target, d.winded_duration, now)?,
            ElementKind::Ice => self.freeze(target, now)?,
            ElementKind::None => {
                log::debug!("No status effect for element {:?}", element);
                return Ok(None);
            }
        };
        Ok(Some(effect.with_inflicter(inflicter)))
    }

    pub fn freeze(&self, target: TargetId, now: f64) -> Result<StatusEffect, EffectError> {
        StatusEffect::freeze(target, self.defaults.freeze_duration, now)
    }

    pub fn shattered(&self, target: TargetId, now: f64) -> Result<StatusEffect, EffectError> {
        let s = &self.defaults.shattered;
        StatusEffect::shattered(target, s.multiplier, s.duration, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::EffectType;

    #[test]
    fn test_element_mapping() {
        let factory = EffectFactory::default();
        let t = TargetId(7);
        let cases = [
            (ElementKind::Fire, EffectType::Burn),
            (ElementKind::Water, EffectType::Drench),
            (ElementKind::Wind, EffectType::Winded),
            (ElementKind::Ice, EffectType::Freeze),
        ];
        for (element, expected) in cases {
            let effect = factory.create(element, t, Some(TargetId(2)), 1.0).unwrap().unwrap();
            assert_eq!(effect.effect_type(), expected);
            assert_eq!(effect.element(), element);
            assert_eq!(effect.inflicter(), Some(TargetId(2)));
            assert_eq!(effect.started_at(), 1.0);
        }
    }

    #[test]
    fn test_none_element_creates_nothing() {
        let factory = EffectFactory::default();
        assert!(factory.create(ElementKind::None, TargetId(1), None, 0.0).unwrap().is_none());
    }

    #[test]
    fn test_bad_defaults_surface_error() {
        let mut defaults = EffectDefaults::default();
        defaults.burn.duration = -1.0;
        let factory = EffectFactory::new(defaults);
        assert!(factory.create(ElementKind::Fire, TargetId(1), None, 0.0).is_err());
    }

    #[test]
    fn test_burn_defaults() {
        let factory = EffectFactory::default();
        let burn = factory.create(ElementKind::Fire, TargetId(1), None, 0.0).unwrap().unwrap();
        let state = burn.as_burn().unwrap();
        assert_eq!(state.total_ticks(), 10);
        assert_eq!(state.damage_per_tick(), 2.0);
        assert_eq!(factory.shattered(TargetId(1), 0.0).unwrap().shatter_multiplier(), Some(1.25));
    }
}
