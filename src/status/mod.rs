//! Elemental status effects
//!
//! Burn, drench, winded, freeze and shattered effects, the factory that
//! builds them, and the manager that resolves their synergies.

pub mod effect;
pub mod factory;
pub mod manager;
pub mod reactions;


pub use effect::{EffectError, EffectId, EffectKind, EffectSnapshot, EffectType, SlowedStat, StatusEffect};
pub use factory::{BurnParams, DrenchParams, EffectDefaults, EffectFactory, ShatteredParams};
pub use manager::{dominant_element, EffectManager, ManagerSettings, TargetSnapshot};
pub use reactions::Reaction;
