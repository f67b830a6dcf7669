//! Elemancy - elemental status effects for game entities
//!
//! Fire burns, water drenches, wind unbalances. Elements on the same
//! target cancel or combine into explosions and flash freezes, and
//! environment hazards cycle through elements on their own.

pub mod ambient;
pub mod data;
pub mod elements;
pub mod sim;
pub mod status;
pub mod target;

// Re-export commonly used types
pub use ambient::{AmbientConfig, AmbientTracker, CycleReport, ElementalProperties, ObjectId, ObjectState};
pub use data::{ConfigError, DataManager, ElementsConfig};
pub use elements::{ElementKind, SynergyKind, SynergyRule, SynergyTable};
pub use status::{EffectFactory, EffectId, EffectManager, EffectType, StatusEffect};
pub use target::{AttackCode, Combatant, Hit, Target, TargetId, TargetResolver, TargetWorld};
