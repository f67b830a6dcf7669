//! Target capabilities
//!
//! The effect engine never sees concrete entity types. Hosts expose their
//! entities through the [`Target`] trait and look them up via a [`TargetResolver`].

pub mod combatant;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::elements::ElementKind;

pub use combatant::{AttackProfile, Combatant, Health, TargetWorld, VisualState};

/// Opaque identifier of a tracked entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetId(pub u64);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single delivery of damage through the damage contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hit {
    pub amount: i32,
    /// Who gets credit for the damage
    pub inflicter: Option<TargetId>,
    pub is_dot: bool,
}

impl Hit {
    pub fn direct(amount: i32, inflicter: Option<TargetId>) -> Self {
        Self { amount, inflicter, is_dot: false }
    }

    pub fn dot(amount: i32, inflicter: Option<TargetId>) -> Self {
        Self { amount, inflicter, is_dot: true }
    }
}

/// Discrete behavioral state of boss-like targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AttackCode {
    #[default]
    NoAttack,
    /// A boss-specific attack pattern
    Attack(u16),
    Dizzy,
    Stunned,
    Frozen,
}

impl AttackCode {
    /// Dizzy and stunned codes; a thaw must never restore into one of these
    pub fn is_disabled(&self) -> bool {
        matches!(self, AttackCode::Dizzy | AttackCode::Stunned)
    }
}

/// Visual markers owned by self-managing effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Marker {
    Winded,
    Frozen,
    Shattered,
}

/// Failure reported by the visual layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VisualError {
    #[error("visual update rejected: {0}")]
    Rejected(String),
}

/// Capabilities an entity exposes to the effect engine.
///
/// Getters return `None` when the entity lacks the capability; the matching
/// setter is then never called by the engine.
pub trait Target {
    fn take_damage(&mut self, hit: Hit);

    fn speed(&self) -> Option<f32>;
    fn set_speed(&mut self, speed: f32);

    fn attack_delay(&self) -> Option<f32>;
    fn set_attack_delay(&mut self, delay: f32);

    fn attack_code(&self) -> Option<AttackCode>;
    fn set_attack_code(&mut self, code: AttackCode);

    fn set_dominant_visual(&mut self, element: ElementKind) -> Result<(), VisualError>;
    fn clear_visual(&mut self) -> Result<(), VisualError>;
    fn set_marker(&mut self, marker: Marker, active: bool) -> Result<(), VisualError>;
}

/// In-memory lookup from id to a live target
pub trait TargetResolver {
    /// `None` means the target no longer exists
    fn resolve(&mut self, id: TargetId) -> Option<&mut dyn Target>;
}

impl<T: Target> TargetResolver for HashMap<TargetId, T> {
    fn resolve(&mut self, id: TargetId) -> Option<&mut dyn Target> {
        self.get_mut(&id).map(|t| t as &mut dyn Target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_codes() {
        assert!(AttackCode::Dizzy.is_disabled());
        assert!(AttackCode::Stunned.is_disabled());
        assert!(!AttackCode::Frozen.is_disabled());
        assert!(!AttackCode::Attack(3).is_disabled());
        assert!(!AttackCode::NoAttack.is_disabled());
    }

    #[test]
    fn test_map_resolver() {
        let mut targets = HashMap::new();
        targets.insert(TargetId(1), Combatant::new("dummy", 100).with_speed(4.0));

        assert!(targets.resolve(TargetId(2)).is_none());
        let target = targets.resolve(TargetId(1)).unwrap();
        target.take_damage(Hit::direct(10, None));
        assert_eq!(targets[&TargetId(1)].health.current, 90);
    }
}
