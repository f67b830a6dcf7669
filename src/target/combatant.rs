//! Concrete target adapter
//!
//! `Combatant` is a plain component implementing [`Target`]; `TargetWorld`
//! stores them in a `hecs::World` so lookups by id stay O(1) and survive despawns.

use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

use crate::elements::ElementKind;
use super::{AttackCode, Hit, Marker, Target, TargetId, TargetResolver, VisualError};

/// Health pool
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

impl Health {
    pub fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let actual = amount.clamp(0, self.current.max(0));
        self.current -= actual;
        actual
    }
}

/// Attack behavior of boss-like targets
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AttackProfile {
    pub code: AttackCode,
    /// Seconds between attacks
    pub delay: f32,
}

/// What the visual layer currently shows for a combatant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualState {
    pub dominant: Option<ElementKind>,
    pub markers: Vec<Marker>,
}

impl VisualState {
    pub fn has_marker(&self, marker: Marker) -> bool {
        self.markers.contains(&marker)
    }
}

/// A damageable entity with optional movement and attack capabilities
#[derive(Debug, Clone)]
pub struct Combatant {
    pub name: String,
    pub health: Health,
    pub speed: Option<f32>,
    pub attack: Option<AttackProfile>,
    pub visual: VisualState,
    /// Whether the visual layer accepts updates
    pub visual_online: bool,
    /// Every hit received, in order
    pub hits: Vec<Hit>,
}

impl Combatant {
    pub fn new(name: impl Into<String>, max_hp: i32) -> Self {
        Self {
            name: name.into(),
            health: Health::new(max_hp),
            speed: None,
            attack: None,
            visual: VisualState::default(),
            visual_online: true,
            hits: Vec::new(),
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_attack(mut self, code: AttackCode, delay: f32) -> Self {
        self.attack = Some(AttackProfile { code, delay });
        self
    }

    /// Total damage received
    pub fn damage_taken(&self) -> i32 {
        self.hits.iter().map(|h| h.amount).sum()
    }

    /// Total damage credited to one inflicter
    pub fn damage_from(&self, inflicter: TargetId) -> i32 {
        self.hits
            .iter()
            .filter(|h| h.inflicter == Some(inflicter))
            .map(|h| h.amount)
            .sum()
    }

    fn check_visual(&self) -> Result<(), VisualError> {
        if self.visual_online {
            Ok(())
        } else {
            Err(VisualError::Rejected(format!("{} has no visual layer", self.name)))
        }
    }
}

impl Target for Combatant {
    fn take_damage(&mut self, hit: Hit) {
        self.health.take_damage(hit.amount);
        self.hits.push(hit);
    }

    fn speed(&self) -> Option<f32> {
        self.speed
    }

    fn set_speed(&mut self, speed: f32) {
        if self.speed.is_some() {
            self.speed = Some(speed);
        }
    }

    fn attack_delay(&self) -> Option<f32> {
        self.attack.map(|a| a.delay)
    }

    fn set_attack_delay(&mut self, delay: f32) {
        if let Some(attack) = &mut self.attack {
            attack.delay = delay;
        }
    }

    fn attack_code(&self) -> Option<AttackCode> {
        self.attack.map(|a| a.code)
    }

    fn set_attack_code(&mut self, code: AttackCode) {
        if let Some(attack) = &mut self.attack {
            attack.code = code;
        }
    }

    fn set_dominant_visual(&mut self, element: ElementKind) -> Result<(), VisualError> {
        self.check_visual()?;
        self.visual.dominant = Some(element);
        Ok(())
    }

    fn clear_visual(&mut self) -> Result<(), VisualError> {
        self.check_visual()?;
        self.visual.dominant = None;
        Ok(())
    }

    fn set_marker(&mut self, marker: Marker, active: bool) -> Result<(), VisualError> {
        self.check_visual()?;
        if active {
            if !self.visual.has_marker(marker) {
                self.visual.markers.push(marker);
            }
        } else {
            self.visual.markers.retain(|m| *m != marker);
        }
        Ok(())
    }
}

/// Combatants stored in an ECS world, addressed by [`TargetId`]
#[derive(Default)]
pub struct TargetWorld {
    world: World,
}

impl TargetWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, combatant: Combatant) -> TargetId {
        let entity = self.world.spawn((combatant,));
        TargetId(entity.to_bits().get())
    }

    /// Remove a combatant. Returns false if it was already gone.
    pub fn despawn(&mut self, id: TargetId) -> bool {
        match Self::entity(id) {
            Some(entity) => self.world.despawn(entity).is_ok(),
            None => false,
        }
    }

    pub fn get(&self, id: TargetId) -> Option<hecs::Ref<'_, Combatant>> {
        Self::entity(id).and_then(|e| self.world.get::<&Combatant>(e).ok())
    }

    pub fn get_mut(&mut self, id: TargetId) -> Option<&mut Combatant> {
        let entity = Self::entity(id)?;
        self.world.query_one_mut::<&mut Combatant>(entity).ok()
    }

    pub fn len(&self) -> usize {
        self.world.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.world.is_empty()
    }

    fn entity(id: TargetId) -> Option<Entity> {
        Entity::from_bits(id.0)
    }
}

impl TargetResolver for TargetWorld {
    fn resolve(&mut self, id: TargetId) -> Option<&mut dyn Target> {
        self.get_mut(id).map(|c| c as &mut dyn Target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_clamps() {
        let mut health = Health::new(10);
        assert_eq!(health.take_damage(4), 4);
        assert_eq!(health.take_damage(20), 6);
        assert!(health.is_dead());
        assert_eq!(health.take_damage(5), 0);
    }

    #[test]
    fn test_setters_ignore_missing_capabilities() {
        let mut dummy = Combatant::new("dummy", 50);
        dummy.set_speed(3.0);
        dummy.set_attack_code(AttackCode::Frozen);
        assert_eq!(dummy.speed(), None);
        assert_eq!(dummy.attack_code(), None);
    }

    #[test]
    fn test_offline_visual_layer_errors() {
        let mut dummy = Combatant::new("dummy", 50);
        dummy.visual_online = false;
        assert!(dummy.set_dominant_visual(ElementKind::Fire).is_err());
        assert!(dummy.set_marker(Marker::Frozen, true).is_err());
        assert_eq!(dummy.visual, VisualState::default());
    }

    #[test]
    fn test_world_resolves_until_despawn() {
        let mut world = TargetWorld::new();
        let boss = world.spawn(Combatant::new("boss", 500).with_attack(AttackCode::Attack(1), 2.0));
        assert_eq!(world.len(), 1);

        world.resolve(boss).unwrap().take_damage(Hit::direct(25, None));
        assert_eq!(world.get(boss).unwrap().health.current, 475);

        assert!(world.despawn(boss));
        assert!(world.resolve(boss).is_none());
        assert!(!world.despawn(boss));
        assert!(world.resolve(TargetId(0)).is_none());
    }
}
