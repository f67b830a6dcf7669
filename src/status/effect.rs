//! Status effect state machine
//!
//! Lifecycle: created -> `apply` -> zero or more `tick`s -> exactly one
//! effective `remove`. A cancelled effect never applies or ticks again.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::elements::ElementKind;
use crate::sim::TIME_EPSILON;
use crate::target::{AttackCode, Hit, Marker, Target, TargetId, VisualError};

/// Manager-assigned identity of an installed effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct EffectId(pub u64);

/// Rejected effect parameters
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EffectError {
    #[error("effect duration must be positive, got {0}")]
    NonPositiveDuration(f64),
    #[error("tick interval must be positive, got {0}")]
    NonPositiveInterval(f64),
    #[error("speed reduction must be within [0, 1), got {0}")]
    InvalidReduction(f64),
    #[error("damage must not be negative, got {0}")]
    NegativeDamage(i32),
    #[error("damage multiplier must be positive, got {0}")]
    InvalidMultiplier(f64),
}

/// The fixed set of effect kinds, without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectType {
    Burn,
    Drench,
    Winded,
    Freeze,
    Shattered,
}

impl EffectType {
    pub fn name(&self) -> &'static str {
        match self {
            EffectType::Burn => "Burn",
            EffectType::Drench => "Drench",
            EffectType::Winded => "Winded",
            EffectType::Freeze => "Freeze",
            EffectType::Shattered => "Shattered",
        }
    }

    pub fn element(&self) -> ElementKind {
        match self {
            EffectType::Burn => ElementKind::Fire,
            EffectType::Drench => ElementKind::Water,
            EffectType::Winded => ElementKind::Wind,
            EffectType::Freeze | EffectType::Shattered => ElementKind::Ice,
        }
    }

    /// Kinds that drive their own visual marker and must not be overridden
    /// by dominant-element reconciliation
    pub fn is_self_managing(&self) -> bool {
        matches!(self, EffectType::Freeze | EffectType::Winded | EffectType::Shattered)
    }

    /// Kinds purged from the target when this kind is applied
    pub fn supersedes(&self) -> &'static [EffectType] {
        match self {
            EffectType::Freeze => &[EffectType::Drench, EffectType::Winded],
            EffectType::Shattered => &[EffectType::Drench, EffectType::Winded, EffectType::Freeze],
            _ => &[],
        }
    }

    fn marker(&self) -> Option<Marker> {
        match self {
            EffectType::Winded => Some(Marker::Winded),
            EffectType::Freeze => Some(Marker::Frozen),
            EffectType::Shattered => Some(Marker::Shattered),
            _ => None,
        }
    }
}

/// Damage over time
#[derive(Debug, Clone, PartialEq)]
pub struct BurnState {
    pub total_damage: i32,
    pub tick_interval: f64,
    total_ticks: u32,
    damage_per_tick: f64,
    last_tick_at: f64,
}

impl BurnState {
    pub fn damage_per_tick(&self) -> f64 {
        self.damage_per_tick
    }

    pub fn total_ticks(&self) -> u32 {
        self.total_ticks
    }

    pub fn last_tick_at(&self) -> f64 {
        self.last_tick_at
    }
}

/// The stat a drench slowed down, with its value before slowing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlowedStat {
    Speed(f32),
    AttackDelay(f32),
}

/// Movement (or attack cadence) debuff
#[derive(Debug, Clone, PartialEq)]
pub struct DrenchState {
    /// Fraction in [0, 1)
    pub reduction: f64,
    original: Option<SlowedStat>,
    applied: bool,
}

/// Hard disable of boss-like attack behavior
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FreezeState {
    original_code: Option<AttackCode>,
    stun_preempted: bool,
    shatter_triggered: bool,
    applied: bool,
}

impl FreezeState {
    /// The target was already dizzy or stunned when frozen
    pub fn stun_preempted(&self) -> bool {
        self.stun_preempted
    }

    pub fn shatter_triggered(&self) -> bool {
        self.shatter_triggered
    }
}

/// Standing damage vulnerability
#[derive(Debug, Clone, PartialEq)]
pub struct ShatteredState {
    pub multiplier: f64,
}

/// Per-kind payload
#[derive(Debug, Clone, PartialEq)]
pub enum EffectKind {
    Burn(BurnState),
    Drench(DrenchState),
    /// Only enables synergies and shows a marker
    Winded,
    Freeze(FreezeState),
    Shattered(ShatteredState),
}

impl EffectKind {
    pub fn effect_type(&self) -> EffectType {
        match self {
            EffectKind::Burn(_) => EffectType::Burn,
            EffectKind::Drench(_) => EffectType::Drench,
            EffectKind::Winded => EffectType::Winded,
            EffectKind::Freeze(_) => EffectType::Freeze,
            EffectKind::Shattered(_) => EffectType::Shattered,
        }
    }
}

/// A timed modifier on one target
#[derive(Debug, Clone)]
pub struct StatusEffect {
    pub(crate) id: EffectId,
    target: TargetId,
    inflicter: Option<TargetId>,
    duration: f64,
    started_at: f64,
    active: bool,
    cancelled: bool,
    removed: bool,
    ticks: u32,
    kind: EffectKind,
}

impl StatusEffect {
    fn new(target: TargetId, kind: EffectKind, duration: f64, now: f64) -> Result<Self, EffectError> {
        if !(duration > 0.0) || !duration.is_finite() {
            return Err(EffectError::NonPositiveDuration(duration));
        }
        Ok(Self {
            id: EffectId::default(),
            target,
            inflicter: None,
            duration,
            started_at: now,
            active: true,
            cancelled: false,
            removed: false,
            ticks: 0,
            kind,
        })
    }

    pub fn burn(
        target: TargetId,
        total_damage: i32,
        duration: f64,
        tick_interval: f64,
        now: f64,
    ) -> Result<Self, EffectError> {
        if total_damage < 0 {
            return Err(EffectError::NegativeDamage(total_damage));
        }
        if !(tick_interval > 0.0) || !tick_interval.is_finite() {
            return Err(EffectError::NonPositiveInterval(tick_interval));
        }
        let total_ticks = ((duration / tick_interval).round() as u32).max(1);
        let state = BurnState {
            total_damage,
            tick_interval,
            total_ticks,
            damage_per_tick: total_damage as f64 / total_ticks as f64,
            last_tick_at: now,
        };
        Self::new(target, EffectKind::Burn(state), duration, now)
    }

    pub fn drench(target: TargetId, reduction: f64, duration: f64, now: f64) -> Result<Self, EffectError> {
        if !(0.0..1.0).contains(&reduction) {
            return Err(EffectError::InvalidReduction(reduction));
        }
        let state = DrenchState {
            reduction,
            original: None,
            applied: false,
        };
        Self::new(target, EffectKind::Drench(state), duration, now)
    }

    pub fn winded(target: TargetId, duration: f64, now: f64) -> Result<Self, EffectError> {
        Self::new(target, EffectKind::Winded, duration, now)
    }

    pub fn freeze(target: TargetId, duration: f64, now: f64) -> Result<Self, EffectError> {
        Self::new(target, EffectKind::Freeze(FreezeState::default()), duration, now)
    }

    pub fn shattered(target: TargetId, multiplier: f64, duration: f64, now: f64) -> Result<Self, EffectError> {
        if !(multiplier > 0.0) || !multiplier.is_finite() {
            return Err(EffectError::InvalidMultiplier(multiplier));
        }
        Self::new(target, EffectKind::Shattered(ShatteredState { multiplier }), duration, now)
    }

    /// Credit damage caused by this effect to `inflicter`
    pub fn with_inflicter(mut self, inflicter: Option<TargetId>) -> Self {
        self.inflicter = inflicter;
        self
    }

    /// Manager-assigned id, `EffectId(0)` until installed
    pub fn id(&self) -> EffectId {
        self.id
    }

    /// The affected target
    pub fn target(&self) -> TargetId {
        self.target
    }

    /// Who applied the effect
    pub fn inflicter(&self) -> Option<TargetId> {
        self.inflicter
    }

    pub fn element(&self) -> ElementKind {
        self.effect_type().element()
    }

    pub fn effect_type(&self) -> EffectType {
        self.kind.effect_type()
    }

    pub fn name(&self) -> &'static str {
        self.effect_type().name()
    }

    pub fn kind(&self) -> &EffectKind {
        &self.kind
    }

    /// Lifetime in seconds
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// When the effect was created
    pub fn started_at(&self) -> f64 {
        self.started_at
    }

    /// Burn ticks delivered so far
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Still applied to its target
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Cancelled by a synergy or manager removal
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Seconds since creation
    pub fn elapsed(&self, now: f64) -> f64 {
        (now - self.started_at).max(0.0)
    }

    pub fn remaining(&self, now: f64) -> f64 {
        (self.duration - self.elapsed(now)).max(0.0)
    }

    /// Check if the effect should be retired at `now`
    pub fn is_expired(&self, now: f64) -> bool {
        !self.active || self.elapsed(now) + TIME_EPSILON >= self.duration
    }

    /// Mark the effect dead. It will never apply or tick again.
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.active = false;
    }

    pub fn as_burn(&self) -> Option<&BurnState> {
        match &self.kind {
            EffectKind::Burn(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_freeze(&self) -> Option<&FreezeState> {
        match &self.kind {
            EffectKind::Freeze(state) => Some(state),
            _ => None,
        }
    }

    pub fn shatter_multiplier(&self) -> Option<f64> {
        match &self.kind {
            EffectKind::Shattered(state) => Some(state.multiplier),
            _ => None,
        }
    }

    /// Freeze only: consume the one-shot shatter. Returns false if already spent.
    pub(crate) fn trigger_shatter(&mut self) -> bool {
        match &mut self.kind {
            EffectKind::Freeze(state) if !state.shatter_triggered => {
                state.shatter_triggered = true;
                true
            }
            _ => false,
        }
    }

    /// Damage a fire + wind explosion would release right now: the burn
    /// ticks left in the remaining duration
    pub fn remaining_burn_damage(&self, now: f64) -> i32 {
        let Some(burn) = self.as_burn() else {
            return 0;
        };
        let remaining_ticks = ((self.duration - self.elapsed(now)) / burn.tick_interval + TIME_EPSILON)
            .floor()
            .max(0.0);
        (remaining_ticks * burn.damage_per_tick).floor() as i32
    }

    /// Apply the effect's side effects to the target
    pub fn apply(&mut self, target: &mut dyn Target) -> Result<(), VisualError> {
        if self.cancelled || self.removed {
            return Ok(());
        }
        match &mut self.kind {
            EffectKind::Drench(state) if !state.applied => {
                let factor = 1.0 - state.reduction as f32;
                if let Some(delay) = target.attack_delay() {
                    state.original = Some(SlowedStat::AttackDelay(delay));
                    target.set_attack_delay(delay / factor);
                } else if let Some(speed) = target.speed() {
                    state.original = Some(SlowedStat::Speed(speed));
                    target.set_speed(speed * factor);
                }
                state.applied = true;
            }
            EffectKind::Freeze(state) if !state.applied => {
                if let Some(code) = target.attack_code() {
                    state.original_code = Some(code);
                    state.stun_preempted = code.is_disabled();
                    target.set_attack_code(AttackCode::Frozen);
                }
                state.applied = true;
            }
            _ => {}
        }
        log::debug!("{} applied to {}", self.name(), self.target);
        match self.effect_type().marker() {
            Some(marker) => target.set_marker(marker, true),
            None => Ok(()),
        }
    }

    /// Advance the effect to `now`. Returns the damage dealt.
    pub fn tick(&mut self, now: f64, target: &mut dyn Target) -> i32 {
        if self.cancelled || self.removed {
            return 0;
        }
        let window = self.elapsed(now).min(self.duration);
        let inflicter = self.inflicter;
        let mut dealt = 0;
        if let EffectKind::Burn(burn) = &mut self.kind {
            let due = ((window / burn.tick_interval + 1e-6).floor() as u32).min(burn.total_ticks);
            let per_hit = burn.damage_per_tick.floor() as i32;
            while self.ticks < due {
                target.take_damage(Hit::direct(per_hit, inflicter));
                self.ticks += 1;
                burn.last_tick_at = self.started_at + self.ticks as f64 * burn.tick_interval;
                dealt += per_hit;
            }
        }
        dealt
    }

    /// Undo the effect's side effects. Only the first call does anything.
    pub fn remove(&mut self, target: &mut dyn Target) -> Result<(), VisualError> {
        if self.removed {
            return Ok(());
        }
        self.removed = true;
        self.active = false;
        match &mut self.kind {
            EffectKind::Drench(state) if state.applied => {
                match state.original {
                    Some(SlowedStat::AttackDelay(delay)) => target.set_attack_delay(delay),
                    Some(SlowedStat::Speed(speed)) => target.set_speed(speed),
                    None => {}
                }
                state.applied = false;
            }
            EffectKind::Freeze(state) if state.applied => {
                if let Some(original) = state.original_code {
                    // Something newer owns the attack code if we are no longer frozen
                    if target.attack_code() == Some(AttackCode::Frozen) {
                        let restored = if original.is_disabled() {
                            AttackCode::NoAttack
                        } else {
                            original
                        };
                        target.set_attack_code(restored);
                    }
                }
                state.applied = false;
            }
            _ => {}
        }
        log::debug!("{} removed from {}", self.name(), self.target);
        match self.effect_type().marker() {
            Some(marker) => target.set_marker(marker, false),
            None => Ok(()),
        }
    }

    pub fn snapshot(&self, now: f64) -> EffectSnapshot {
        EffectSnapshot {
            id: self.id,
            effect: self.effect_type(),
            element: self.element(),
            remaining: self.remaining(now),
            ticks: self.ticks,
            inflicter: self.inflicter,
        }
    }
}

/// Serializable view of an active effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSnapshot {
    pub id: EffectId,
    pub effect: EffectType,
    pub element: ElementKind,
    pub remaining: f64,
    pub ticks: u32,
    pub inflicter: Option<TargetId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Combatant;

    const T: TargetId = TargetId(1);

    #[test]
    fn test_rejects_bad_parameters() {
        assert_eq!(StatusEffect::winded(T, 0.0, 0.0).unwrap_err(), EffectError::NonPositiveDuration(0.0));
        assert!(matches!(StatusEffect::burn(T, 20, 5.0, 0.0, 0.0), Err(EffectError::NonPositiveInterval(_))));
        assert!(matches!(StatusEffect::burn(T, -1, 5.0, 0.5, 0.0), Err(EffectError::NegativeDamage(-1))));
        assert!(matches!(StatusEffect::drench(T, 1.0, 5.0, 0.0), Err(EffectError::InvalidReduction(_))));
        assert!(matches!(StatusEffect::shattered(T, 0.0, 5.0, 0.0), Err(EffectError::InvalidMultiplier(_))));
    }

    #[test]
    fn test_burn_delivers_full_damage() {
        let mut dummy = Combatant::new("dummy", 100);
        let mut burn = StatusEffect::burn(T, 20, 5.0, 0.5, 0.0).unwrap();
        burn.apply(&mut dummy).unwrap();

        let mut now = 0.0;
        for _ in 0..50 {
            now += 0.1;
            burn.tick(now, &mut dummy);
        }
        assert_eq!(burn.ticks(), 10);
        assert_eq!(dummy.damage_taken(), 20);
        assert!(dummy.hits.iter().all(|h| h.amount == 2));

        // Nothing more after the lifetime is spent
        burn.tick(9.0, &mut dummy);
        assert_eq!(burn.ticks(), 10);
    }

    #[test]
    fn test_burn_ticks_once_per_interval() {
        let mut dummy = Combatant::new("dummy", 100);
        let mut burn = StatusEffect::burn(T, 20, 5.0, 0.5, 0.0).unwrap();
        assert_eq!(burn.tick(0.3, &mut dummy), 0);
        assert_eq!(burn.tick(0.5, &mut dummy), 2);
        assert_eq!(burn.tick(0.7, &mut dummy), 0);
        assert!((burn.as_burn().unwrap().last_tick_at() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_remaining_burn_damage() {
        let burn = StatusEffect::burn(T, 20, 5.0, 0.5, 0.0).unwrap();
        assert_eq!(burn.remaining_burn_damage(0.0), 20);
        assert_eq!(burn.remaining_burn_damage(0.5), 18);
        assert_eq!(burn.remaining_burn_damage(6.0), 0);
    }

    #[test]
    fn test_drench_slows_and_restores_once() {
        let mut runner = Combatant::new("runner", 50).with_speed(10.0);
        let mut drench = StatusEffect::drench(T, 0.5, 5.0, 0.0).unwrap();

        drench.apply(&mut runner).unwrap();
        assert_eq!(runner.speed, Some(5.0));
        // A repeated apply must not capture the slowed value
        drench.apply(&mut runner).unwrap();
        assert_eq!(runner.speed, Some(5.0));

        drench.remove(&mut runner).unwrap();
        assert_eq!(runner.speed, Some(10.0));

        runner.speed = Some(7.0);
        drench.remove(&mut runner).unwrap();
        assert_eq!(runner.speed, Some(7.0));
    }

    #[test]
    fn test_drench_lengthens_attack_delay() {
        let mut boss = Combatant::new("boss", 500).with_speed(3.0).with_attack(AttackCode::Attack(2), 2.0);
        let mut drench = StatusEffect::drench(T, 0.5, 5.0, 0.0).unwrap();
        drench.apply(&mut boss).unwrap();
        assert_eq!(boss.attack.unwrap().delay, 4.0);
        assert_eq!(boss.speed, Some(3.0));
        drench.remove(&mut boss).unwrap();
        assert_eq!(boss.attack.unwrap().delay, 2.0);
    }

    #[test]
    fn test_freeze_restores_attack_code() {
        let mut boss = Combatant::new("boss", 500).with_attack(AttackCode::Attack(4), 2.0);
        let mut freeze = StatusEffect::freeze(T, 3.0, 0.0).unwrap();
        freeze.apply(&mut boss).unwrap();
        assert_eq!(boss.attack_code(), Some(AttackCode::Frozen));
        assert!(boss.visual.has_marker(Marker::Frozen));

        freeze.remove(&mut boss).unwrap();
        assert_eq!(boss.attack_code(), Some(AttackCode::Attack(4)));
        assert!(!boss.visual.has_marker(Marker::Frozen));
    }

    #[test]
    fn test_freeze_never_restores_stun() {
        let mut boss = Combatant::new("boss", 500).with_attack(AttackCode::Dizzy, 2.0);
        let mut freeze = StatusEffect::freeze(T, 3.0, 0.0).unwrap();
        freeze.apply(&mut boss).unwrap();
        assert!(freeze.as_freeze().unwrap().stun_preempted());

        freeze.remove(&mut boss).unwrap();
        assert_eq!(boss.attack_code(), Some(AttackCode::NoAttack));
    }

    #[test]
    fn test_freeze_leaves_newer_code_alone() {
        let mut boss = Combatant::new("boss", 500).with_attack(AttackCode::Attack(1), 2.0);
        let mut freeze = StatusEffect::freeze(T, 3.0, 0.0).unwrap();
        freeze.apply(&mut boss).unwrap();
        boss.set_attack_code(AttackCode::Attack(9));

        freeze.remove(&mut boss).unwrap();
        assert_eq!(boss.attack_code(), Some(AttackCode::Attack(9)));
    }

    #[test]
    fn test_cancelled_effect_is_inert() {
        let mut dummy = Combatant::new("dummy", 100);
        let mut burn = StatusEffect::burn(T, 20, 5.0, 0.5, 0.0).unwrap();
        burn.cancel();
        assert!(burn.is_expired(0.0));
        assert_eq!(burn.tick(3.0, &mut dummy), 0);
        assert!(dummy.hits.is_empty());
    }

    #[test]
    fn test_shatter_triggers_once() {
        let mut freeze = StatusEffect::freeze(T, 3.0, 0.0).unwrap();
        assert!(freeze.trigger_shatter());
        assert!(!freeze.trigger_shatter());
        assert!(freeze.as_freeze().unwrap().shatter_triggered());
    }

    #[test]
    fn test_self_managing_kinds() {
        assert!(EffectType::Winded.is_self_managing());
        assert!(!EffectType::Burn.is_self_managing());
        assert_eq!(EffectType::Freeze.supersedes(), &[EffectType::Drench, EffectType::Winded]);
        assert_eq!(EffectType::Burn.element(), ElementKind::Fire);
    }
}
