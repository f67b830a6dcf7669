//! Effect manager
//!
//! Owns every active status effect, keyed by target. New effects are
//! checked against the target's existing ones (cancellations and delayed
//! reactions), a repeating sweep ticks and expires them, and the visible
//! element indicator is reconciled after every mutation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::elements::{ElementKind, SynergyKind, SynergyTable};
use crate::sim::{Clock, Scheduler, Token};
use crate::target::{Hit, Target, TargetId, TargetResolver};
use super::effect::{EffectId, EffectSnapshot, EffectType, StatusEffect};
use super::factory::EffectFactory;
use super::reactions::Reaction;

/// Tunables for the manager and its reactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerSettings {
    /// Seconds between tick sweeps
    pub sweep_interval: f64,
    /// Delay before a positive synergy resolves
    pub reaction_delay: f64,
    /// Flat hit dealt by a fire + wind explosion
    pub explosion_damage: i32,
    /// Multiplier on the hit that shatters a frozen target
    pub freeze_shatter_multiplier: f64,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            sweep_interval: 0.1,
            reaction_delay: 0.5,
            explosion_damage: 35,
            freeze_shatter_multiplier: 1.5,
        }
    }
}

/// Work items on the manager's scheduler
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Job {
    Sweep,
    Reaction(Reaction),
}

/// Serializable view of one tracked target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSnapshot {
    pub target: TargetId,
    pub effects: Vec<EffectSnapshot>,
}

/// Tracks status effects for every target and resolves their synergies
pub struct EffectManager<R> {
    pub(super) resolver: R,
    pub(super) clock: Clock,
    pub(super) scheduler: Scheduler<Job>,
    pub(super) synergies: SynergyTable,
    pub(super) factory: EffectFactory,
    pub(super) settings: ManagerSettings,
    /// Insertion order per target is application order. Never holds an empty list.
    pub(super) effects: HashMap<TargetId, Vec<StatusEffect>>,
    enabled: bool,
    sweep_token: Option<Token>,
    pub(super) next_effect_id: u64,
}

impl<R: TargetResolver> EffectManager<R> {
    /// Create a disabled manager. Call [`EffectManager::enable`] to start it.
    pub fn new(resolver: R, synergies: SynergyTable, factory: EffectFactory, settings: ManagerSettings) -> Self {
        Self {
            resolver,
            clock: Clock::new(),
            scheduler: Scheduler::new(),
            synergies,
            factory,
            settings,
            effects: HashMap::new(),
            enabled: false,
            sweep_token: None,
            next_effect_id: 1,
        }
    }

    /// Stock synergy rules, effect parameters and settings
    pub fn with_defaults(resolver: R) -> Self {
        Self::new(
            resolver,
            SynergyTable::with_defaults(),
            EffectFactory::default(),
            ManagerSettings::default(),
        )
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start the repeating sweep
    pub fn enable(&mut self) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        let token = self
            .scheduler
            .run_every(self.clock.now(), self.settings.sweep_interval, Job::Sweep);
        self.sweep_token = Some(token);
        log::info!("Effect manager enabled (sweep every {:.2}s)", self.settings.sweep_interval);
    }

    /// Stop the sweep, drop pending reactions and remove every active effect
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        if let Some(token) = self.sweep_token.take() {
            self.scheduler.cancel(token);
        }
        self.scheduler.clear();

        let mut removed = 0;
        for (target_id, mut list) in std::mem::take(&mut self.effects) {
            let Some(target) = self.resolver.resolve(target_id) else {
                continue;
            };
            removed += remove_where(target_id, &mut list, target, |_| true);
            reconcile_visuals(target_id, &list, target);
        }
        log::info!("Effect manager disabled, removed {} effects", removed);
    }

    /// Whether the sweep is running and new effects are accepted
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Advance simulation time and run every job that falls due, each at its own timestamp
    pub fn update(&mut self, delta_secs: f64) {
        let until = self.clock.now() + delta_secs.max(0.0);
        while let Some(fired) = self.scheduler.pop_due(until) {
            self.clock.advance_to(fired.at);
            match fired.job {
                Job::Sweep => self.sweep(),
                Job::Reaction(reaction) => self.run_reaction(reaction),
            }
        }
        self.clock.advance_to(until);
    }

    /// Current simulation time
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Get the manager settings
    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    /// Get the synergy table
    pub fn synergies(&self) -> &SynergyTable {
        &self.synergies
    }

    /// Get the effect factory
    pub fn factory(&self) -> &EffectFactory {
        &self.factory
    }

    /// Get the target resolver
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Get the target resolver mutably
    pub fn resolver_mut(&mut self) -> &mut R {
        &mut self.resolver
    }

    // =========================================================================
    // Apply path
    // =========================================================================

    /// Build the effect for `element` and apply it. See [`EffectManager::apply_effect`].
    pub fn apply_element(
        &mut self,
        target_id: TargetId,
        element: ElementKind,
        inflicter: Option<TargetId>,
    ) -> Option<EffectId> {
        match self.factory.create(element, target_id, inflicter, self.clock.now()) {
            Ok(Some(effect)) => self.apply_effect(target_id, effect),
            Ok(None) => None,
            Err(e) => {
                log::warn!("Could not build {:?} effect for {}: {}", element, target_id, e);
                None
            }
        }
    }

    /// Resolve `effect` against the target's current effects and install it
    /// unless it was cancelled. Returns the id of the installed effect.
    pub fn apply_effect(&mut self, target_id: TargetId, mut effect: StatusEffect) -> Option<EffectId> {
        if !self.enabled {
            log::debug!("Ignoring {} on {}: manager disabled", effect.name(), target_id);
            return None;
        }
        let now = self.clock.now();
        let Some(target) = self.resolver.resolve(target_id) else {
            self.effects.remove(&target_id);
            return None;
        };
        effect.id = allocate_id(&mut self.next_effect_id);
        let list = self.effects.entry(target_id).or_default();
        let mut removed_any = false;

        // Fire always breaks ice
        if effect.effect_type() == EffectType::Burn {
            removed_any |= remove_where(target_id, list, target, |e| e.effect_type() == EffectType::Freeze) > 0;
        }

        let new_element = effect.element();
        let existing: Vec<(EffectId, ElementKind, Option<TargetId>)> = list
            .iter()
            .map(|e| (e.id(), e.element(), e.inflicter()))
            .collect();
        let mut reactions = Vec::new();

        for (existing_id, existing_element, existing_inflicter) in existing {
            if !list.iter().any(|e| e.id() == existing_id) {
                continue;
            }
            match self.synergies.kind_of(new_element, existing_element) {
                SynergyKind::Negative => {
                    if (new_element, existing_element) == (ElementKind::Fire, ElementKind::Water) {
                        log::debug!("Water on {} smothers incoming fire", target_id);
                        effect.cancel();
                        break;
                    }
                    log::debug!("{:?} cancels {:?} on {}", new_element, existing_element, target_id);
                    removed_any |= remove_where(target_id, list, target, |e| e.id() == existing_id) > 0;
                }
                SynergyKind::Positive => {
                    let reaction = Reaction::between(
                        target_id,
                        (effect.id(), new_element, effect.inflicter()),
                        (existing_id, existing_element, existing_inflicter),
                    );
                    match reaction {
                        Some(reaction) => reactions.push(reaction),
                        None => log::debug!(
                            "No reaction defined for {:?} + {:?}",
                            new_element,
                            existing_element
                        ),
                    }
                }
                SynergyKind::Neutral => {}
            }
        }

        // Reactions found before a cancellation still go off
        for reaction in reactions {
            log::debug!("Scheduling {:?} on {} in {:.2}s", reaction, target_id, self.settings.reaction_delay);
            self.scheduler
                .run_once_after(now, self.settings.reaction_delay, Job::Reaction(reaction));
        }

        if effect.is_cancelled() {
            if removed_any {
                reconcile_visuals(target_id, list, target);
            }
            if list.is_empty() {
                self.effects.remove(&target_id);
            }
            return None;
        }

        let id = install(target_id, list, target, effect);
        reconcile_visuals(target_id, list, target);
        Some(id)
    }

    // =========================================================================
    // Removal & queries
    // =========================================================================

    /// Remove every effect of `kind` from the target. Returns how many were removed.
    pub fn remove_effects_by_type(&mut self, target_id: TargetId, kind: EffectType) -> usize {
        self.remove_matching(target_id, |e| e.effect_type() == kind)
    }

    /// Remove one effect by id. Returns false if it is not (or no longer) present.
    pub fn remove_effect(&mut self, target_id: TargetId, id: EffectId) -> bool {
        self.remove_matching(target_id, |e| e.id() == id) > 0
    }

    pub(super) fn remove_matching(
        &mut self,
        target_id: TargetId,
        pred: impl FnMut(&StatusEffect) -> bool,
    ) -> usize {
        let Some(list) = self.effects.get_mut(&target_id) else {
            return 0;
        };
        let Some(target) = self.resolver.resolve(target_id) else {
            self.effects.remove(&target_id);
            return 0;
        };
        let removed = remove_where(target_id, list, target, pred);
        if removed > 0 {
            reconcile_visuals(target_id, list, target);
        }
        if list.is_empty() {
            self.effects.remove(&target_id);
        }
        removed
    }

    /// Check if the target has any effect of `kind`, active or not
    pub fn has_effect_type(&self, target_id: TargetId, kind: EffectType) -> bool {
        self.get_effects_on_target(target_id)
            .iter()
            .any(|e| e.effect_type() == kind)
    }

    /// Effects on the target in application order
    pub fn get_effects_on_target(&self, target_id: TargetId) -> &[StatusEffect] {
        self.effects.get(&target_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check if the target has an active effect of `kind`
    pub fn has_active_effect(&self, target_id: TargetId, kind: EffectType) -> bool {
        self.get_active_effect(target_id, kind).is_some()
    }

    /// First non-cancelled, still active effect of `kind`
    pub fn get_active_effect(&self, target_id: TargetId, kind: EffectType) -> Option<&StatusEffect> {
        self.get_effects_on_target(target_id)
            .iter()
            .find(|e| e.effect_type() == kind && e.is_active() && !e.is_cancelled())
    }

    /// Check if the target has any effects
    pub fn is_tracked(&self, target_id: TargetId) -> bool {
        self.effects.contains_key(&target_id)
    }

    /// Number of targets with at least one effect
    pub fn tracked_targets(&self) -> usize {
        self.effects.len()
    }

    /// Reactions waiting on the scheduler
    pub fn pending_reactions(&self) -> usize {
        self.scheduler
            .jobs()
            .filter(|job| matches!(job, Job::Reaction(_)))
            .count()
    }

    /// Per-target summary, ordered by target id
    pub fn snapshot(&self) -> Vec<TargetSnapshot> {
        let now = self.clock.now();
        let mut targets: Vec<TargetSnapshot> = self
            .effects
            .iter()
            .map(|(target, list)| TargetSnapshot {
                target: *target,
                effects: list.iter().map(|e| e.snapshot(now)).collect(),
            })
            .collect();
        targets.sort_by_key(|t| t.target);
        targets
    }

    // =========================================================================
    // Sweep
    // =========================================================================

    /// Tick every active effect and retire expired ones
    pub fn sweep(&mut self) {
        let now = self.clock.now();
        let ids: Vec<TargetId> = self.effects.keys().copied().collect();

        for target_id in ids {
            let Some(target) = self.resolver.resolve(target_id) else {
                log::debug!("{} is gone, dropping its effects", target_id);
                self.effects.remove(&target_id);
                continue;
            };
            let Some(list) = self.effects.get_mut(&target_id) else {
                continue;
            };

            let mut removed_any = false;
            let mut i = 0;
            while i < list.len() {
                let effect = &mut list[i];
                if effect.is_expired(now) {
                    if effect.is_active() {
                        // Settle ticks owed up to the end of the duration
                        effect.tick(now, target);
                    }
                    if let Err(e) = effect.remove(target) {
                        log::warn!("Visual cleanup for expired {} on {} failed: {}", effect.name(), target_id, e);
                    }
                    list.remove(i);
                    removed_any = true;
                } else {
                    effect.tick(now, target);
                    i += 1;
                }
            }

            if removed_any {
                reconcile_visuals(target_id, list, target);
            }
            if list.is_empty() {
                self.effects.remove(&target_id);
            }
        }
    }

    // =========================================================================
    // Damage
    // =========================================================================

    /// Deliver damage honoring freeze and shatter modifiers.
    ///
    /// The first hit on a frozen target is multiplied and converts the freeze
    /// into a shattered vulnerability; later hits use the shattered multiplier.
    /// Returns the damage delivered, or `None` if the target is gone.
    pub fn deal_damage(
        &mut self,
        target_id: TargetId,
        amount: i32,
        inflicter: Option<TargetId>,
        is_dot: bool,
    ) -> Option<i32> {
        let now = self.clock.now();
        let Some(target) = self.resolver.resolve(target_id) else {
            self.effects.remove(&target_id);
            return None;
        };

        let mut multiplier = 1.0;
        if let Some(list) = self.effects.get_mut(&target_id) {
            let frozen = list.iter_mut().find(|e| {
                e.effect_type() == EffectType::Freeze
                    && !e.is_cancelled()
                    && !e.is_expired(now)
                    && e.as_freeze().is_some_and(|f| !f.shatter_triggered())
            });
            if let Some(freeze) = frozen {
                if freeze.trigger_shatter() {
                    multiplier = self.settings.freeze_shatter_multiplier;
                    let freeze_id = freeze.id();
                    log::info!("{} shatters!", target_id);
                    remove_where(target_id, list, target, |e| e.id() == freeze_id);
                    match self.factory.shattered(target_id, now) {
                        Ok(mut shattered) => {
                            shattered.id = allocate_id(&mut self.next_effect_id);
                            install(target_id, list, target, shattered);
                        }
                        Err(e) => log::warn!("Could not build shattered effect: {}", e),
                    }
                    reconcile_visuals(target_id, list, target);
                }
            } else if let Some(factor) = list
                .iter()
                .filter(|e| !e.is_cancelled() && !e.is_expired(now))
                .find_map(|e| e.shatter_multiplier())
            {
                multiplier = factor;
            }
            if list.is_empty() {
                self.effects.remove(&target_id);
            }
        }

        let dealt = (amount as f64 * multiplier).floor() as i32;
        target.take_damage(Hit { amount: dealt, inflicter, is_dot });
        Some(dealt)
    }
}

// =============================================================================
// Shared list operations
// =============================================================================

pub(super) fn allocate_id(next: &mut u64) -> EffectId {
    let id = EffectId(*next);
    *next += 1;
    id
}

/// Append, apply, then purge whatever the new kind supersedes
pub(super) fn install(
    target_id: TargetId,
    list: &mut Vec<StatusEffect>,
    target: &mut dyn Target,
    effect: StatusEffect,
) -> EffectId {
    let id = effect.id();
    let kind = effect.effect_type();
    list.push(effect);
    if let Some(installed) = list.last_mut() {
        if let Err(e) = installed.apply(target) {
            log::warn!("Visual update for {} on {} failed: {}", kind.name(), target_id, e);
        }
    }
    let superseded = kind.supersedes();
    if !superseded.is_empty() {
        remove_where(target_id, list, target, |e| superseded.contains(&e.effect_type()));
    }
    id
}

/// Cancel and remove every matching effect, preserving the order of the rest
pub(super) fn remove_where(
    target_id: TargetId,
    list: &mut Vec<StatusEffect>,
    target: &mut dyn Target,
    mut pred: impl FnMut(&StatusEffect) -> bool,
) -> usize {
    let mut removed = 0;
    let mut i = 0;
    while i < list.len() {
        if pred(&list[i]) {
            let mut effect = list.remove(i);
            effect.cancel();
            if let Err(e) = effect.remove(target) {
                log::warn!("Visual cleanup for {} on {} failed: {}", effect.name(), target_id, e);
            }
            removed += 1;
        } else {
            i += 1;
        }
    }
    removed
}

/// Element shown when only ordinary effects are present: fire, then water
pub fn dominant_element(effects: &[StatusEffect]) -> ElementKind {
    if effects.iter().any(|e| e.element() == ElementKind::Fire) {
        ElementKind::Fire
    } else if effects.iter().any(|e| e.element() == ElementKind::Water) {
        ElementKind::Water
    } else {
        ElementKind::None
    }
}

/// Push the visible element state for a target. Idempotent.
pub(super) fn reconcile_visuals(target_id: TargetId, effects: &[StatusEffect], target: &mut dyn Target) {
    let result = if effects.is_empty() {
        target.clear_visual()
    } else if effects.iter().any(|e| e.effect_type().is_self_managing()) {
        return;
    } else {
        target.set_dominant_visual(dominant_element(effects))
    };
    if let Err(e) = result {
        log::warn!("Visual reconcile for {} failed: {}", target_id, e);
    }
}
