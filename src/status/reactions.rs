//! Delayed compound reactions
//!
//! Positive synergies do not resolve on contact. They are scheduled and,
//! when they fire, look the contributing effects up again by id: an effect
//! removed in the meantime simply has nothing left to contribute.

use crate::elements::ElementKind;
use crate::target::{TargetId, TargetResolver};
use super::effect::EffectId;
use super::manager::{allocate_id, install, reconcile_visuals, remove_where, EffectManager};

/// A scheduled reaction between two effects on one target
#[derive(Debug, Clone, PartialEq)]
pub enum Reaction {
    /// Fire + wind: remaining burn damage plus a flat blast
    Explosion {
        target: TargetId,
        burn: EffectId,
        wind: EffectId,
        burn_inflicter: Option<TargetId>,
        wind_inflicter: Option<TargetId>,
    },
    /// Water + wind: both are replaced by a freeze
    Freeze {
        target: TargetId,
        drench: EffectId,
        wind: EffectId,
    },
}

/// (effect id, element, inflicter) of one side of a synergy
type Contributor = (EffectId, ElementKind, Option<TargetId>);

impl Reaction {
    /// The reaction two elements produce, in either order
    pub fn between(target: TargetId, a: Contributor, b: Contributor) -> Option<Self> {
        let (fire, wind, water) = sort_contributors(a, b);
        match (fire, wind, water) {
            (Some(burn), Some(wind), None) => Some(Reaction::Explosion {
                target,
                burn: burn.0,
                wind: wind.0,
                burn_inflicter: burn.2,
                wind_inflicter: wind.2,
            }),
            (None, Some(wind), Some(drench)) => Some(Reaction::Freeze {
                target,
                drench: drench.0,
                wind: wind.0,
            }),
            _ => None,
        }
    }

    pub fn target(&self) -> TargetId {
        match self {
            Reaction::Explosion { target, .. } | Reaction::Freeze { target, .. } => *target,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Reaction::Explosion { .. } => "explosion",
            Reaction::Freeze { .. } => "freeze",
        }
    }
}

fn sort_contributors(
    a: Contributor,
    b: Contributor,
) -> (Option<Contributor>, Option<Contributor>, Option<Contributor>) {
    let mut fire = None;
    let mut wind = None;
    let mut water = None;
    for c in [a, b] {
        match c.1 {
            ElementKind::Fire => fire = Some(c),
            ElementKind::Wind => wind = Some(c),
            ElementKind::Water => water = Some(c),
            _ => {}
        }
    }
    (fire, wind, water)
}

impl<R: TargetResolver> EffectManager<R> {
    pub(super) fn run_reaction(&mut self, reaction: Reaction) {
        if !self.is_enabled() {
            return;
        }
        log::info!("{} reaction fires on {}", reaction.name(), reaction.target());
        match reaction {
            Reaction::Explosion {
                target,
                burn,
                wind,
                burn_inflicter,
                wind_inflicter,
            } => self.explode(target, burn, wind, burn_inflicter, wind_inflicter),
            Reaction::Freeze { target, drench, wind } => self.flash_freeze(target, drench, wind),
        }
    }

    fn explode(
        &mut self,
        target_id: TargetId,
        burn: EffectId,
        wind: EffectId,
        burn_inflicter: Option<TargetId>,
        wind_inflicter: Option<TargetId>,
    ) {
        let now = self.clock.now();
        let remaining = {
            let Some(target) = self.resolver.resolve(target_id) else {
                self.effects.remove(&target_id);
                return;
            };
            self.effects
                .get_mut(&target_id)
                .and_then(|list| list.iter_mut().find(|e| e.id() == burn))
                .map(|effect| {
                    // Ticks already owed are delivered by the burn itself
                    effect.tick(now, target);
                    effect.remaining_burn_damage(now)
                })
                .unwrap_or(0)
        };

        if remaining > 0 {
            self.deal_damage(target_id, remaining, burn_inflicter, false);
        }
        let blast = self.settings.explosion_damage;
        self.deal_damage(target_id, blast, wind_inflicter, false);
        self.remove_matching(target_id, |e| e.id() == burn || e.id() == wind);
    }

    fn flash_freeze(&mut self, target_id: TargetId, drench: EffectId, wind: EffectId) {
        let now = self.clock.now();
        let Some(target) = self.resolver.resolve(target_id) else {
            self.effects.remove(&target_id);
            return;
        };
        let freeze = match self.factory.freeze(target_id, now) {
            Ok(mut freeze) => {
                freeze.id = allocate_id(&mut self.next_effect_id);
                freeze
            }
            Err(e) => {
                log::warn!("Could not build freeze for {}: {}", target_id, e);
                return;
            }
        };

        let list = self.effects.entry(target_id).or_default();
        remove_where(target_id, list, target, |e| e.id() == drench || e.id() == wind);
        install(target_id, list, target, freeze);
        reconcile_visuals(target_id, list, target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: TargetId = TargetId(1);

    #[test]
    fn test_between_is_order_independent() {
        let fire = (EffectId(1), ElementKind::Fire, Some(TargetId(10)));
        let wind = (EffectId(2), ElementKind::Wind, Some(TargetId(20)));
        let a = Reaction::between(T, fire, wind).unwrap();
        let b = Reaction::between(T, wind, fire).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a,
            Reaction::Explosion {
                target: T,
                burn: EffectId(1),
                wind: EffectId(2),
                burn_inflicter: Some(TargetId(10)),
                wind_inflicter: Some(TargetId(20)),
            }
        );
    }

    #[test]
    fn test_water_wind_freezes() {
        let water = (EffectId(3), ElementKind::Water, None);
        let wind = (EffectId(4), ElementKind::Wind, None);
        let reaction = Reaction::between(T, wind, water).unwrap();
        assert_eq!(reaction.name(), "freeze");
        assert_eq!(reaction.target(), T);
    }

    #[test]
    fn test_unrelated_pair_has_no_reaction() {
        let fire = (EffectId(1), ElementKind::Fire, None);
        let water = (EffectId(2), ElementKind::Water, None);
        assert!(Reaction::between(T, fire, water).is_none());
        assert!(Reaction::between(T, fire, fire).is_none());
    }
}
