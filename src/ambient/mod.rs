//! Ambient elemental properties
//!
//! Environment hazards (braziers, puddles, vents) pick up a random element
//! on a timer. This is separate from targeted status effects: nothing here
//! touches a [`Target`](crate::target::Target), it only tracks which element
//! an object currently carries.

use std::collections::BTreeMap;
use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::elements::ElementKind;
use crate::sim::Ticker;

/// Identifier of an ambient object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}

/// Element currently carried by one object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementalProperties {
    pub element: ElementKind,
    /// Seconds an element stays once assigned
    pub duration: f64,
    /// Minimum seconds between two assignments
    pub cooldown: f64,
    /// When the current element was assigned
    pub applied_at: f64,
    /// When the object last became elemental, if ever
    pub last_elemental_at: Option<f64>,
}

impl ElementalProperties {
    pub fn new(duration: f64, cooldown: f64) -> Self {
        Self {
            element: ElementKind::None,
            duration,
            cooldown,
            applied_at: 0.0,
            last_elemental_at: None,
        }
    }

    /// Carrying an element whose window has not elapsed
    pub fn is_active(&self, now: f64) -> bool {
        self.element != ElementKind::None && now - self.applied_at < self.duration
    }

    /// Cooldown since the last assignment has passed
    pub fn can_become_elemental(&self, now: f64) -> bool {
        match self.last_elemental_at {
            Some(at) => now - at >= self.cooldown,
            None => true,
        }
    }

    fn assign(&mut self, element: ElementKind, now: f64) {
        self.element = element;
        self.applied_at = now;
        self.last_elemental_at = Some(now);
    }

    fn clear(&mut self) {
        self.element = ElementKind::None;
    }
}

/// Tunables for the ambient cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientConfig {
    /// Chance an eligible object becomes elemental on a cycle
    pub probability: f64,
    pub duration: f64,
    pub cooldown: f64,
    /// Seconds between cycles when driven by [`AmbientTracker::update`]
    pub cycle_interval: f64,
    /// Elements an object may pick up
    pub elements: Vec<ElementKind>,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            probability: 0.5,
            duration: 10.0,
            cooldown: 5.0,
            cycle_interval: 1.0,
            elements: vec![ElementKind::Fire, ElementKind::Water, ElementKind::Wind],
        }
    }
}

impl AmbientConfig {
    /// Fresh properties using the configured duration and cooldown
    pub fn properties(&self) -> ElementalProperties {
        ElementalProperties::new(self.duration, self.cooldown)
    }
}

/// What the caller says an object is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObjectState {
    #[default]
    Idle,
    Grabbed,
    Dropped,
}

impl ObjectState {
    pub fn is_busy(&self) -> bool {
        !matches!(self, ObjectState::Idle)
    }
}

/// Outcome counters for one cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    pub applied: usize,
    pub expired: usize,
    pub skipped_active: usize,
    pub skipped_cooldown: usize,
    pub skipped_busy: usize,
    pub skipped_roll: usize,
}

impl CycleReport {
    /// Fold another report into this one
    pub fn merge(&mut self, other: &CycleReport) {
        self.applied += other.applied;
        self.expired += other.expired;
        self.skipped_active += other.skipped_active;
        self.skipped_cooldown += other.skipped_cooldown;
        self.skipped_busy += other.skipped_busy;
        self.skipped_roll += other.skipped_roll;
    }
}

/// Tracks ambient elemental state for registered objects
#[derive(Debug, Clone)]
pub struct AmbientTracker {
    config: AmbientConfig,
    /// Ordered so a seeded rng yields the same assignments every run
    objects: BTreeMap<ObjectId, ElementalProperties>,
    ticker: Ticker,
}

impl AmbientTracker {
    pub fn new(mut config: AmbientConfig) -> Self {
        if !(0.0..=1.0).contains(&config.probability) {
            log::warn!("Ambient probability {} out of range, disabling rolls", config.probability);
            config.probability = 0.0;
        }
        let ticker = Ticker::new(config.cycle_interval);
        Self {
            config,
            objects: BTreeMap::new(),
            ticker,
        }
    }

    /// Get the ambient config
    pub fn config(&self) -> &AmbientConfig {
        &self.config
    }

    /// Start tracking an object. Replaces any previous record.
    pub fn register(&mut self, id: ObjectId, properties: ElementalProperties) {
        if self.objects.insert(id, properties).is_some() {
            log::debug!("{} re-registered, previous ambient state dropped", id);
        }
    }

    /// Stop tracking an object, returning its last state
    pub fn unregister(&mut self, id: ObjectId) -> Option<ElementalProperties> {
        self.objects.remove(&id)
    }

    /// Get an object's elemental state
    pub fn properties(&self, id: ObjectId) -> Option<&ElementalProperties> {
        self.objects.get(&id)
    }

    /// Element an object carries right now, `None` when inert or untracked
    pub fn element_of(&self, id: ObjectId, now: f64) -> ElementKind {
        self.objects
            .get(&id)
            .filter(|p| p.is_active(now))
            .map(|p| p.element)
            .unwrap_or_default()
    }

    /// Number of registered objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if no objects are registered
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Expire stale elements and roll new ones on eligible objects
    pub fn cycle<G, P>(&mut self, now: f64, rng: &mut G, mut probe: P) -> CycleReport
    where
        G: Rng + ?Sized,
        P: FnMut(ObjectId) -> ObjectState,
    {
        let mut report = CycleReport::default();

        for (&id, props) in self.objects.iter_mut() {
            if props.element != ElementKind::None && !props.is_active(now) {
                log::debug!("{} lost {}", id, props.element.name());
                props.clear();
                report.expired += 1;
            }

            if props.is_active(now) {
                report.skipped_active += 1;
                continue;
            }
            if !props.can_become_elemental(now) {
                report.skipped_cooldown += 1;
                continue;
            }
            if probe(id).is_busy() {
                report.skipped_busy += 1;
                continue;
            }
            if !rng.gen_bool(self.config.probability) {
                report.skipped_roll += 1;
                continue;
            }
            let Some(&element) = self.config.elements.choose(rng) else {
                report.skipped_roll += 1;
                continue;
            };

            props.assign(element, now);
            report.applied += 1;
            log::debug!("{} became {}", id, element.name());
        }

        report
    }

    /// Accumulate time and run a cycle whenever the interval elapses
    pub fn update<G, P>(&mut self, delta_secs: f64, now: f64, rng: &mut G, probe: P) -> Option<CycleReport>
    where
        G: Rng + ?Sized,
        P: FnMut(ObjectId) -> ObjectState,
    {
        if self.ticker.update(delta_secs) {
            Some(self.cycle(now, rng, probe))
        } else {
            None
        }
    }
}

impl Default for AmbientTracker {
    fn default() -> Self {
        Self::new(AmbientConfig::default())
    }
}
