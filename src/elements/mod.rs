//! Element catalog
//!
//! Element identities and the pairwise synergy rules between them.
//! Rules are plain data: adding an element only means adding rule entries.

use std::collections::HashMap;
use serde::{Deserialize, Serialize};

/// Elemental identity carried by status effects and ambient objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum ElementKind {
    #[default]
    None,
    Fire,
    Water,
    Wind,
    /// Produced by the water + wind reaction
    Ice,
}

impl ElementKind {
    /// Elements that ordinary attacks can carry
    pub fn all() -> &'static [ElementKind] {
        &[ElementKind::Fire, ElementKind::Water, ElementKind::Wind, ElementKind::Ice]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::None => "None",
            ElementKind::Fire => "Fire",
            ElementKind::Water => "Water",
            ElementKind::Wind => "Wind",
            ElementKind::Ice => "Ice",
        }
    }
}

/// How two elements interact when both are present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SynergyKind {
    #[default]
    Neutral,
    /// Elements combine into a derived effect
    Positive,
    /// One element cancels the other
    Negative,
}

/// A rule for an unordered pair of elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynergyRule {
    pub a: ElementKind,
    pub b: ElementKind,
    pub kind: SynergyKind,
    pub description: String,
}

impl SynergyRule {
    pub fn new(a: ElementKind, b: ElementKind, kind: SynergyKind, description: impl Into<String>) -> Self {
        Self {
            a,
            b,
            kind,
            description: description.into(),
        }
    }
}

/// Normalized key so that (a, b) and (b, a) land on the same entry
fn pair_key(a: ElementKind, b: ElementKind) -> (ElementKind, ElementKind) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Symmetric lookup table of synergy rules
#[derive(Debug, Clone, Default)]
pub struct SynergyTable {
    rules: HashMap<(ElementKind, ElementKind), SynergyRule>,
}

impl SynergyTable {
    /// An empty table (every pair is neutral)
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding [`default_rules`]
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        for rule in default_rules() {
            table.add_rule(rule);
        }
        table
    }

    /// Add a rule. Returns false (and keeps the existing rule) if the pair is already covered.
    pub fn add_rule(&mut self, rule: SynergyRule) -> bool {
        let key = pair_key(rule.a, rule.b);
        if self.rules.contains_key(&key) {
            return false;
        }
        self.rules.insert(key, rule);
        true
    }

    /// Look up the rule for a pair, regardless of order
    pub fn get_synergy(&self, a: ElementKind, b: ElementKind) -> Option<&SynergyRule> {
        self.rules.get(&pair_key(a, b))
    }

    /// Synergy kind for a pair, `Neutral` when no rule exists
    pub fn kind_of(&self, a: ElementKind, b: ElementKind) -> SynergyKind {
        self.get_synergy(a, b)
            .map(|r| r.kind)
            .unwrap_or(SynergyKind::Neutral)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Water puts out fire, fire and wind explode, water and wind freeze
pub fn default_rules() -> Vec<SynergyRule> {
    vec![
        SynergyRule::new(ElementKind::Water, ElementKind::Fire, SynergyKind::Negative, "water extinguishes fire"),
        SynergyRule::new(ElementKind::Fire, ElementKind::Wind, SynergyKind::Positive, "explosion"),
        SynergyRule::new(ElementKind::Water, ElementKind::Wind, SynergyKind::Positive, "freeze"),
    ]
}
