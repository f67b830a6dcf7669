//! Elemancy - Entry Point
//!
//! Runs a scripted encounter against a training dummy and a boss on a
//! fixed-step loop, with a handful of ambient hazards cycling elements.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use elemancy::data::{export_default_data, DataManager};
use elemancy::status::TargetSnapshot;
use elemancy::{
    AmbientTracker, AttackCode, Combatant, CycleReport, EffectManager, ElementKind, ObjectId, ObjectState,
    TargetId, TargetWorld,
};

/// Simulation steps per second
const TARGET_FPS: u32 = 60;
const HAZARDS: u64 = 4;

#[derive(Parser, Debug)]
#[command(name = "elemancy", version, about = "Elemental status effect demo encounter")]
struct Args {
    /// Print the final state as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Simulated seconds to run
    #[arg(long, default_value_t = 8.0)]
    seconds: f64,

    /// Seed for ambient hazard rolls
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Write the default data files into this directory and exit
    #[arg(long, value_name = "DIR")]
    export: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Apply { target: TargetId, element: ElementKind, inflicter: TargetId },
    Strike { target: TargetId, amount: i32, inflicter: TargetId },
}

#[derive(Debug, Serialize)]
struct CombatantSummary {
    id: TargetId,
    name: String,
    health: i32,
    max_health: i32,
    damage_taken: i32,
    defeated: bool,
}

#[derive(Debug, Serialize)]
struct Summary {
    now: f64,
    combatants: Vec<CombatantSummary>,
    effects: Vec<TargetSnapshot>,
    hazards: Vec<(ObjectId, ElementKind)>,
    ambient: CycleReport,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("Starting Elemancy v{}", env!("CARGO_PKG_VERSION"));

    if let Some(dir) = &args.export {
        export_default_data(dir).with_context(|| format!("exporting defaults to {}", dir.display()))?;
        return Ok(());
    }

    let data = DataManager::new();
    let summary = run_encounter(&data, &args);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    log::info!("Elemancy shut down cleanly");
    Ok(())
}

fn run_encounter(data: &DataManager, args: &Args) -> Summary {
    let mut world = TargetWorld::new();
    let hero = world.spawn(Combatant::new("hero", 120).with_speed(6.0));
    let mage = world.spawn(Combatant::new("mage", 80).with_speed(5.0));
    let dummy = world.spawn(Combatant::new("training dummy", 500).with_speed(4.0));
    let boss = world.spawn(Combatant::new("warden", 900).with_attack(AttackCode::Attack(1), 2.0));

    let mut manager = EffectManager::new(
        world,
        data.synergy_table(),
        data.config.factory(),
        data.config.manager.clone(),
    );
    manager.enable();

    let mut ambient = AmbientTracker::new(data.config.ambient.clone());
    for i in 0..HAZARDS {
        ambient.register(ObjectId(i), data.config.ambient.properties());
    }
    let mut rng = StdRng::seed_from_u64(args.seed);

    let mut script = vec![
        (0.0, Action::Apply { target: dummy, element: ElementKind::Wind, inflicter: mage }),
        (0.0, Action::Apply { target: dummy, element: ElementKind::Fire, inflicter: hero }),
        (1.0, Action::Apply { target: boss, element: ElementKind::Water, inflicter: mage }),
        (1.0, Action::Apply { target: boss, element: ElementKind::Wind, inflicter: mage }),
        (2.5, Action::Strike { target: boss, amount: 20, inflicter: hero }),
        (3.0, Action::Strike { target: boss, amount: 20, inflicter: hero }),
        (4.0, Action::Apply { target: dummy, element: ElementKind::Fire, inflicter: hero }),
        (5.0, Action::Apply { target: dummy, element: ElementKind::Water, inflicter: mage }),
    ];
    script.reverse();

    let step = 1.0 / TARGET_FPS as f64;
    let frames = (args.seconds.max(0.0) * TARGET_FPS as f64).round() as u64;
    let mut totals = CycleReport::default();

    for _ in 0..frames {
        let now = manager.now();
        while script.last().is_some_and(|(at, _)| *at <= now + 1e-9) {
            if let Some((_, action)) = script.pop() {
                perform(&mut manager, action);
            }
        }

        manager.update(step);

        let now = manager.now();
        // Hazard 0 is being carried around for a while
        let probe = |id: ObjectId| {
            if id == ObjectId(0) && (2.0..4.0).contains(&now) {
                ObjectState::Grabbed
            } else {
                ObjectState::Idle
            }
        };
        if let Some(report) = ambient.update(step, now, &mut rng, probe) {
            if report.applied > 0 || report.expired > 0 {
                log::info!(
                    "[{:.2}s] hazards: {} ignited, {} faded",
                    now,
                    report.applied,
                    report.expired
                );
            }
            totals.merge(&report);
        }
    }

    let now = manager.now();
    let combatants = [hero, mage, dummy, boss]
        .into_iter()
        .filter_map(|id| {
            let c = manager.resolver().get(id)?;
            Some(CombatantSummary {
                id,
                name: c.name.clone(),
                health: c.health.current,
                max_health: c.health.max,
                damage_taken: c.damage_taken(),
                defeated: c.health.is_dead(),
            })
        })
        .collect::<Vec<_>>();
    for c in &combatants {
        log::info!("{} {}: {}/{} hp", c.id, c.name, c.health, c.max_health);
    }

    Summary {
        now,
        combatants,
        effects: manager.snapshot(),
        hazards: (0..HAZARDS)
            .map(|i| (ObjectId(i), ambient.element_of(ObjectId(i), now)))
            .collect(),
        ambient: totals,
    }
}

fn perform(manager: &mut EffectManager<TargetWorld>, action: Action) {
    let now = manager.now();
    match action {
        Action::Apply { target, element, inflicter } => {
            match manager.apply_element(target, element, Some(inflicter)) {
                Some(id) => log::info!("[{:.2}s] {} applies {} to {} ({:?})", now, inflicter, element.name(), target, id),
                None => log::info!("[{:.2}s] {} on {} fizzles", now, element.name(), target),
            }
        }
        Action::Strike { target, amount, inflicter } => {
            if let Some(dealt) = manager.deal_damage(target, amount, Some(inflicter), false) {
                log::info!("[{:.2}s] {} strikes {} for {} ({} base)", now, inflicter, target, dealt, amount);
            }
        }
    }
}
