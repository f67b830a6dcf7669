//! Benchmarks for the periodic effect sweep.
//!
//! Run with: cargo bench --bench sweep

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use elemancy::{Combatant, EffectManager, ElementKind, TargetId, TargetWorld};

/// A world where every target carries a burn and every other one a drench
fn populated_manager(num_targets: usize) -> (EffectManager<TargetWorld>, Vec<TargetId>) {
    let mut world = TargetWorld::new();
    let ids: Vec<TargetId> = (0..num_targets)
        .map(|i| world.spawn(Combatant::new(format!("target {}", i), 10_000).with_speed(5.0)))
        .collect();

    let mut manager = EffectManager::with_defaults(world);
    manager.enable();
    for (i, id) in ids.iter().enumerate() {
        if i % 2 == 0 {
            manager.apply_element(*id, ElementKind::Wind, None);
        }
        manager.apply_element(*id, ElementKind::Fire, None);
    }
    (manager, ids)
}

fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep");

    for num_targets in [10, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_targets", num_targets)),
            num_targets,
            |b, &n| {
                let (mut manager, _) = populated_manager(n);
                b.iter(|| {
                    manager.sweep();
                    black_box(manager.tracked_targets())
                });
            },
        );
    }

    group.finish();
}

fn bench_full_burn(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_burn");

    for num_targets in [10, 100].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_targets", num_targets)),
            num_targets,
            |b, &n| {
                b.iter(|| {
                    let (mut manager, ids) = populated_manager(n);
                    for _ in 0..360 {
                        manager.update(1.0 / 60.0);
                    }
                    black_box(manager.get_effects_on_target(ids[0]).len())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_sweep, bench_full_burn);
criterion_main!(benches);
