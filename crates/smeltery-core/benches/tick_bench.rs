//! Criterion benchmarks for converter ticking.
//!
//! Two benchmark groups:
//! - `busy_furnaces`: many furnaces converting ore and burning wood every tick
//! - `gated_furnaces`: the same world with a smelting frequency of 4

use criterion::{Criterion, criterion_group, criterion_main};
use smeltery_core::engine::Engine;
use smeltery_core::fixed::Fixed64;
use smeltery_core::id::*;
use smeltery_core::item::ItemStack;
use smeltery_core::settings::Settings;
use smeltery_core::test_utils::*;

// ===========================================================================
// World builders
// ===========================================================================

/// Build `count` running furnaces, each holding wood and two kinds of ore.
///
/// Stacks are large enough that nothing runs out during a benchmark.
fn build_world(count: u64, settings: Settings) -> (Engine, TestHost) {
    let mut engine = make_engine(settings);
    let reg = engine.registry();
    let (wood, metal, sulfur) = (wood(reg), metal_ore(reg), sulfur_ore(reg));
    let wood_stack = fuel_stack(reg, wood, 1_000_000);

    let mut host = TestHost::new();
    for id in 0..count {
        let mut furnace = make_furnace(6);
        furnace.inventory.put(SlotIndex(0), wood_stack.clone());
        furnace.inventory.put(SlotIndex(1), ItemStack::new(metal, 1_000_000));
        furnace.inventory.put(SlotIndex(2), ItemStack::new(sulfur, 1_000_000));
        furnace.inventory.max_stack = u32::MAX;
        furnace.smelting_speed = 2;
        host.spawn(id, furnace);
    }

    for entity in host.converters.keys().copied().collect::<Vec<_>>() {
        if let Err(err) = engine.start_cooking(&mut host, entity) {
            panic!("failed to start {entity:?}: {err}");
        }
    }
    (engine, host)
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_busy_furnaces(c: &mut Criterion) {
    let mut group = c.benchmark_group("busy_furnaces");
    group.sample_size(50);

    let (mut engine, mut host) = build_world(1000, settings_with(|_| {}));
    let half = Fixed64::from_num(0.5);

    group.bench_function("1000_furnaces_one_tick", |b| {
        b.iter(|| {
            engine.advance(&mut host, half);
        });
    });

    group.finish();
}

fn bench_gated_furnaces(c: &mut Criterion) {
    let mut group = c.benchmark_group("gated_furnaces");
    group.sample_size(50);

    let settings = settings_with(|s| s.smelting_frequencies = global(4));
    let (mut engine, mut host) = build_world(1000, settings);
    let half = Fixed64::from_num(0.5);

    group.bench_function("1000_furnaces_frequency_4", |b| {
        b.iter(|| {
            engine.advance(&mut host, half);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_busy_furnaces, bench_gated_furnaces);
criterion_main!(benches);
