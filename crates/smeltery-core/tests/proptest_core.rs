//! Property-based tests for rate resolution, gating and inventory bookkeeping.

use proptest::prelude::*;
use smeltery_core::controller::fuel_burn_per_tick;
use smeltery_core::fixed::{Fixed64, amount_to_fixed64, checked_f64_to_fixed64, floor_amount};
use smeltery_core::id::*;
use smeltery_core::item::{Inventory, ItemStack};
use smeltery_core::policy::{Eligibility, is_cook_time_due, is_eligible, is_smelting_tick};
use smeltery_core::rates::RateResolver;
use smeltery_core::test_utils::*;
use std::collections::BTreeMap;

// ===========================================================================
// Generators
// ===========================================================================

fn arb_kind() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["furnace", "furnace.large", "campfire", "refinery_small_deployed"])
        .prop_map(str::to_string)
}

/// Any `f64` that fits the fixed-point range, including extremes and tiny values.
fn arb_fixed() -> impl Strategy<Value = Fixed64> {
    any::<f64>().prop_filter_map("outside Q32.32", checked_f64_to_fixed64)
}

fn arb_item_name() -> impl Strategy<Value = String> {
    "[a-z]{1,8}(\\.[a-z]{1,6})?"
}

// ===========================================================================
// Rate resolution
// ===========================================================================

proptest! {
    #[test]
    fn kind_entry_beats_global(kind in arb_kind(), g in 0.1f64..10.0, k in 0.1f64..10.0) {
        let settings = settings_with(|s| {
            s.speed_multipliers = global(g);
            s.speed_multipliers.insert(kind.clone(), k);
        });
        let cfg = RateResolver::new(&settings).resolve(&kind);
        prop_assert_eq!(cfg.speed_multiplier, Fixed64::from_num(k));
    }

    #[test]
    fn missing_kind_uses_global(kind in arb_kind(), g in 0.1f64..10.0, freq in 1u32..20) {
        let settings = settings_with(|s| {
            s.speed_multipliers = global(g);
            s.smelting_frequencies = global(freq);
        });
        let cfg = RateResolver::new(&settings).resolve(&kind);
        prop_assert_eq!(cfg.speed_multiplier, Fixed64::from_num(g));
        prop_assert_eq!(cfg.tick_frequency, freq);
    }

    #[test]
    fn resolution_is_idempotent(kind in arb_kind(), k in 0.1f64..10.0, usage in 1u32..5) {
        let settings = settings_with(|s| {
            s.fuel_speed_multipliers.insert(kind.clone(), k);
            s.fuel_usage_multipliers = global(usage);
        });
        let resolver = RateResolver::new(&settings);
        prop_assert_eq!(resolver.resolve(&kind), resolver.resolve(&kind));
    }

    #[test]
    fn tick_interval_is_always_positive(kind in arb_kind(), speed in any::<f64>()) {
        let settings = settings_with(|s| s.speed_multipliers = global(speed));
        let cfg = RateResolver::new(&settings).resolve(&kind);
        prop_assert!(cfg.speed_multiplier > Fixed64::ZERO);
        prop_assert!(cfg.tick_interval() > Fixed64::ZERO);
    }

    #[test]
    fn any_number_resolves_to_a_usable_config(
        kind in arb_kind(),
        speed in any::<f64>(),
        fuel_speed in any::<f64>(),
        output in any::<f64>(),
        temperature in arb_fixed(),
    ) {
        let settings = settings_with(|s| {
            s.speed_multipliers = global(speed);
            s.fuel_speed_multipliers = global(fuel_speed);
            s.output_multipliers = global(BTreeMap::from([("sulfur".to_string(), output)]));
        });
        let cfg = RateResolver::new(&settings).resolve(&kind);
        prop_assert!(cfg.fuel_speed_multiplier >= Fixed64::ZERO);
        let burn = fuel_burn_per_tick(temperature.max(Fixed64::ZERO), cfg.fuel_speed_multiplier);
        prop_assert!(burn >= Fixed64::ZERO);
        prop_assert_eq!(
            cfg.output_multiplier("sulfur"),
            checked_f64_to_fixed64(output).unwrap_or(Fixed64::ONE)
        );
    }

    #[test]
    fn deny_beats_allow(name in arb_item_name(), allowed in any::<bool>()) {
        let settings = settings_with(|s| {
            s.deny_lists = global(vec![name.clone()]);
            if allowed {
                s.allow_lists = global(vec![name.clone()]);
            }
        });
        let cfg = RateResolver::new(&settings).resolve("furnace");
        prop_assert_eq!(is_eligible(&name, &cfg), Eligibility::Deny);
    }

    #[test]
    fn output_multiplier_prefers_item_entry(m in 0.0f64..8.0, g in 0.0f64..8.0) {
        let settings = settings_with(|s| {
            s.output_multipliers = global(BTreeMap::from([
                ("sulfur".to_string(), m),
                ("global".to_string(), g),
            ]));
        });
        let cfg = RateResolver::new(&settings).resolve("furnace");
        prop_assert_eq!(cfg.output_multiplier("sulfur"), Fixed64::from_num(m));
        prop_assert_eq!(cfg.output_multiplier("charcoal"), Fixed64::from_num(g));
    }
}

// ===========================================================================
// Gating
// ===========================================================================

proptest! {
    #[test]
    fn smelting_ticks_are_multiples(tick in 0u64..10_000, freq in 0u32..50) {
        let f = u64::from(freq.max(1));
        prop_assert_eq!(is_smelting_tick(tick, freq), tick % f == 0);
    }

    #[test]
    fn cook_time_due_counts_cycles(cycle in 0u64..500, freq in 1u32..10, cook in 1u32..10) {
        let tick = cycle * u64::from(freq);
        prop_assert_eq!(is_cook_time_due(tick, freq, cook), cycle % u64::from(cook) == 0);
    }

    #[test]
    fn zero_cook_time_is_always_due(tick in 0u64..10_000, freq in 0u32..50) {
        prop_assert!(is_cook_time_due(tick, freq, 0));
    }

    #[test]
    fn floored_yield_never_exceeds_product(per_unit in arb_fixed(), consumed in any::<u32>(), mult in arb_fixed()) {
        let per_unit = per_unit.max(Fixed64::ZERO);
        let exact = per_unit
            .saturating_mul(amount_to_fixed64(consumed))
            .saturating_mul(mult)
            .max(Fixed64::ZERO);
        let amount = floor_amount(exact);
        prop_assert!(amount_to_fixed64(amount) <= exact);
        prop_assert!(exact - amount_to_fixed64(amount) < Fixed64::ONE);
    }
}

// ===========================================================================
// Inventory
// ===========================================================================

proptest! {
    #[test]
    fn insert_conserves_items(
        slots in 1usize..6,
        max_stack in 1u32..100,
        amounts in prop::collection::vec(1u32..250, 1..8),
    ) {
        let mut inv = Inventory::new(slots, max_stack);
        let item = ItemTypeId(0);
        let mut stored = 0u32;
        for amount in amounts {
            match inv.insert(ItemStack::new(item, amount)) {
                Ok(()) => stored += amount,
                Err(rest) => stored += amount - rest.amount,
            }
        }
        prop_assert_eq!(inv.quantity(item), stored);
        prop_assert!(inv.iter().all(|(_, s)| s.amount <= max_stack && s.amount > 0));
    }
}
