//! Per-converter runtime state and the tick it runs on every timer firing.
//!
//! One tick, in order: select fuel, ask the before-cook hooks, convert held
//! items (on smelting ticks only), flag input slots as cooking, forward cook
//! progress to the auxiliary fixture, burn fuel, advance the tick counter,
//! notify the after-cook hooks.

use crate::debug_log;
use crate::fixed::{Fixed64, Ticks, amount_to_fixed64, checked_div_64, f64_to_fixed64, floor_amount};
use crate::fuel::{self, FuelOutcome};
use crate::hooks::{HookSet, HookVerdict};
use crate::host::{Delivery, Host, REFERENCE_TEMPERATURE, store_or_drop};
use crate::id::{EntityId, FixtureId, ItemTypeId, SlotIndex, TimerHandle};
use crate::policy::{is_eligible, is_smelting_tick, passes_gates};
use crate::rates::ConverterConfig;
use crate::registry::Registry;
use crate::rng::SimRng;
use crate::selector;

/// Seconds of cook progress credited per tick.
pub const TICK_SECONDS: f64 = 0.5;

/// Mutable state of one active converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterState {
    /// Back-reference to the host entity; the host owns its lifetime.
    pub entity: EntityId,
    tick_count: Ticks,
}

impl ConverterState {
    pub fn new(entity: EntityId) -> Self {
        Self {
            entity,
            tick_count: 0,
        }
    }

    /// Ticks completed since activation.
    pub fn tick_count(&self) -> Ticks {
        self.tick_count
    }
}

/// Whether a converter is ticking.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Active {
        timer: TimerHandle,
        state: ConverterState,
    },
}

/// Everything the engine keeps per observed converter.
#[derive(Debug, Clone)]
pub struct Controller {
    pub kind: String,
    /// Resolved once when the converter is first observed.
    pub config: ConverterConfig,
    pub phase: Phase,
}

impl Controller {
    pub fn new(kind: &str, config: ConverterConfig) -> Self {
        Self {
            kind: kind.to_string(),
            config,
            phase: Phase::Idle,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Active { .. })
    }

    pub fn state(&self) -> Option<&ConverterState> {
        match &self.phase {
            Phase::Active { state, .. } => Some(state),
            Phase::Idle => None,
        }
    }
}

/// Shared services one tick borrows from the engine and the host.
pub struct CookContext<'a, H: Host + ?Sized> {
    pub host: &'a mut H,
    pub registry: &'a Registry,
    pub hooks: &'a mut HookSet,
    pub rng: &'a mut SimRng,
    pub debug: bool,
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CookReport {
    /// A before-cook hook suppressed the tick.
    pub suppressed: bool,
    /// The conversion pass ran (smelting tick).
    pub smelted: bool,
    pub fuel_slot: Option<SlotIndex>,
    /// Raw items used up by conversion.
    pub consumed: Vec<(ItemTypeId, u32)>,
    /// Items created by conversion or as fuel byproduct.
    pub produced: Vec<(ItemTypeId, u32)>,
    /// Produced items that did not fit and were dropped.
    pub dropped: Vec<(ItemTypeId, u32)>,
    /// Set when a fuel unit burnt out this tick.
    pub fuel: Option<FuelOutcome>,
    pub fixture: Option<FixtureId>,
}

impl CookReport {
    pub(crate) fn record_delivery(&mut self, item_type: ItemTypeId, amount: u32, delivery: Delivery) {
        match delivery {
            Delivery::Stored => self.produced.push((item_type, amount)),
            Delivery::Dropped => {
                self.produced.push((item_type, amount));
                self.dropped.push((item_type, amount));
            }
            Delivery::Nothing => {}
        }
    }
}

/// Run one tick for `state`'s converter.
///
/// A converter the host no longer knows makes this a no-op.
pub fn cook<H: Host + ?Sized>(
    ctx: &mut CookContext<'_, H>,
    config: &ConverterConfig,
    state: &mut ConverterState,
) -> CookReport {
    let entity = state.entity;
    let mut report = CookReport::default();

    let Some(converter) = ctx.host.converter(entity) else {
        return report;
    };
    let fuel_slot = selector::find_fuel(entity, converter, ctx.registry, ctx.hooks);
    report.fuel_slot = fuel_slot;

    let fuel = fuel_slot.and_then(move |slot| converter.inventory.get(slot));
    // The slot alone is not enough: conversion may empty it and refill it with output.
    let mut picked = fuel.zip(fuel_slot).map(|(stack, slot)| (slot, stack.item_type));
    if ctx.hooks.before_cook(state, fuel) == HookVerdict::Suppress {
        debug_log!(ctx.debug, ?entity, "cook suppressed by hook");
        report.suppressed = true;
        return report;
    }

    if is_smelting_tick(state.tick_count, config.tick_frequency) {
        report.smelted = true;
        let emptied = smelt_items(ctx, config, state, &mut report);
        picked = picked.filter(|(slot, _)| !emptied.contains(slot));
    }

    if let Some(converter) = ctx.host.converter_mut(entity) {
        let input = converter.input_slots.clone();
        for slot in converter.inventory.occupied_in(input) {
            if let Some(stack) = converter.inventory.get_mut(slot) {
                stack.set_cooking(true);
            }
        }
    }

    report.fixture = ctx
        .host
        .send_fixture_cook(entity, f64_to_fixed64(TICK_SECONDS));

    if let Some((slot, item_type)) = picked {
        burn_fuel(ctx, config, entity, slot, item_type, &mut report);
    }

    state.tick_count += 1;

    let fuel = picked.and_then(|(slot, item_type)| {
        ctx.host
            .converter(entity)
            .and_then(|c| c.inventory.get(slot))
            .filter(|stack| stack.item_type == item_type)
    });
    ctx.hooks.after_cook(state, fuel, report.fixture);

    report
}

/// Charge burnt per tick: `0.5 * (cooking_temperature / 200) * fuel_speed_multiplier`.
pub fn fuel_burn_per_tick(cooking_temperature: Fixed64, fuel_speed_multiplier: Fixed64) -> Fixed64 {
    let heat = checked_div_64(cooking_temperature, f64_to_fixed64(REFERENCE_TEMPERATURE))
        .unwrap_or(Fixed64::ONE);
    f64_to_fixed64(TICK_SECONDS)
        .saturating_mul(heat)
        .saturating_mul(fuel_speed_multiplier)
}

fn burn_fuel<H: Host + ?Sized>(
    ctx: &mut CookContext<'_, H>,
    config: &ConverterConfig,
    entity: EntityId,
    slot: SlotIndex,
    item_type: ItemTypeId,
    report: &mut CookReport,
) {
    let Some(converter) = ctx.host.converter_mut(entity) else {
        return;
    };
    let burn = fuel_burn_per_tick(converter.cooking_temperature, config.fuel_speed_multiplier);
    let Some(stack) = converter
        .inventory
        .get_mut(slot)
        .filter(|stack| stack.item_type == item_type)
    else {
        return;
    };
    stack.fuel = stack.fuel.saturating_sub(burn);
    stack.set_on_fire(true);

    if stack.fuel <= Fixed64::ZERO {
        let outcome = fuel::consume(ctx, config, entity, slot, report);
        report.fuel = Some(outcome);
    }
}

/// Convert every eligible stack. Returns the slots emptied along the way.
fn smelt_items<H: Host + ?Sized>(
    ctx: &mut CookContext<'_, H>,
    config: &ConverterConfig,
    state: &ConverterState,
    report: &mut CookReport,
) -> Vec<SlotIndex> {
    let entity = state.entity;
    let registry = ctx.registry;
    let mut emptied_slots = Vec::new();
    let Some(converter) = ctx.host.converter_mut(entity) else {
        return emptied_slots;
    };
    let speed = converter.smelting_speed;
    let mut outputs: Vec<(ItemTypeId, u32)> = Vec::new();

    for slot in selector::convertible_slots(converter, registry) {
        let Some(stack) = converter.inventory.get_mut(slot) else {
            continue;
        };
        let item_type = stack.item_type;
        let Some(rule) = registry.conversion_rule(item_type) else {
            continue;
        };

        let eligibility = is_eligible(registry.name(item_type), config);
        if !passes_gates(stack, rule, eligibility, state.tick_count, config.tick_frequency) {
            continue;
        }

        if rule.sets_cooking_flag {
            stack.set_cooking(true);
        }

        let consumed = speed.min(stack.amount);
        if consumed == 0 {
            continue;
        }
        let emptied = stack.amount <= consumed;
        if emptied {
            converter.inventory.take(slot);
            emptied_slots.push(slot);
        } else {
            stack.amount -= consumed;
            stack.mark_dirty();
        }
        report.consumed.push((item_type, consumed));

        if let Some(becomes) = rule.becomes {
            let multiplier = config.output_multiplier(registry.name(becomes));
            let amount = floor_amount(
                rule.amount_of_become
                    .saturating_mul(amount_to_fixed64(consumed))
                    .saturating_mul(multiplier),
            );
            debug_log!(
                ctx.debug,
                ?entity,
                item = registry.name(becomes),
                %multiplier,
                amount,
                "converted"
            );
            outputs.push((becomes, amount));
        }
    }

    for (item_type, amount) in outputs {
        let delivery = store_or_drop(ctx.host, ctx.registry, entity, item_type, amount);
        report.record_delivery(item_type, amount, delivery);
    }
    emptied_slots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fuel_burn_at_reference_temperature() {
        let burn = fuel_burn_per_tick(Fixed64::from_num(200), Fixed64::from_num(2));
        assert_eq!(burn, Fixed64::ONE);
    }

    #[test]
    fn fuel_burn_scales_with_temperature() {
        let burn = fuel_burn_per_tick(Fixed64::from_num(400), Fixed64::ONE);
        assert_eq!(burn, Fixed64::ONE);
        let burn = fuel_burn_per_tick(Fixed64::from_num(100), Fixed64::ONE);
        assert_eq!(burn, Fixed64::from_num(0.25));
    }

    #[test]
    fn fuel_burn_saturates() {
        let burn = fuel_burn_per_tick(Fixed64::MAX, Fixed64::MAX);
        assert_eq!(burn, Fixed64::MAX);
        assert_eq!(Fixed64::MIN.saturating_sub(burn), Fixed64::MIN);
    }

    #[test]
    fn fresh_state_starts_at_zero() {
        let state = ConverterState::new(EntityId(9));
        assert_eq!(state.tick_count(), 0);
        assert_eq!(state.entity, EntityId(9));
    }

    #[test]
    fn controller_starts_idle() {
        let c = Controller::new("furnace", ConverterConfig::default());
        assert!(!c.is_active());
        assert!(c.state().is_none());
    }
}
