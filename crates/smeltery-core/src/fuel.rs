//! Fuel consumer: handles a fuel unit whose charge has burnt out.

use crate::controller::{CookContext, CookReport};
use crate::debug_log;
use crate::fixed::{Fixed64, amount_to_fixed64, floor_amount};
use crate::hooks::HookVerdict;
use crate::host::{Host, store_or_drop};
use crate::id::{EntityId, SlotIndex};
use crate::rates::ConverterConfig;

/// What happened to a burnt-out fuel stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuelOutcome {
    /// A hook vetoed consumption; the stack is untouched.
    Vetoed,
    /// Units were used and the top unit's charge was restored.
    Replenished { remaining: u32 },
    /// The whole stack was used up and removed.
    Exhausted,
    /// The slot held nothing with a fuel rule (e.g. a hook override).
    NotFuel,
}

/// Consume the burnt-out fuel in `slot`.
///
/// Rolls for a byproduct, then either removes the stack (when no more than
/// `fuel_usage_multiplier` units remain) or uses that many units and restores
/// the nominal charge.
pub fn consume<H: Host + ?Sized>(
    ctx: &mut CookContext<'_, H>,
    config: &ConverterConfig,
    entity: EntityId,
    slot: SlotIndex,
    report: &mut CookReport,
) -> FuelOutcome {
    let registry = ctx.registry;
    let Some(converter) = ctx.host.converter(entity) else {
        return FuelOutcome::NotFuel;
    };
    let Some(stack) = converter.inventory.get(slot) else {
        return FuelOutcome::NotFuel;
    };
    let Some(rule) = registry.fuel_rule(stack.item_type) else {
        return FuelOutcome::NotFuel;
    };

    if ctx.hooks.before_fuel_consume(entity, stack, rule) == HookVerdict::Suppress {
        debug_log!(ctx.debug, ?entity, "fuel consumption vetoed by hook");
        return FuelOutcome::Vetoed;
    }
    let allow_byproduct = converter.allow_byproduct;

    if allow_byproduct
        && let Some(byproduct) = rule.byproduct
        && rule.byproduct_chance > Fixed64::ZERO
        && ctx.rng.roll_above(rule.byproduct_chance)
    {
        let multiplier = config.output_multiplier(registry.name(byproduct));
        let amount = floor_amount(amount_to_fixed64(rule.byproduct_amount).saturating_mul(multiplier));
        debug_log!(
            ctx.debug,
            ?entity,
            item = registry.name(byproduct),
            amount,
            "fuel byproduct"
        );
        let delivery = store_or_drop(ctx.host, ctx.registry, entity, byproduct, amount);
        report.record_delivery(byproduct, amount, delivery);
    }

    let usage = config.fuel_usage_multiplier;
    let Some(converter) = ctx.host.converter_mut(entity) else {
        return FuelOutcome::NotFuel;
    };
    let Some(stack) = converter.inventory.get_mut(slot) else {
        return FuelOutcome::NotFuel;
    };

    let (outcome, after) = if stack.amount <= usage {
        let Some(mut removed) = converter.inventory.take(slot) else {
            return FuelOutcome::NotFuel;
        };
        removed.amount = 0;
        (FuelOutcome::Exhausted, removed)
    } else {
        stack.amount -= usage;
        stack.fuel = rule.fuel_amount;
        stack.mark_dirty();
        (
            FuelOutcome::Replenished {
                remaining: stack.amount,
            },
            stack.clone(),
        )
    };

    ctx.hooks.after_fuel_consumed(entity, &after, rule);
    outcome
}
