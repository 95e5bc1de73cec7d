//! Extension hooks that let third parties observe or veto converter phases.
//!
//! Implement [`ConverterHooks`] and override only the methods you need; every
//! default is a no-op that neither overrides nor suppresses anything. Hooks
//! registered in a [`HookSet`] run in registration order.

use crate::controller::ConverterState;
use crate::id::{EntityId, FixtureId, SlotIndex};
use crate::item::{Inventory, ItemStack};
use crate::registry::FuelRule;

/// Whether a hook lets the current phase run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookVerdict {
    #[default]
    Continue,
    Suppress,
}

/// Interception points around the tick and fuel phases.
pub trait ConverterHooks: std::fmt::Debug {
    /// Supply a fuel slot instead of the default scan.
    fn on_find_burnable(&mut self, entity: EntityId, inventory: &Inventory) -> Option<SlotIndex> {
        let _ = (entity, inventory);
        None
    }

    /// Called before each tick's work. `Suppress` skips the rest of the tick.
    fn on_before_cook(&mut self, state: &ConverterState, fuel: Option<&ItemStack>) -> HookVerdict {
        let _ = (state, fuel);
        HookVerdict::Continue
    }

    /// Called after each completed tick.
    fn on_after_cook(
        &mut self,
        state: &ConverterState,
        fuel: Option<&ItemStack>,
        fixture: Option<FixtureId>,
    ) {
        let _ = (state, fuel, fixture);
    }

    /// Called when a fuel unit burns out. `Suppress` vetoes byproduct and stack update.
    fn on_before_fuel_consume(
        &mut self,
        entity: EntityId,
        fuel: &ItemStack,
        rule: &FuelRule,
    ) -> HookVerdict {
        let _ = (entity, fuel, rule);
        HookVerdict::Continue
    }

    /// Called after a burnt-out unit was handled. `fuel.amount == 0` means the
    /// stack was removed.
    fn on_after_fuel_consumed(&mut self, entity: EntityId, fuel: &ItemStack, rule: &FuelRule) {
        let _ = (entity, fuel, rule);
    }
}

/// Ordered collection of registered hooks.
#[derive(Debug, Default)]
pub struct HookSet {
    hooks: Vec<Box<dyn ConverterHooks>>,
}

impl HookSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: Box<dyn ConverterHooks>) {
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// First hook that names a fuel slot wins.
    pub fn find_burnable(&mut self, entity: EntityId, inventory: &Inventory) -> Option<SlotIndex> {
        self.hooks
            .iter_mut()
            .find_map(|h| h.on_find_burnable(entity, inventory))
    }

    /// Every hook is consulted; any `Suppress` suppresses.
    pub fn before_cook(&mut self, state: &ConverterState, fuel: Option<&ItemStack>) -> HookVerdict {
        fold_verdicts(self.hooks.iter_mut().map(|h| h.on_before_cook(state, fuel)))
    }

    pub fn after_cook(
        &mut self,
        state: &ConverterState,
        fuel: Option<&ItemStack>,
        fixture: Option<FixtureId>,
    ) {
        for h in &mut self.hooks {
            h.on_after_cook(state, fuel, fixture);
        }
    }

    pub fn before_fuel_consume(
        &mut self,
        entity: EntityId,
        fuel: &ItemStack,
        rule: &FuelRule,
    ) -> HookVerdict {
        fold_verdicts(
            self.hooks
                .iter_mut()
                .map(|h| h.on_before_fuel_consume(entity, fuel, rule)),
        )
    }

    pub fn after_fuel_consumed(&mut self, entity: EntityId, fuel: &ItemStack, rule: &FuelRule) {
        for h in &mut self.hooks {
            h.on_after_fuel_consumed(entity, fuel, rule);
        }
    }
}

// Collects every verdict so all observers see the call, even after a veto.
fn fold_verdicts(verdicts: impl Iterator<Item = HookVerdict>) -> HookVerdict {
    verdicts.fold(HookVerdict::Continue, |acc, v| {
        if v == HookVerdict::Suppress {
            HookVerdict::Suppress
        } else {
            acc
        }
    })
}
