//! Item selection: which held stack burns, and which stacks may convert.

use crate::hooks::HookSet;
use crate::host::ConverterEntity;
use crate::id::{EntityId, SlotIndex};
use crate::registry::Registry;

/// Pick the fuel slot for this tick.
///
/// A hook override wins whenever it names an occupied slot. Otherwise the
/// first burnable stack in inventory order is used.
pub fn find_fuel(
    entity: EntityId,
    converter: &ConverterEntity,
    registry: &Registry,
    hooks: &mut HookSet,
) -> Option<SlotIndex> {
    if let Some(slot) = hooks.find_burnable(entity, &converter.inventory)
        && converter.inventory.get(slot).is_some()
    {
        return Some(slot);
    }

    converter
        .inventory
        .iter()
        .find(|(_, stack)| converter.is_burnable(registry, stack.item_type))
        .map(|(slot, _)| slot)
}

/// Occupied slots whose item kind has a conversion rule, in inventory order.
pub fn convertible_slots(converter: &ConverterEntity, registry: &Registry) -> Vec<SlotIndex> {
    converter
        .inventory
        .iter()
        .filter(|(_, stack)| registry.conversion_rule(stack.item_type).is_some())
        .map(|(slot, _)| slot)
        .collect()
}
