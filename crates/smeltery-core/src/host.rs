//! Contract between the engine and the host world that owns converter entities.
//!
//! The host owns entity lifetimes, inventories, permissions and world
//! placement. The engine only reaches them through [`Host`].

use crate::fixed::Fixed64;
use crate::id::{EntityId, FixtureId, ItemTypeId, PartyId};
use crate::item::{DropPoint, Inventory, ItemStack};
use crate::registry::Registry;
use std::ops::Range;

/// Temperature at which fuel burns at its nominal rate.
pub const REFERENCE_TEMPERATURE: f64 = 200.0;

/// Host-side data of one converter entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ConverterEntity {
    /// Kind name used for configuration lookup (e.g. `"furnace"`).
    pub kind: String,
    pub owner: PartyId,
    /// Switched on, either by the engine or by the host's own cooking routine.
    pub on: bool,
    pub cooking_temperature: Fixed64,
    /// Slots whose stacks are flagged as cooking on every tick.
    pub input_slots: Range<u32>,
    /// Units consumed per conversion.
    pub smelting_speed: u32,
    pub allow_byproduct: bool,
    /// Only this kind burns here; `None` accepts any fuel.
    pub fuel_type: Option<ItemTypeId>,
    /// Lanterns and similar fixtures are never managed.
    pub is_light_source: bool,
    /// Toggling requires building privilege at the entity's location.
    pub needs_privilege: bool,
    pub inventory: Inventory,
}

impl ConverterEntity {
    pub fn new(kind: &str, owner: PartyId, inventory: Inventory) -> Self {
        let slots = inventory.slot_count() as u32;
        Self {
            kind: kind.to_string(),
            owner,
            on: false,
            cooking_temperature: Fixed64::from_num(REFERENCE_TEMPERATURE),
            input_slots: 0..slots,
            smelting_speed: 1,
            allow_byproduct: true,
            fuel_type: None,
            is_light_source: false,
            needs_privilege: false,
            inventory,
        }
    }

    /// Whether a stack of `item_type` can burn in this converter.
    pub fn is_burnable(&self, registry: &Registry, item_type: ItemTypeId) -> bool {
        registry.fuel_rule(item_type).is_some()
            && self.fuel_type.is_none_or(|fuel| fuel == item_type)
    }
}

/// Services the engine requires from the surrounding world.
///
/// Defaults cover hosts that keep converters in memory and have no
/// attachments or native cooking routine.
pub trait Host {
    fn converter(&self, entity: EntityId) -> Option<&ConverterEntity>;

    fn converter_mut(&mut self, entity: EntityId) -> Option<&mut ConverterEntity>;

    /// All converters that exist right now. Used once, at startup.
    fn managed_entities(&self) -> Vec<EntityId>;

    /// Whether `party` holds the permission to use accelerated converters.
    fn is_authorized(&self, party: PartyId) -> bool;

    /// Whether `party` may build where `entity` stands.
    fn can_build(&self, entity: EntityId, party: PartyId) -> bool {
        let _ = (entity, party);
        true
    }

    /// Create a new stack. `None` when nothing should be created.
    fn create_item_stack(&mut self, item_type: ItemTypeId, amount: u32) -> Option<ItemStack> {
        (amount > 0).then(|| ItemStack::new(item_type, amount))
    }

    /// Move a stack into the converter's storage, handing it back if it does not fit.
    fn add_to_storage(&mut self, entity: EntityId, stack: ItemStack) -> Result<(), ItemStack> {
        match self.converter_mut(entity) {
            Some(converter) => converter.inventory.insert(stack),
            None => Err(stack),
        }
    }

    /// Spawn a stack in the world.
    fn drop_at_location(&mut self, stack: ItemStack, at: DropPoint);

    /// Carry the converter temperature onto attached heat consumers.
    fn update_attachment_temperature(&mut self, entity: EntityId, temperature: Fixed64) {
        let _ = (entity, temperature);
    }

    /// Forward cook progress to an auxiliary fixture, returning it if one is attached.
    fn send_fixture_cook(&mut self, entity: EntityId, seconds: Fixed64) -> Option<FixtureId> {
        let _ = (entity, seconds);
        None
    }

    /// Hand a converter back to the host's own cooking routine.
    fn restart_native_cooking(&mut self, entity: EntityId) {
        let _ = entity;
    }
}

/// Where a produced stack ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Stored,
    Dropped,
    /// Nothing was created (zero amount, or the host declined).
    Nothing,
}

/// Create `amount` of `item_type` and store it, dropping it at the
/// converter's drop point when storage is full.
///
/// Fuel items are created with the nominal charge of their kind.
pub fn store_or_drop<H: Host + ?Sized>(
    host: &mut H,
    registry: &Registry,
    entity: EntityId,
    item_type: ItemTypeId,
    amount: u32,
) -> Delivery {
    if amount == 0 {
        return Delivery::Nothing;
    }
    let Some(mut stack) = host.create_item_stack(item_type, amount) else {
        return Delivery::Nothing;
    };
    if let Some(rule) = registry.fuel_rule(item_type) {
        stack.fuel = rule.fuel_amount;
    }
    match host.add_to_storage(entity, stack) {
        Ok(()) => Delivery::Stored,
        Err(rejected) => {
            let at = host
                .converter(entity)
                .map(|c| c.inventory.drop_point)
                .unwrap_or_default();
            host.drop_at_location(rejected, at);
            Delivery::Dropped
        }
    }
}
