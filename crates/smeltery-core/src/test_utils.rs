//! Shared test helpers for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::engine::Engine;
use crate::fixed::Fixed64;
use crate::host::{ConverterEntity, Host};
use crate::id::*;
use crate::item::{DropPoint, Inventory, ItemStack};
use crate::registry::{ConversionRule, FuelRule, Registry, RegistryBuilder};
use crate::settings::Settings;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Registry
// ===========================================================================

/// A small item catalogue: fuels, ores, food and oil.
///
/// | item          | fuel | converts to       | band       | cook time | yield |
/// |---------------|------|-------------------|------------|-----------|-------|
/// | wood          | 10   | -                 |            |           |       |
/// | lowgradefuel  | 10   | -                 |            |           |       |
/// | metal.ore     | -    | metal.fragments   | 100..1200  | 0         | 1     |
/// | sulfur.ore    | -    | sulfur            | 100..1200  | 0         | 1     |
/// | meat.raw      | -    | meat.cooked       | 100..250   | 2         | 1     |
/// | crude.oil     | -    | lowgradefuel      | 100..1200  | 0         | 0.5   |
///
/// Wood leaves 1 charcoal behind when the roll beats 0.5.
pub fn smelting_registry() -> Registry {
    let mut b = RegistryBuilder::new();
    let id = |b: &mut RegistryBuilder, name: &str| b.register_item(name).unwrap();

    let wood = id(&mut b, "wood");
    let charcoal = id(&mut b, "charcoal");
    let low_grade = id(&mut b, "lowgradefuel");
    let metal_ore = id(&mut b, "metal.ore");
    let metal_fragments = id(&mut b, "metal.fragments");
    let sulfur_ore = id(&mut b, "sulfur.ore");
    let sulfur = id(&mut b, "sulfur");
    let meat_raw = id(&mut b, "meat.raw");
    let meat_cooked = id(&mut b, "meat.cooked");
    let crude = id(&mut b, "crude.oil");

    b.set_fuel(
        wood,
        FuelRule {
            fuel_amount: fixed(10.0),
            byproduct: Some(charcoal),
            byproduct_amount: 1,
            byproduct_chance: fixed(0.5),
        },
    )
    .unwrap();
    b.set_fuel(
        low_grade,
        FuelRule {
            fuel_amount: fixed(10.0),
            byproduct: None,
            byproduct_amount: 0,
            byproduct_chance: Fixed64::ZERO,
        },
    )
    .unwrap();

    b.set_conversion(metal_ore, conversion(100.0, 1200.0, 0, metal_fragments, 1.0))
        .unwrap();
    b.set_conversion(sulfur_ore, conversion(100.0, 1200.0, 0, sulfur, 1.0))
        .unwrap();
    b.set_conversion(meat_raw, conversion(100.0, 250.0, 2, meat_cooked, 1.0))
        .unwrap();
    b.set_conversion(crude, conversion(100.0, 1200.0, 0, low_grade, 0.5))
        .unwrap();

    b.build().unwrap()
}

pub fn conversion(min: f64, max: f64, cook_time: u32, becomes: ItemTypeId, yield_per_unit: f64) -> ConversionRule {
    ConversionRule {
        min_temperature: fixed(min),
        max_temperature: fixed(max),
        cook_time,
        becomes: Some(becomes),
        amount_of_become: fixed(yield_per_unit),
        sets_cooking_flag: true,
    }
}

fn lookup(reg: &Registry, name: &str) -> ItemTypeId {
    reg.item_id(name)
        .unwrap_or_else(|| panic!("test registry has no item {name}"))
}

pub fn wood(reg: &Registry) -> ItemTypeId {
    lookup(reg, "wood")
}
pub fn charcoal(reg: &Registry) -> ItemTypeId {
    lookup(reg, "charcoal")
}
pub fn low_grade_fuel(reg: &Registry) -> ItemTypeId {
    lookup(reg, "lowgradefuel")
}
pub fn metal_ore(reg: &Registry) -> ItemTypeId {
    lookup(reg, "metal.ore")
}
pub fn metal_fragments(reg: &Registry) -> ItemTypeId {
    lookup(reg, "metal.fragments")
}
pub fn sulfur_ore(reg: &Registry) -> ItemTypeId {
    lookup(reg, "sulfur.ore")
}
pub fn sulfur(reg: &Registry) -> ItemTypeId {
    lookup(reg, "sulfur")
}
pub fn meat_raw(reg: &Registry) -> ItemTypeId {
    lookup(reg, "meat.raw")
}
pub fn meat_cooked(reg: &Registry) -> ItemTypeId {
    lookup(reg, "meat.cooked")
}
pub fn crude_oil(reg: &Registry) -> ItemTypeId {
    lookup(reg, "crude.oil")
}

// ===========================================================================
// Converters
// ===========================================================================

pub fn owner() -> PartyId {
    PartyId(1)
}

/// A furnace owned by [`owner()`] with `slots` slots, all of them input slots.
pub fn make_furnace(slots: usize) -> ConverterEntity {
    ConverterEntity::new("furnace", owner(), Inventory::new(slots, 1000))
}

/// Fuel stack with the nominal charge of `item_type`.
pub fn fuel_stack(reg: &Registry, item_type: ItemTypeId, amount: u32) -> ItemStack {
    let charge = reg
        .fuel_rule(item_type)
        .map(|r| r.fuel_amount)
        .unwrap_or(Fixed64::ZERO);
    ItemStack::new(item_type, amount).with_fuel(charge)
}

// ===========================================================================
// Settings & engine
// ===========================================================================

/// Settings with every table empty except the given global overrides.
pub fn settings_with(edit: impl FnOnce(&mut Settings)) -> Settings {
    let mut s = Settings::empty();
    edit(&mut s);
    s
}

/// A one-entry `{ "global": v }` table.
pub fn global<V>(v: V) -> BTreeMap<String, V> {
    BTreeMap::from([(crate::settings::GLOBAL_KEY.to_string(), v)])
}

pub fn make_engine(settings: Settings) -> Engine {
    Engine::with_seed(Arc::new(settings), Arc::new(smelting_registry()), 7)
}

// ===========================================================================
// TestHost
// ===========================================================================

/// In-memory host that records every outward call.
#[derive(Debug, Default)]
pub struct TestHost {
    pub converters: BTreeMap<EntityId, ConverterEntity>,
    pub authorized: HashSet<PartyId>,
    /// Parties without building privilege anywhere.
    pub no_build: HashSet<PartyId>,
    pub dropped: Vec<(ItemStack, DropPoint)>,
    pub attachment_temperatures: Vec<(EntityId, Fixed64)>,
    /// Fixture reported for every converter, if any.
    pub fixture: Option<FixtureId>,
    pub fixture_cook_seconds: Fixed64,
    pub native_restarts: Vec<EntityId>,
}

impl TestHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, id: u64, converter: ConverterEntity) -> EntityId {
        let entity = EntityId(id);
        self.converters.insert(entity, converter);
        entity
    }

    pub fn despawn(&mut self, entity: EntityId) -> Option<ConverterEntity> {
        self.converters.remove(&entity)
    }

    pub fn furnace(&self, entity: EntityId) -> &ConverterEntity {
        &self.converters[&entity]
    }

    pub fn furnace_mut(&mut self, entity: EntityId) -> &mut ConverterEntity {
        self.converters
            .get_mut(&entity)
            .expect("test entity exists")
    }

    pub fn stack(&self, entity: EntityId, slot: u32) -> Option<&ItemStack> {
        self.furnace(entity).inventory.get(SlotIndex(slot))
    }

    pub fn quantity(&self, entity: EntityId, item_type: ItemTypeId) -> u32 {
        self.furnace(entity).inventory.quantity(item_type)
    }

    pub fn dropped_quantity(&self, item_type: ItemTypeId) -> u32 {
        self.dropped
            .iter()
            .filter(|(s, _)| s.item_type == item_type)
            .map(|(s, _)| s.amount)
            .sum()
    }
}

impl Host for TestHost {
    fn converter(&self, entity: EntityId) -> Option<&ConverterEntity> {
        self.converters.get(&entity)
    }

    fn converter_mut(&mut self, entity: EntityId) -> Option<&mut ConverterEntity> {
        self.converters.get_mut(&entity)
    }

    fn managed_entities(&self) -> Vec<EntityId> {
        self.converters.keys().copied().collect()
    }

    fn is_authorized(&self, party: PartyId) -> bool {
        self.authorized.contains(&party)
    }

    fn can_build(&self, _entity: EntityId, party: PartyId) -> bool {
        !self.no_build.contains(&party)
    }

    fn drop_at_location(&mut self, stack: ItemStack, at: DropPoint) {
        self.dropped.push((stack, at));
    }

    fn update_attachment_temperature(&mut self, entity: EntityId, temperature: Fixed64) {
        self.attachment_temperatures.push((entity, temperature));
    }

    fn send_fixture_cook(&mut self, _entity: EntityId, seconds: Fixed64) -> Option<FixtureId> {
        let fixture = self.fixture?;
        self.fixture_cook_seconds += seconds;
        Some(fixture)
    }

    fn restart_native_cooking(&mut self, entity: EntityId) {
        self.native_restarts.push(entity);
    }
}
