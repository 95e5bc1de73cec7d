//! Headless furnace example: one furnace smelting ore on wood.
//!
//! Builds a small item catalogue, places a furnace with wood and metal ore,
//! switches it on and runs ten seconds of game time, printing the inventory
//! after every tick. Set `RUST_LOG=smeltery_core=debug` to see the engine's
//! own diagnostics.
//!
//! Run with: `cargo run -p smeltery-core --example headless_furnace`

use std::sync::Arc;

use smeltery_core::engine::Engine;
use smeltery_core::fixed::Fixed64;
use smeltery_core::host::{ConverterEntity, Host};
use smeltery_core::id::*;
use smeltery_core::item::{DropPoint, Inventory, ItemStack};
use smeltery_core::registry::{ConversionRule, FuelRule, RegistryBuilder};
use smeltery_core::settings::Settings;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// A host with exactly one furnace.
struct World {
    furnace: ConverterEntity,
    dropped: Vec<ItemStack>,
}

const FURNACE: EntityId = EntityId(1);

impl Host for World {
    fn converter(&self, entity: EntityId) -> Option<&ConverterEntity> {
        (entity == FURNACE).then_some(&self.furnace)
    }

    fn converter_mut(&mut self, entity: EntityId) -> Option<&mut ConverterEntity> {
        (entity == FURNACE).then_some(&mut self.furnace)
    }

    fn managed_entities(&self) -> Vec<EntityId> {
        vec![FURNACE]
    }

    fn is_authorized(&self, _party: PartyId) -> bool {
        true
    }

    fn drop_at_location(&mut self, stack: ItemStack, _at: DropPoint) {
        self.dropped.push(stack);
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();

    // --- Item catalogue ---

    let mut b = RegistryBuilder::new();
    let wood = b.register_item("wood").unwrap();
    let charcoal = b.register_item("charcoal").unwrap();
    let ore = b.register_item("metal.ore").unwrap();
    let fragments = b.register_item("metal.fragments").unwrap();
    b.set_fuel(
        wood,
        FuelRule {
            fuel_amount: Fixed64::from_num(10),
            byproduct: Some(charcoal),
            byproduct_amount: 1,
            byproduct_chance: Fixed64::from_num(0.25),
        },
    )
    .unwrap();
    b.set_conversion(
        ore,
        ConversionRule {
            min_temperature: Fixed64::from_num(100),
            max_temperature: Fixed64::from_num(1200),
            cook_time: 0,
            becomes: Some(fragments),
            amount_of_become: Fixed64::ONE,
            sets_cooking_flag: true,
        },
    )
    .unwrap();
    let registry = b.build().unwrap();

    // --- Settings: a fast furnace that burns fuel quickly ---

    let mut settings = Settings::default();
    settings.use_permission = false;
    settings.debug = true;
    settings.speed_multipliers.insert("furnace".to_string(), 2.0);
    settings.fuel_speed_multipliers.insert("furnace".to_string(), 4.0);

    let mut engine = Engine::new(Arc::new(settings), Arc::new(registry));

    // --- World: one furnace ---

    let mut inventory = Inventory::new(6, 1000);
    inventory.put(SlotIndex(0), ItemStack::new(wood, 5).with_fuel(Fixed64::from_num(10)));
    inventory.put(SlotIndex(1), ItemStack::new(ore, 40));
    let mut world = World {
        furnace: ConverterEntity::new("furnace", PartyId(1), inventory),
        dropped: Vec::new(),
    };

    // --- Run ---

    let handled = engine.request_activation(&mut world, FURNACE, PartyId(1));
    println!("activation handled by engine: {handled}");

    let step = Fixed64::from_num(0.25);
    for _ in 0..40 {
        let result = engine.advance(&mut world, step);
        for (_, report) in result.ticks {
            let inv = &world.furnace.inventory;
            println!(
                "t={:>5}  wood={:>2}  ore={:>2}  fragments={:>2}  charcoal={:>2}  fuel_event={:?}",
                engine.now().to_string(),
                inv.quantity(wood),
                inv.quantity(ore),
                inv.quantity(fragments),
                inv.quantity(charcoal),
                report.fuel,
            );
        }
    }

    let restarted = engine.shutdown(&mut world);
    println!("handed back to native cooking: {restarted:?}");
    println!("dropped stacks: {}", world.dropped.len());
}
