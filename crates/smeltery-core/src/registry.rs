//! Item kind definitions with their fuel and conversion rules, frozen after build.

use crate::fixed::Fixed64;
use crate::id::ItemTypeId;
use std::collections::HashMap;

/// How an item burns as fuel.
#[derive(Debug, Clone, PartialEq)]
pub struct FuelRule {
    /// Nominal charge of one unit; restored each time a unit is used up.
    pub fuel_amount: Fixed64,
    /// Item left behind when a unit burns out (charcoal from wood).
    pub byproduct: Option<ItemTypeId>,
    pub byproduct_amount: u32,
    /// Threshold the byproduct roll must exceed.
    pub byproduct_chance: Fixed64,
}

/// How an item converts when held at the right temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRule {
    pub min_temperature: Fixed64,
    pub max_temperature: Fixed64,
    /// Conversion cadence in smelting cycles; 0 converts every cycle.
    pub cook_time: u32,
    pub becomes: Option<ItemTypeId>,
    /// Output units per consumed unit, before multipliers.
    pub amount_of_become: Fixed64,
    pub sets_cooking_flag: bool,
}

impl ConversionRule {
    /// Whether `temperature` falls strictly inside the cooking band.
    pub fn can_cook_at(&self, temperature: Fixed64) -> bool {
        temperature > self.min_temperature && temperature < self.max_temperature
    }
}

/// An item kind definition in the registry.
#[derive(Debug, Clone)]
pub struct ItemDef {
    pub name: String,
    pub fuel: Option<FuelRule>,
    pub conversion: Option<ConversionRule>,
}

/// Errors raised while building the registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate item name: {0}")]
    DuplicateName(String),
    #[error("invalid item reference: {0:?}")]
    InvalidItemRef(ItemTypeId),
}

/// Builder for constructing an immutable Registry.
///
/// Items are registered first, then rules are attached; rules may reference
/// any item registered before `build()`.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    items: Vec<ItemDef>,
    name_to_id: HashMap<String, ItemTypeId>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item kind. Returns its ID.
    pub fn register_item(&mut self, name: &str) -> Result<ItemTypeId, RegistryError> {
        if self.name_to_id.contains_key(name) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        let id = ItemTypeId(self.items.len() as u32);
        self.items.push(ItemDef {
            name: name.to_string(),
            fuel: None,
            conversion: None,
        });
        self.name_to_id.insert(name.to_string(), id);
        Ok(id)
    }

    /// Attach a fuel rule to a registered item.
    pub fn set_fuel(&mut self, item: ItemTypeId, rule: FuelRule) -> Result<(), RegistryError> {
        let def = self
            .items
            .get_mut(item.0 as usize)
            .ok_or(RegistryError::InvalidItemRef(item))?;
        def.fuel = Some(rule);
        Ok(())
    }

    /// Attach a conversion rule to a registered item.
    pub fn set_conversion(
        &mut self,
        item: ItemTypeId,
        rule: ConversionRule,
    ) -> Result<(), RegistryError> {
        let def = self
            .items
            .get_mut(item.0 as usize)
            .ok_or(RegistryError::InvalidItemRef(item))?;
        def.conversion = Some(rule);
        Ok(())
    }

    /// Lookup item ID by name.
    pub fn item_id(&self, name: &str) -> Option<ItemTypeId> {
        self.name_to_id.get(name).copied()
    }

    /// Finalize and build the immutable registry.
    pub fn build(self) -> Result<Registry, RegistryError> {
        let count = self.items.len();
        let check = |id: Option<ItemTypeId>| match id {
            Some(id) if id.0 as usize >= count => Err(RegistryError::InvalidItemRef(id)),
            _ => Ok(()),
        };
        for def in &self.items {
            check(def.fuel.as_ref().and_then(|f| f.byproduct))?;
            check(def.conversion.as_ref().and_then(|c| c.becomes))?;
        }

        Ok(Registry {
            items: self.items,
            name_to_id: self.name_to_id,
        })
    }
}

/// Immutable item-definition data. Frozen after build(). Thread-safe to share.
#[derive(Debug)]
pub struct Registry {
    items: Vec<ItemDef>,
    name_to_id: HashMap<String, ItemTypeId>,
}

impl Registry {
    pub fn get(&self, id: ItemTypeId) -> Option<&ItemDef> {
        self.items.get(id.0 as usize)
    }

    pub fn item_id(&self, name: &str) -> Option<ItemTypeId> {
        self.name_to_id.get(name).copied()
    }

    /// Short name of an item kind, or `""` for unknown IDs.
    pub fn name(&self, id: ItemTypeId) -> &str {
        self.get(id).map(|d| d.name.as_str()).unwrap_or("")
    }

    pub fn fuel_rule(&self, id: ItemTypeId) -> Option<&FuelRule> {
        self.get(id).and_then(|d| d.fuel.as_ref())
    }

    pub fn conversion_rule(&self, id: ItemTypeId) -> Option<&ConversionRule> {
        self.get(id).and_then(|d| d.conversion.as_ref())
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}
