use crate::fixed::Fixed64;
use crate::id::{ItemTypeId, SlotIndex};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Per-stack boolean flags that hosts render (flames, bubbling pots).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFlags {
    /// The stack is being processed.
    pub cooking: bool,
    /// The stack is burning as fuel.
    pub on_fire: bool,
}

/// A stack of one item kind held in a converter's inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item_type: ItemTypeId,
    pub amount: u32,
    /// Remaining burn charge of the top unit. Meaningful for fuel only.
    #[serde(default)]
    pub fuel: Fixed64,
    /// Current temperature. Set from the container on insertion.
    #[serde(default)]
    pub temperature: Fixed64,
    #[serde(default)]
    pub flags: ItemFlags,
    /// Set whenever the core mutates the stack; hosts clear it after syncing clients.
    #[serde(skip)]
    pub dirty: bool,
}

impl ItemStack {
    pub fn new(item_type: ItemTypeId, amount: u32) -> Self {
        Self {
            item_type,
            amount,
            fuel: Fixed64::ZERO,
            temperature: Fixed64::ZERO,
            flags: ItemFlags::default(),
            dirty: false,
        }
    }

    /// A fuel stack whose top unit carries `charge`.
    pub fn with_fuel(mut self, charge: Fixed64) -> Self {
        self.fuel = charge;
        self
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Set the cooking flag, marking the stack dirty only on change.
    pub fn set_cooking(&mut self, value: bool) {
        if self.flags.cooking != value {
            self.flags.cooking = value;
            self.mark_dirty();
        }
    }

    /// Set the on-fire flag, marking the stack dirty only on change.
    pub fn set_on_fire(&mut self, value: bool) {
        if self.flags.on_fire != value {
            self.flags.on_fire = value;
            self.mark_dirty();
        }
    }
}

/// Where items that do not fit are dropped, and with what initial velocity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DropPoint {
    pub position: [Fixed64; 3],
    pub velocity: [Fixed64; 3],
}

/// Slot-addressed container for a converter.
///
/// Each slot holds at most one stack. Stacks of the same kind merge up to
/// `max_stack`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    slots: Vec<Option<ItemStack>>,
    /// Largest amount a single stack may hold.
    pub max_stack: u32,
    /// Working temperature of the container.
    pub temperature: Fixed64,
    pub drop_point: DropPoint,
}

impl Inventory {
    pub fn new(slot_count: usize, max_stack: u32) -> Self {
        Self {
            slots: vec![None; slot_count],
            max_stack: max_stack.max(1),
            temperature: Fixed64::ZERO,
            drop_point: DropPoint::default(),
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, slot: SlotIndex) -> Option<&ItemStack> {
        self.slots.get(slot.0 as usize).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, slot: SlotIndex) -> Option<&mut ItemStack> {
        self.slots.get_mut(slot.0 as usize).and_then(Option::as_mut)
    }

    /// Occupied slots in inventory order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotIndex, &ItemStack)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|stack| (SlotIndex(i as u32), stack)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SlotIndex, &mut ItemStack)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, s)| s.as_mut().map(|stack| (SlotIndex(i as u32), stack)))
    }

    /// Indices of all occupied slots, snapshotted so callers may mutate while walking.
    pub fn occupied(&self) -> Vec<SlotIndex> {
        self.iter().map(|(slot, _)| slot).collect()
    }

    /// Place a stack directly in a slot, replacing whatever was there.
    pub fn put(&mut self, slot: SlotIndex, mut stack: ItemStack) -> Option<ItemStack> {
        stack.temperature = self.temperature;
        let cell = self.slots.get_mut(slot.0 as usize)?;
        cell.replace(stack)
    }

    /// Remove and return the stack in a slot.
    pub fn take(&mut self, slot: SlotIndex) -> Option<ItemStack> {
        self.slots.get_mut(slot.0 as usize).and_then(Option::take)
    }

    /// Insert a stack, merging into same-kind stacks first and then filling
    /// the first empty slot. On failure the untouched remainder is handed back.
    pub fn insert(&mut self, mut stack: ItemStack) -> Result<(), ItemStack> {
        let max_stack = self.max_stack;
        if max_stack == 0 {
            return Err(stack);
        }
        for existing in self.slots.iter_mut().flatten() {
            if stack.amount == 0 {
                break;
            }
            if existing.item_type != stack.item_type || existing.amount >= max_stack {
                continue;
            }
            let moved = stack.amount.min(max_stack - existing.amount);
            existing.amount += moved;
            existing.mark_dirty();
            stack.amount -= moved;
        }

        while stack.amount > 0 {
            let Some(cell) = self.slots.iter_mut().find(|s| s.is_none()) else {
                return Err(stack);
            };
            let moved = stack.amount.min(max_stack);
            let mut placed = stack.clone();
            placed.amount = moved;
            placed.temperature = self.temperature;
            placed.dirty = true;
            *cell = Some(placed);
            stack.amount -= moved;
        }

        Ok(())
    }

    /// Total amount of one item kind across all slots.
    pub fn quantity(&self, item_type: ItemTypeId) -> u32 {
        self.iter()
            .filter(|(_, s)| s.item_type == item_type)
            .map(|(_, s)| s.amount)
            .sum()
    }

    /// Change the container temperature and carry it onto every held stack.
    pub fn set_temperature(&mut self, temperature: Fixed64) {
        self.temperature = temperature;
        for stack in self.slots.iter_mut().flatten() {
            stack.temperature = temperature;
        }
    }

    /// Slots in `range` that are currently occupied.
    pub fn occupied_in(&self, range: Range<u32>) -> Vec<SlotIndex> {
        self.iter()
            .filter(|(slot, _)| range.contains(&slot.0))
            .map(|(slot, _)| slot)
            .collect()
    }
}
