//! Serde data file structs for item definitions.
//!
//! An items file lists every item kind a host knows about, with an optional
//! fuel rule and an optional conversion rule. Items refer to each other by
//! name; the loader resolves names into registry ids.

use serde::Deserialize;

// ===========================================================================
// Items
// ===========================================================================

/// An item kind definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub name: String,
    #[serde(default)]
    pub fuel: Option<FuelData>,
    #[serde(default)]
    pub cookable: Option<CookableData>,
}

/// Fuel properties of an item.
#[derive(Debug, Clone, Deserialize)]
pub struct FuelData {
    /// Charge of one unit.
    pub amount: f64,
    #[serde(default)]
    pub byproduct: Option<String>,
    #[serde(default = "default_one")]
    pub byproduct_amount: u32,
    /// The byproduct roll must exceed this value. Zero disables the byproduct.
    #[serde(default)]
    pub byproduct_chance: f64,
}

/// Conversion properties of an item.
#[derive(Debug, Clone, Deserialize)]
pub struct CookableData {
    #[serde(default)]
    pub becomes: Option<String>,
    /// Output units per consumed unit.
    #[serde(default = "default_yield")]
    pub amount_of_become: f64,
    pub low_temp: f64,
    pub high_temp: f64,
    #[serde(default)]
    pub cook_time: u32,
    #[serde(default = "default_true")]
    pub sets_cooking_flag: bool,
}

fn default_one() -> u32 {
    1
}

fn default_yield() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

// ===========================================================================
// Tests
// ===========================================================================
