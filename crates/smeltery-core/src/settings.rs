//! Configuration snapshot consumed by the rate resolver.
//!
//! Every table is keyed by converter kind (e.g. `"furnace"`) with the
//! reserved key [`GLOBAL_KEY`] as the fallback entry. Property names match
//! the persisted configuration file so existing files load unchanged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reserved table key used when a kind has no entry of its own.
pub const GLOBAL_KEY: &str = "global";

/// Immutable configuration snapshot. Build once, share by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "Use Permission")]
    pub use_permission: bool,

    #[serde(rename = "Speed Multipliers")]
    pub speed_multipliers: BTreeMap<String, f64>,

    #[serde(rename = "Fuel Usage Speed Multipliers")]
    pub fuel_speed_multipliers: BTreeMap<String, f64>,

    #[serde(rename = "Fuel Usage Multipliers")]
    pub fuel_usage_multipliers: BTreeMap<String, u32>,

    /// Kind -> (item name -> multiplier). The inner map has its own `"global"` key.
    #[serde(rename = "Output Multipliers")]
    pub output_multipliers: BTreeMap<String, BTreeMap<String, f64>>,

    #[serde(rename = "Whitelist")]
    pub allow_lists: BTreeMap<String, Vec<String>>,

    #[serde(rename = "Blacklist")]
    pub deny_lists: BTreeMap<String, Vec<String>>,

    #[serde(rename = "Smelting Frequencies (Smelt items every N smelting ticks)")]
    pub smelting_frequencies: BTreeMap<String, u32>,

    #[serde(rename = "Debug")]
    pub debug: bool,
}

/// `{ "global": v, "furnace.shortname": v }`, the shape shipped in fresh config files.
fn sample_table<V: Clone>(v: V) -> BTreeMap<String, V> {
    BTreeMap::from([
        (GLOBAL_KEY.to_string(), v.clone()),
        ("furnace.shortname".to_string(), v),
    ])
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_permission: true,
            speed_multipliers: sample_table(1.0),
            fuel_speed_multipliers: sample_table(1.0),
            fuel_usage_multipliers: sample_table(1),
            output_multipliers: BTreeMap::from([
                (
                    GLOBAL_KEY.to_string(),
                    BTreeMap::from([(GLOBAL_KEY.to_string(), 1.0)]),
                ),
                (
                    "furnace.shortname".to_string(),
                    BTreeMap::from([("item.shortname".to_string(), 1.0)]),
                ),
            ]),
            allow_lists: sample_table(vec!["item.shortname".to_string()]),
            deny_lists: sample_table(vec!["item.shortname".to_string()]),
            smelting_frequencies: sample_table(1),
            debug: false,
        }
    }
}

impl Settings {
    /// A snapshot with every table empty, so all kinds resolve to neutral defaults.
    pub fn empty() -> Self {
        Self {
            use_permission: false,
            speed_multipliers: BTreeMap::new(),
            fuel_speed_multipliers: BTreeMap::new(),
            fuel_usage_multipliers: BTreeMap::new(),
            output_multipliers: BTreeMap::new(),
            allow_lists: BTreeMap::new(),
            deny_lists: BTreeMap::new(),
            smelting_frequencies: BTreeMap::new(),
            debug: false,
        }
    }
}

/// Look up `kind`, then [`GLOBAL_KEY`].
pub(crate) fn lookup<'a, V>(table: &'a BTreeMap<String, V>, kind: &str) -> Option<&'a V> {
    table.get(kind).or_else(|| table.get(GLOBAL_KEY))
}
