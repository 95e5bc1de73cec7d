//! Rate resolver: turns the configuration snapshot into per-kind tunables.
//!
//! Each tunable falls back from the kind's own entry to the `"global"` entry
//! and finally to a neutral default. Missing entries are never an error.

use crate::fixed::{Fixed64, checked_div_64, checked_f64_to_fixed64, f64_to_fixed64};
use crate::settings::{GLOBAL_KEY, Settings, lookup};
use std::collections::{HashMap, HashSet};

/// Interval between ticks at speed multiplier 1.0, in seconds.
pub const BASE_INTERVAL: f64 = 0.5;

/// Resolved, immutable tunables for one converter.
#[derive(Debug, Clone, PartialEq)]
pub struct ConverterConfig {
    pub speed_multiplier: Fixed64,
    pub fuel_speed_multiplier: Fixed64,
    pub fuel_usage_multiplier: u32,
    /// Always at least 1.
    pub tick_frequency: u32,
    pub output_multipliers: HashMap<String, Fixed64>,
    pub allow_list: HashSet<String>,
    pub deny_list: HashSet<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            speed_multiplier: Fixed64::ONE,
            fuel_speed_multiplier: Fixed64::ONE,
            fuel_usage_multiplier: 1,
            tick_frequency: 1,
            output_multipliers: HashMap::new(),
            allow_list: HashSet::new(),
            deny_list: HashSet::new(),
        }
    }
}

impl ConverterConfig {
    /// Seconds between two ticks: `BASE_INTERVAL / speed_multiplier`.
    pub fn tick_interval(&self) -> Fixed64 {
        checked_div_64(f64_to_fixed64(BASE_INTERVAL), self.speed_multiplier).unwrap_or(Fixed64::MAX)
    }

    /// Output multiplier for an item name: its own entry, then `"global"`, then 1.0.
    pub fn output_multiplier(&self, item_name: &str) -> Fixed64 {
        self.output_multipliers
            .get(item_name)
            .or_else(|| self.output_multipliers.get(GLOBAL_KEY))
            .copied()
            .unwrap_or(Fixed64::ONE)
    }
}

/// Resolves [`ConverterConfig`]s against a borrowed settings snapshot.
#[derive(Debug, Clone, Copy)]
pub struct RateResolver<'a> {
    settings: &'a Settings,
}

impl<'a> RateResolver<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Resolve every tunable for a converter kind. Pure: the same kind and
    /// snapshot always yield the same config.
    pub fn resolve(&self, kind: &str) -> ConverterConfig {
        let s = self.settings;
        let neutral = ConverterConfig::default();

        // Values outside the fixed-point range resolve as if they were absent.
        let speed_multiplier = lookup(&s.speed_multipliers, kind)
            .and_then(|&v| checked_f64_to_fixed64(v))
            .filter(|v| *v > Fixed64::ZERO)
            .unwrap_or(neutral.speed_multiplier);

        // Fuel speed must be non-negative.
        let fuel_speed_multiplier = lookup(&s.fuel_speed_multipliers, kind)
            .and_then(|&v| checked_f64_to_fixed64(v))
            .filter(|v| *v >= Fixed64::ZERO)
            .unwrap_or(neutral.fuel_speed_multiplier);

        let fuel_usage_multiplier = lookup(&s.fuel_usage_multipliers, kind)
            .copied()
            .unwrap_or(neutral.fuel_usage_multiplier);

        let tick_frequency = lookup(&s.smelting_frequencies, kind)
            .copied()
            .unwrap_or(neutral.tick_frequency)
            .max(1);

        let output_multipliers = lookup(&s.output_multipliers, kind)
            .map(|table| {
                table
                    .iter()
                    .filter_map(|(name, &v)| Some((name.clone(), checked_f64_to_fixed64(v)?)))
                    .collect()
            })
            .unwrap_or_default();

        let to_set = |list: Option<&Vec<String>>| -> HashSet<String> {
            list.map(|l| l.iter().cloned().collect()).unwrap_or_default()
        };

        ConverterConfig {
            speed_multiplier,
            fuel_speed_multiplier,
            fuel_usage_multiplier,
            tick_frequency,
            output_multipliers,
            allow_list: to_set(lookup(&s.allow_lists, kind)),
            deny_list: to_set(lookup(&s.deny_lists, kind)),
        }
    }
}
