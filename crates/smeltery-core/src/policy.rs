//! Conversion policy: decides per item and per tick whether a held stack converts.

use crate::fixed::Ticks;
use crate::item::ItemStack;
use crate::rates::ConverterConfig;
use crate::registry::ConversionRule;

/// Outcome of the allow/deny lists for an item kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// Explicitly allowed; bypasses the temperature gate.
    Allow,
    /// Explicitly denied; never converts.
    Deny,
    /// Neither list mentions the kind; normal gating applies.
    Unspecified,
}

/// Check the deny list, then the allow list.
pub fn is_eligible(item_name: &str, config: &ConverterConfig) -> Eligibility {
    if config.deny_list.contains(item_name) {
        Eligibility::Deny
    } else if config.allow_list.contains(item_name) {
        Eligibility::Allow
    } else {
        Eligibility::Unspecified
    }
}

/// Whether conversion logic runs at all on this tick.
pub fn is_smelting_tick(tick: Ticks, smelting_frequency: u32) -> bool {
    tick % Ticks::from(smelting_frequency.max(1)) == 0
}

/// Whether a rule with `cook_time` is due on this tick.
///
/// Only meaningful on smelting ticks; counts smelting cycles, not raw ticks.
pub fn is_cook_time_due(tick: Ticks, smelting_frequency: u32, cook_time: u32) -> bool {
    if cook_time == 0 {
        return true;
    }
    let cycle = tick / Ticks::from(smelting_frequency.max(1));
    cycle % Ticks::from(cook_time) == 0
}

/// Apply the temperature and cook-time gates to one stack.
///
/// Returns `true` when the stack should convert this tick. A stack that falls
/// out of its cooking band loses its cooking flag if the rule manages it.
pub fn passes_gates(
    stack: &mut ItemStack,
    rule: &ConversionRule,
    eligibility: Eligibility,
    tick: Ticks,
    smelting_frequency: u32,
) -> bool {
    match eligibility {
        Eligibility::Deny => return false,
        Eligibility::Unspecified if !rule.can_cook_at(stack.temperature) => {
            if rule.sets_cooking_flag {
                stack.set_cooking(false);
            }
            return false;
        }
        Eligibility::Allow | Eligibility::Unspecified => {}
    }

    is_cook_time_due(tick, smelting_frequency, rule.cook_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::Fixed64;
    use crate::id::ItemTypeId;

    fn rule(cook_time: u32, sets_flag: bool) -> ConversionRule {
        ConversionRule {
            min_temperature: Fixed64::from_num(100),
            max_temperature: Fixed64::from_num(1000),
            cook_time,
            becomes: None,
            amount_of_become: Fixed64::ONE,
            sets_cooking_flag: sets_flag,
        }
    }

    fn stack_at(temperature: f64) -> ItemStack {
        let mut s = ItemStack::new(ItemTypeId(0), 5);
        s.temperature = Fixed64::from_num(temperature);
        s
    }

    fn config_with(allow: &[&str], deny: &[&str]) -> ConverterConfig {
        ConverterConfig {
            allow_list: allow.iter().map(|s| s.to_string()).collect(),
            deny_list: deny.iter().map(|s| s.to_string()).collect(),
            ..ConverterConfig::default()
        }
    }

    #[test]
    fn deny_beats_allow() {
        let cfg = config_with(&["sulfur.ore"], &["sulfur.ore"]);
        assert_eq!(is_eligible("sulfur.ore", &cfg), Eligibility::Deny);
    }

    #[test]
    fn allow_and_unspecified() {
        let cfg = config_with(&["metal.ore"], &[]);
        assert_eq!(is_eligible("metal.ore", &cfg), Eligibility::Allow);
        assert_eq!(is_eligible("wood", &cfg), Eligibility::Unspecified);
    }

    #[test]
    fn smelting_ticks_every_third() {
        let ran: Vec<Ticks> = (0..12).filter(|&t| is_smelting_tick(t, 3)).collect();
        assert_eq!(ran, vec![0, 3, 6, 9]);
    }

    #[test]
    fn cook_time_restricts_cycles() {
        let ran: Vec<Ticks> = (0..19)
            .filter(|&t| is_smelting_tick(t, 3) && is_cook_time_due(t, 3, 2))
            .collect();
        assert_eq!(ran, vec![0, 6, 12, 18]);
    }

    #[test]
    fn out_of_band_clears_cooking_flag() {
        let mut stack = stack_at(20.0);
        stack.flags.cooking = true;
        assert!(!passes_gates(&mut stack, &rule(0, true), Eligibility::Unspecified, 0, 1));
        assert!(!stack.flags.cooking);
        assert!(stack.dirty);
    }

    #[test]
    fn out_of_band_leaves_flag_when_rule_does_not_manage_it() {
        let mut stack = stack_at(20.0);
        stack.flags.cooking = true;
        assert!(!passes_gates(&mut stack, &rule(0, false), Eligibility::Unspecified, 0, 1));
        assert!(stack.flags.cooking);
        assert!(!stack.dirty);
    }

    #[test]
    fn allow_bypasses_temperature() {
        let mut stack = stack_at(20.0);
        assert!(passes_gates(&mut stack, &rule(0, true), Eligibility::Allow, 0, 1));
    }

    #[test]
    fn allow_still_respects_cook_time() {
        let mut stack = stack_at(20.0);
        assert!(!passes_gates(&mut stack, &rule(2, false), Eligibility::Allow, 1, 1));
        assert!(passes_gates(&mut stack, &rule(2, false), Eligibility::Allow, 2, 1));
    }

    #[test]
    fn deny_never_passes() {
        let mut stack = stack_at(500.0);
        assert!(!passes_gates(&mut stack, &rule(0, true), Eligibility::Deny, 0, 1));
    }
}
