//! Smeltery Core -- a tick-driven conversion engine for fuel-burning converters.
//!
//! Each managed converter (furnace, campfire, refinery) burns fuel on a
//! repeating timer and turns raw items into outputs. Rates come from a
//! configuration snapshot resolved per converter kind with a `"global"`
//! fallback.
//!
//! # Tick Pipeline
//!
//! Every firing of a converter's timer runs [`controller::cook`]:
//!
//! 1. **Select fuel** -- hook override, else the first burnable stack.
//! 2. **Before-cook hooks** -- may suppress the rest of the tick.
//! 3. **Convert** -- on smelting ticks only, gated per item by the allow/deny
//!    lists, the temperature band and the cook time.
//! 4. **Flag inputs** -- stacks in the input slots are marked cooking.
//! 5. **Fixture** -- cook progress is forwarded to any auxiliary fixture.
//! 6. **Burn fuel** -- deplete the charge; a burnt-out unit goes to the fuel
//!    consumer, which may yield a byproduct.
//! 7. **Bookkeeping** -- increment the tick counter and notify after-cook hooks.
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- Converter lifecycle and timer dispatch.
//! - [`host::Host`] -- Everything the engine needs from the world.
//! - [`rates::RateResolver`] -- Per-kind tunables with `"global"` fallback.
//! - [`policy::Eligibility`] -- Allow / Deny / Unspecified.
//! - [`hooks::ConverterHooks`] -- Typed extension points with no-op defaults.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic math.

/// `tracing::debug!` gated on the configuration's debug toggle.
macro_rules! debug_log {
    ($enabled:expr, $($arg:tt)+) => {
        if $enabled {
            ::tracing::debug!($($arg)+);
        }
    };
}
pub(crate) use debug_log;

pub mod controller;
pub mod engine;
pub mod fixed;
pub mod fuel;
pub mod hooks;
pub mod host;
pub mod id;
pub mod item;
pub mod policy;
pub mod rates;
pub mod registry;
pub mod rng;
pub mod selector;
pub mod settings;
pub mod timer;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
