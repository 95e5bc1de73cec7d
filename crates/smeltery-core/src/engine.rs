//! The tick engine: converter lifecycle and timer dispatch.
//!
//! The engine keeps one [`Controller`] per observed converter, keyed by
//! entity. Activation resolves nothing new; the config was resolved when the
//! converter was first observed. Each activation starts a fresh
//! [`ConverterState`] so counters never carry over from a previous session.

use crate::controller::{self, Controller, CookContext, CookReport, ConverterState, Phase};
use crate::debug_log;
use crate::fixed::Fixed64;
use crate::hooks::{ConverterHooks, HookSet};
use crate::host::Host;
use crate::id::{EntityId, PartyId, TimerHandle};
use crate::rates::{ConverterConfig, RateResolver};
use crate::registry::Registry;
use crate::rng::SimRng;
use crate::settings::Settings;
use crate::timer::{TimerKind, TimerQueue};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Delay before adopted converters are started, in seconds.
pub const ADOPTION_DELAY: f64 = 1.0;

/// Errors from engine operations that name an entity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("host has no converter {0:?}")]
    UnknownEntity(EntityId),
}

/// Result of an [`Engine::advance`] call.
#[derive(Debug, Default)]
pub struct AdvanceResult {
    /// Converter ticks executed, in firing order.
    pub ticks: Vec<(EntityId, CookReport)>,
    /// Adopted converters started by their deferred timer.
    pub started: Vec<EntityId>,
}

/// Drives every managed converter of one host.
#[derive(Debug)]
pub struct Engine {
    settings: Arc<Settings>,
    registry: Arc<Registry>,
    hooks: HookSet,
    timers: TimerQueue,
    controllers: BTreeMap<EntityId, Controller>,
    rng: SimRng,
}

impl Engine {
    pub fn new(settings: Arc<Settings>, registry: Arc<Registry>) -> Self {
        Self {
            settings,
            registry,
            hooks: HookSet::new(),
            timers: TimerQueue::new(),
            controllers: BTreeMap::new(),
            rng: SimRng::default(),
        }
    }

    /// Like [`Engine::new`] with an explicit byproduct RNG seed.
    pub fn with_seed(settings: Arc<Settings>, registry: Arc<Registry>, seed: u64) -> Self {
        Self {
            rng: SimRng::new(seed),
            ..Self::new(settings, registry)
        }
    }

    pub fn register_hook(&mut self, hook: Box<dyn ConverterHooks>) {
        self.hooks.register(hook);
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Current engine clock, in seconds.
    pub fn now(&self) -> Fixed64 {
        self.timers.now()
    }

    pub fn is_observed(&self, entity: EntityId) -> bool {
        self.controllers.contains_key(&entity)
    }

    pub fn is_active(&self, entity: EntityId) -> bool {
        self.controllers
            .get(&entity)
            .is_some_and(Controller::is_active)
    }

    /// Ticks completed since the converter was last activated.
    pub fn tick_count(&self, entity: EntityId) -> Option<u64> {
        self.controllers
            .get(&entity)
            .and_then(Controller::state)
            .map(ConverterState::tick_count)
    }

    pub fn config(&self, entity: EntityId) -> Option<&ConverterConfig> {
        self.controllers.get(&entity).map(|c| &c.config)
    }

    pub fn active_count(&self) -> usize {
        self.controllers.values().filter(|c| c.is_active()).count()
    }

    /// Whether `party` may use accelerated converters.
    pub fn can_use<H: Host + ?Sized>(&self, host: &H, party: PartyId) -> bool {
        !self.settings.use_permission || host.is_authorized(party)
    }

    // -----------------------------------------------------------------------
    // Host -> engine notifications
    // -----------------------------------------------------------------------

    /// Start managing a converter. Resolves its config once; observing an
    /// already-managed converter keeps the existing controller.
    pub fn observe<H: Host + ?Sized>(&mut self, host: &H, entity: EntityId) -> Result<(), EngineError> {
        if self.controllers.contains_key(&entity) {
            return Ok(());
        }
        let converter = host.converter(entity).ok_or(EngineError::UnknownEntity(entity))?;
        let config = RateResolver::new(&self.settings).resolve(&converter.kind);
        debug_log!(
            self.settings.debug,
            ?entity,
            kind = %converter.kind,
            interval = %config.tick_interval(),
            "observed converter"
        );
        self.controllers
            .insert(entity, Controller::new(&converter.kind, config));
        Ok(())
    }

    /// Adopt every converter that already exists and arm a deferred start for each.
    ///
    /// When the deferred timer fires, the converter starts if it still exists, is
    /// switched on, and its owner may use it. Returns the number adopted.
    pub fn adopt_existing<H: Host + ?Sized>(&mut self, host: &H) -> usize {
        let entities = host.managed_entities();
        debug_log!(self.settings.debug, count = entities.len(), "adopting converters");
        let delay = Fixed64::from_num(ADOPTION_DELAY);
        let mut adopted = 0;
        for entity in entities {
            if self.observe(host, entity).is_ok() {
                self.timers
                    .schedule_once(entity, TimerKind::DeferredStart, delay);
                adopted += 1;
            }
        }
        adopted
    }

    /// Handle a request by `party` to toggle a converter.
    ///
    /// Returns `true` when the engine handled it, `false` when the host's
    /// default toggle should apply.
    pub fn request_activation<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        entity: EntityId,
        party: PartyId,
    ) -> bool {
        let Some(converter) = host.converter(entity) else {
            return false;
        };
        let (owner, is_light_source, needs_privilege) = (
            converter.owner,
            converter.is_light_source,
            converter.needs_privilege,
        );
        if is_light_source || (needs_privilege && !host.can_build(entity, party)) {
            return false;
        }

        if self.is_active(entity) {
            self.stop_cooking(host, entity);
            return true;
        }

        if !(self.can_use(host, owner) || self.can_use(host, party)) {
            debug_log!(self.settings.debug, ?entity, ?party, "no permission");
            return false;
        }

        self.start_cooking(host, entity).is_ok()
    }

    /// Stop managing a converter that is being destroyed or unloaded.
    pub fn teardown(&mut self, entity: EntityId) {
        if let Some(controller) = self.controllers.remove(&entity)
            && let Phase::Active { timer, .. } = controller.phase
        {
            self.timers.cancel(timer);
        }
    }

    /// Cancel every timer and forget every converter.
    ///
    /// Converters that are switched on are handed back to the host's native
    /// cooking routine; their entities are returned.
    pub fn shutdown<H: Host + ?Sized>(&mut self, host: &mut H) -> Vec<EntityId> {
        debug_log!(
            self.settings.debug,
            count = self.controllers.len(),
            "shutting down"
        );
        let mut restarted = Vec::new();
        for (entity, controller) in std::mem::take(&mut self.controllers) {
            if let Phase::Active { timer, .. } = controller.phase {
                self.timers.cancel(timer);
            }
            if host.converter(entity).is_some_and(|c| c.on) {
                debug_log!(self.settings.debug, ?entity, "restarting native cooking");
                host.restart_native_cooking(entity);
                restarted.push(entity);
            }
        }
        let now = self.timers.now();
        self.timers = TimerQueue::new();
        self.timers.advance_to(now);
        restarted
    }

    // -----------------------------------------------------------------------
    // State machine
    // -----------------------------------------------------------------------

    /// Move a converter to `Active`, restarting it cleanly if it already was.
    ///
    /// Heats the container, notifies attachments, runs the first tick right
    /// away and schedules the rest every `tick_interval`.
    pub fn start_cooking<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        entity: EntityId,
    ) -> Result<CookReport, EngineError> {
        self.observe(host, entity)?;

        let converter = host
            .converter_mut(entity)
            .ok_or(EngineError::UnknownEntity(entity))?;
        let temperature = converter.cooking_temperature;
        converter.inventory.set_temperature(temperature);
        converter.on = true;
        host.update_attachment_temperature(entity, temperature);

        let controller = self
            .controllers
            .get_mut(&entity)
            .ok_or(EngineError::UnknownEntity(entity))?;
        if let Phase::Active { timer, .. } = controller.phase {
            self.timers.cancel(timer);
        }
        let interval = controller.config.tick_interval();
        let timer = self
            .timers
            .schedule_repeating(entity, TimerKind::Cook, interval, interval);
        controller.phase = Phase::Active {
            timer,
            state: ConverterState::new(entity),
        };
        debug_log!(self.settings.debug, ?entity, %interval, "started cooking");

        self.run_tick(host, entity, timer)
            .ok_or(EngineError::UnknownEntity(entity))
    }

    /// Move a converter to `Idle`. Returns `false` if it was not active.
    pub fn stop_cooking<H: Host + ?Sized>(&mut self, host: &mut H, entity: EntityId) -> bool {
        let Some(controller) = self.controllers.get_mut(&entity) else {
            return false;
        };
        let Phase::Active { timer, .. } = std::mem::take(&mut controller.phase) else {
            return false;
        };
        self.timers.cancel(timer);
        if let Some(converter) = host.converter_mut(entity) {
            converter.on = false;
        }
        debug_log!(self.settings.debug, ?entity, "stopped cooking");
        true
    }

    /// Advance the clock by `dt` seconds, firing every timer that comes due.
    pub fn advance<H: Host + ?Sized>(&mut self, host: &mut H, dt: Fixed64) -> AdvanceResult {
        let until = self.timers.now().saturating_add(dt.max(Fixed64::ZERO));
        let mut result = AdvanceResult::default();

        while let Some(fired) = self.timers.pop_due(until) {
            match fired.kind {
                TimerKind::Cook => {
                    if host.converter(fired.entity).is_none() {
                        debug_log!(
                            self.settings.debug,
                            entity = ?fired.entity,
                            "converter vanished, tearing down"
                        );
                        self.teardown(fired.entity);
                        continue;
                    }
                    if let Some(report) = self.run_tick(host, fired.entity, fired.handle) {
                        result.ticks.push((fired.entity, report));
                    }
                }
                TimerKind::DeferredStart => {
                    if self.finish_adoption(host, fired.entity) {
                        result.started.push(fired.entity);
                    }
                }
            }
        }

        self.timers.advance_to(until);
        result
    }

    fn finish_adoption<H: Host + ?Sized>(&mut self, host: &mut H, entity: EntityId) -> bool {
        let Some(converter) = host.converter(entity) else {
            return false;
        };
        if !converter.on || self.is_active(entity) || !self.can_use(host, converter.owner) {
            return false;
        }
        self.start_cooking(host, entity).is_ok()
    }

    /// Run one tick if `handle` is still the converter's live cook timer.
    fn run_tick<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        entity: EntityId,
        handle: TimerHandle,
    ) -> Option<CookReport> {
        let Engine {
            settings,
            registry,
            hooks,
            controllers,
            rng,
            ..
        } = self;
        let controller = controllers.get_mut(&entity)?;
        let Phase::Active { timer, state } = &mut controller.phase else {
            return None;
        };
        if *timer != handle {
            return None;
        }
        let mut ctx = CookContext {
            host,
            registry: registry.as_ref(),
            hooks,
            rng,
            debug: settings.debug,
        };
        Some(controller::cook(&mut ctx, &controller.config, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::HookVerdict;
    use crate::id::SlotIndex;
    use crate::item::ItemStack;
    use crate::test_utils::*;

    #[derive(Debug)]
    struct SuppressAll;

    impl ConverterHooks for SuppressAll {
        fn on_before_cook(&mut self, _: &ConverterState, _: Option<&ItemStack>) -> HookVerdict {
            HookVerdict::Suppress
        }
    }

    fn open_settings() -> Settings {
        settings_with(|_| {})
    }

    fn host_with_furnace() -> (TestHost, EntityId) {
        let mut host = TestHost::new();
        let entity = host.spawn(1, make_furnace(6));
        (host, entity)
    }

    #[test]
    fn start_runs_first_tick_immediately() {
        let (mut host, entity) = host_with_furnace();
        let mut engine = make_engine(open_settings());
        engine.start_cooking(&mut host, entity).unwrap();
        assert!(engine.is_active(entity));
        assert_eq!(engine.tick_count(entity), Some(1));
        assert!(host.furnace(entity).on);
    }

    #[test]
    fn ticks_follow_interval() {
        let (mut host, entity) = host_with_furnace();
        let mut engine = make_engine(settings_with(|s| s.speed_multipliers = global(2.0)));
        engine.start_cooking(&mut host, entity).unwrap();
        // interval 0.25 -> four more ticks in one second
        let result = engine.advance(&mut host, fixed(1.0));
        assert_eq!(result.ticks.len(), 4);
        assert_eq!(engine.tick_count(entity), Some(5));
    }

    #[test]
    fn start_heats_container_and_attachments() {
        let (mut host, entity) = host_with_furnace();
        let mut engine = make_engine(open_settings());
        let ore = metal_ore(engine.registry());
        host.furnace_mut(entity).cooking_temperature = fixed(350.0);
        host.furnace_mut(entity)
            .inventory
            .put(SlotIndex(2), ItemStack::new(ore, 1000));
        engine.start_cooking(&mut host, entity).unwrap();
        assert_eq!(host.furnace(entity).inventory.temperature, fixed(350.0));
        assert_eq!(host.stack(entity, 2).unwrap().temperature, fixed(350.0));
        assert_eq!(host.attachment_temperatures, vec![(entity, fixed(350.0))]);
    }

    #[test]
    fn stop_then_start_resets_tick_count() {
        let (mut host, entity) = host_with_furnace();
        let mut engine = make_engine(open_settings());
        engine.start_cooking(&mut host, entity).unwrap();
        engine.advance(&mut host, fixed(2.0));
        assert_eq!(engine.tick_count(entity), Some(5));

        assert!(engine.stop_cooking(&mut host, entity));
        assert!(!host.furnace(entity).on);
        assert_eq!(engine.tick_count(entity), None);
        assert!(engine.advance(&mut host, fixed(5.0)).ticks.is_empty());

        engine.start_cooking(&mut host, entity).unwrap();
        assert_eq!(engine.tick_count(entity), Some(1));
    }

    #[test]
    fn restarting_an_active_converter_does_not_double_schedule() {
        let (mut host, entity) = host_with_furnace();
        let mut engine = make_engine(open_settings());
        engine.start_cooking(&mut host, entity).unwrap();
        engine.start_cooking(&mut host, entity).unwrap();
        let result = engine.advance(&mut host, fixed(1.0));
        assert_eq!(result.ticks.len(), 2);
    }

    #[test]
    fn stray_cook_timer_is_ignored() {
        let (mut host, entity) = host_with_furnace();
        let mut engine = make_engine(open_settings());
        engine.start_cooking(&mut host, entity).unwrap();
        engine
            .timers
            .schedule_repeating(entity, TimerKind::Cook, fixed(0.1), fixed(0.1));

        let result = engine.advance(&mut host, fixed(1.0));
        assert_eq!(result.ticks.len(), 2);
        assert_eq!(engine.tick_count(entity), Some(3));
    }

    #[test]
    fn suppressed_tick_does_not_count() {
        let (mut host, entity) = host_with_furnace();
        let mut engine = make_engine(open_settings());
        engine.register_hook(Box::new(SuppressAll));
        let report = engine.start_cooking(&mut host, entity).unwrap();
        assert!(report.suppressed);
        engine.advance(&mut host, fixed(1.0));
        assert_eq!(engine.tick_count(entity), Some(0));
    }

    #[test]
    fn config_is_resolved_once_per_kind() {
        let mut host = TestHost::new();
        let furnace = host.spawn(1, make_furnace(3));
        let mut campfire = make_furnace(3);
        campfire.kind = "campfire".to_string();
        let campfire = host.spawn(2, campfire);

        let mut settings = open_settings();
        settings.smelting_frequencies = global(2);
        settings.smelting_frequencies.insert("furnace".to_string(), 4);
        let mut engine = make_engine(settings);
        engine.observe(&host, furnace).unwrap();
        engine.observe(&host, campfire).unwrap();
        assert_eq!(engine.config(furnace).unwrap().tick_frequency, 4);
        assert_eq!(engine.config(campfire).unwrap().tick_frequency, 2);
    }

    #[test]
    fn observe_unknown_entity_fails() {
        let host = TestHost::new();
        let mut engine = make_engine(open_settings());
        assert_eq!(
            engine.observe(&host, EntityId(42)),
            Err(EngineError::UnknownEntity(EntityId(42)))
        );
    }

    #[test]
    fn activation_requires_permission_when_enforced() {
        let (mut host, entity) = host_with_furnace();
        let mut engine = make_engine(settings_with(|s| s.use_permission = true));
        let stranger = PartyId(99);

        assert!(!engine.request_activation(&mut host, entity, stranger));
        assert!(!engine.is_active(entity));

        host.authorized.insert(stranger);
        assert!(engine.request_activation(&mut host, entity, stranger));
        assert!(engine.is_active(entity));
    }

    #[test]
    fn authorized_owner_lets_anyone_activate() {
        let (mut host, entity) = host_with_furnace();
        host.authorized.insert(owner());
        let mut engine = make_engine(settings_with(|s| s.use_permission = true));
        assert!(engine.request_activation(&mut host, entity, PartyId(99)));
    }

    #[test]
    fn activation_toggles_off_when_active() {
        let (mut host, entity) = host_with_furnace();
        let mut engine = make_engine(open_settings());
        assert!(engine.request_activation(&mut host, entity, owner()));
        assert!(engine.request_activation(&mut host, entity, owner()));
        assert!(!engine.is_active(entity));
    }

    #[test]
    fn light_sources_and_privilege_fall_through() {
        let (mut host, entity) = host_with_furnace();
        let mut engine = make_engine(open_settings());

        host.furnace_mut(entity).is_light_source = true;
        assert!(!engine.request_activation(&mut host, entity, owner()));

        host.furnace_mut(entity).is_light_source = false;
        host.furnace_mut(entity).needs_privilege = true;
        host.no_build.insert(owner());
        assert!(!engine.request_activation(&mut host, entity, owner()));
        assert!(!engine.is_active(entity));
    }

    #[test]
    fn adoption_starts_converters_that_are_on() {
        let mut host = TestHost::new();
        let mut lit = make_furnace(3);
        lit.on = true;
        let lit = host.spawn(1, lit);
        let cold = host.spawn(2, make_furnace(3));

        let mut engine = make_engine(open_settings());
        assert_eq!(engine.adopt_existing(&host), 2);
        assert!(engine.is_observed(cold));
        assert!(!engine.is_active(lit));

        let result = engine.advance(&mut host, fixed(0.5));
        assert!(result.started.is_empty());

        let result = engine.advance(&mut host, fixed(0.5));
        assert_eq!(result.started, vec![lit]);
        assert!(engine.is_active(lit));
        assert!(!engine.is_active(cold));
    }

    #[test]
    fn adoption_skips_unauthorized_owner() {
        let mut host = TestHost::new();
        let mut lit = make_furnace(3);
        lit.on = true;
        let lit = host.spawn(1, lit);
        let mut engine = make_engine(settings_with(|s| s.use_permission = true));
        engine.adopt_existing(&host);
        engine.advance(&mut host, fixed(2.0));
        assert!(!engine.is_active(lit));
    }

    #[test]
    fn teardown_cancels_ticks() {
        let (mut host, entity) = host_with_furnace();
        let mut engine = make_engine(open_settings());
        engine.start_cooking(&mut host, entity).unwrap();
        engine.teardown(entity);
        assert!(!engine.is_observed(entity));
        assert!(engine.advance(&mut host, fixed(3.0)).ticks.is_empty());
    }

    #[test]
    fn vanished_converter_is_torn_down() {
        let (mut host, entity) = host_with_furnace();
        let mut engine = make_engine(open_settings());
        engine.start_cooking(&mut host, entity).unwrap();
        host.despawn(entity);
        assert!(engine.advance(&mut host, fixed(1.0)).ticks.is_empty());
        assert!(!engine.is_observed(entity));
    }

    #[test]
    fn shutdown_hands_back_running_converters() {
        let mut host = TestHost::new();
        let a = host.spawn(1, make_furnace(3));
        let b = host.spawn(2, make_furnace(3));
        let mut engine = make_engine(open_settings());
        engine.start_cooking(&mut host, a).unwrap();
        engine.observe(&host, b).unwrap();

        let restarted = engine.shutdown(&mut host);
        assert_eq!(restarted, vec![a]);
        assert_eq!(host.native_restarts, vec![a]);
        assert_eq!(engine.active_count(), 0);
        assert!(engine.advance(&mut host, fixed(3.0)).ticks.is_empty());

        // A later activation starts from scratch.
        engine.start_cooking(&mut host, a).unwrap();
        assert_eq!(engine.tick_count(a), Some(1));
    }
}
