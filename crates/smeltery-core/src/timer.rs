//! Cooperative timer queue driving converter ticks.
//!
//! Timers fire in due-time order, ties broken by scheduling order. A
//! repeating timer is re-armed when it is popped, so the next firing of the
//! same timer is always dispatched after the previous one has been handled.
//! Cancelled timers are dropped lazily when their heap entry surfaces.

use crate::fixed::Fixed64;
use crate::id::{EntityId, TimerHandle};
use slotmap::SlotMap;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Run one converter tick.
    Cook,
    /// Start an adopted converter if it is still on.
    DeferredStart,
}

#[derive(Debug, Clone)]
struct TimerEntry {
    entity: EntityId,
    kind: TimerKind,
    /// `None` for one-shot timers.
    interval: Option<Fixed64>,
    /// Sequence number of the live heap entry; older entries are stale.
    seq: u64,
}

/// A timer that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub handle: TimerHandle,
    pub entity: EntityId,
    pub kind: TimerKind,
    pub at: Fixed64,
}

/// Deterministic timer queue over a [`Fixed64`] clock.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Fixed64,
    timers: SlotMap<TimerHandle, TimerEntry>,
    heap: BinaryHeap<Reverse<(Fixed64, u64, TimerHandle)>>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clock value.
    pub fn now(&self) -> Fixed64 {
        self.now
    }

    /// Number of live (not cancelled, not finished) timers.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.timers.contains_key(handle)
    }

    /// Schedule a repeating timer first due after `delay`, then every `interval`.
    ///
    /// A non-positive interval would starve the queue; it is treated as one tick of the
    /// fixed-point clock.
    pub fn schedule_repeating(
        &mut self,
        entity: EntityId,
        kind: TimerKind,
        delay: Fixed64,
        interval: Fixed64,
    ) -> TimerHandle {
        let interval = interval.max(Fixed64::DELTA);
        self.insert(entity, kind, delay, Some(interval))
    }

    /// Schedule a timer that fires once after `delay`.
    pub fn schedule_once(&mut self, entity: EntityId, kind: TimerKind, delay: Fixed64) -> TimerHandle {
        self.insert(entity, kind, delay, None)
    }

    fn insert(
        &mut self,
        entity: EntityId,
        kind: TimerKind,
        delay: Fixed64,
        interval: Option<Fixed64>,
    ) -> TimerHandle {
        let seq = self.bump_seq();
        let handle = self.timers.insert(TimerEntry {
            entity,
            kind,
            interval,
            seq,
        });
        let due = self.now.saturating_add(delay.max(Fixed64::ZERO));
        self.heap.push(Reverse((due, seq, handle)));
        handle
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Cancel a timer. Returns `false` if it had already finished or been cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.timers.remove(handle).is_some()
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to its due time.
    pub fn pop_due(&mut self, until: Fixed64) -> Option<Fired> {
        loop {
            let Reverse((due, seq, handle)) = *self.heap.peek()?;
            if due > until {
                return None;
            }
            self.heap.pop();

            let Some(entry) = self.timers.get(handle) else {
                continue;
            };
            if entry.seq != seq {
                continue;
            }

            let (entity, kind, interval) = (entry.entity, entry.kind, entry.interval);
            self.now = self.now.max(due);

            match interval {
                Some(interval) => {
                    let next_seq = self.bump_seq();
                    if let Some(entry) = self.timers.get_mut(handle) {
                        entry.seq = next_seq;
                    }
                    self.heap.push(Reverse((due.saturating_add(interval), next_seq, handle)));
                }
                None => {
                    self.timers.remove(handle);
                }
            }

            return Some(Fired {
                handle,
                entity,
                kind,
                at: due,
            });
        }
    }

    /// Move the clock forward without firing anything. Never moves backwards.
    pub fn advance_to(&mut self, until: Fixed64) {
        self.now = self.now.max(until);
    }
}
