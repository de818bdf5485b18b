use std::collections::{BTreeMap, VecDeque};

use bevy_ecs::prelude::Resource;

use crate::ecs::AgentId;
use crate::error::{MarketError, MarketResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventAction {
    EvaluateDriverGoOnline,
    EvaluateRiderSearchIntent,
}

impl EventAction {
    pub const ALL: [EventAction; 2] = [
        EventAction::EvaluateDriverGoOnline,
        EventAction::EvaluateRiderSearchIntent,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub due_tick: u64,
    pub action: EventAction,
    pub agent_id: AgentId,
}

/// The event being delivered, visible to the event handler systems.
#[derive(Debug, Clone, Copy, Resource)]
pub struct CurrentEvent(pub Event);

/// Tick-indexed event queue. Events due on the same tick come out in the
/// order they were scheduled.
#[derive(Debug, Default, Resource)]
pub struct SimulationClock {
    now: u64,
    events: BTreeMap<u64, VecDeque<Event>>,
    pending: usize,
}

impl SimulationClock {
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Queue `event`. Scheduling before the current tick is a caller bug.
    pub fn schedule(&mut self, event: Event) -> MarketResult<()> {
        if event.due_tick < self.now {
            return Err(MarketError::ScheduledInPast {
                due_tick: event.due_tick,
                now: self.now,
            });
        }
        self.events.entry(event.due_tick).or_default().push_back(event);
        self.pending += 1;
        Ok(())
    }

    /// Queue an event `delay` ticks from now. Returns the due tick.
    pub fn schedule_in(&mut self, delay: u64, action: EventAction, agent_id: AgentId) -> u64 {
        let due_tick = self.now.saturating_add(delay);
        self.events.entry(due_tick).or_default().push_back(Event {
            due_tick,
            action,
            agent_id,
        });
        self.pending += 1;
        due_tick
    }

    /// Move the clock forward. The clock never runs backwards.
    pub fn advance_to(&mut self, tick: u64) {
        debug_assert!(tick >= self.now, "clock must be monotonic");
        self.now = self.now.max(tick);
    }

    /// Take the next event due at `tick`, if any.
    pub fn pop_due(&mut self, tick: u64) -> Option<Event> {
        let queue = self.events.get_mut(&tick)?;
        let event = queue.pop_front();
        if queue.is_empty() {
            self.events.remove(&tick);
        }
        if event.is_some() {
            self.pending -= 1;
        }
        event
    }

    pub fn next_event_tick(&self) -> Option<u64> {
        self.events.keys().next().copied()
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending == 0
    }
}

/// Wall-clock style label for a tick, e.g. `Day 2, 07:30:00`.
pub fn format_tick(tick: u64, ticks_per_major: u64, minor_tick_secs: u64) -> String {
    let ticks_per_major = ticks_per_major.max(1);
    let day = tick / ticks_per_major;
    let secs = (tick % ticks_per_major) * minor_tick_secs;
    format!(
        "Day {}, {:02}:{:02}:{:02}",
        day,
        (secs / 3600) % 24,
        (secs % 3600) / 60,
        secs % 60
    )
}
