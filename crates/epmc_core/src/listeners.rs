//! Bundled event listeners
//!
//! - [`EventCounter`] - counts events by kind
//! - [`EventLog`] - records the event sequence with the electron involved
//! - [`SharedTally`] - run totals behind a mutex, shareable across threads
//!
//! Any listener can be shared by wrapping it in `Arc<parking_lot::Mutex<_>>`,
//! which is how results are read back after the engine has taken ownership.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::event::{EventListener, EventMask, EventSource, SimEvent};

impl<L: EventListener> EventListener for Arc<Mutex<L>> {
    fn on_event(&mut self, event: SimEvent, source: &mut EventSource<'_>) {
        self.lock().on_event(event, source);
    }

    fn interests(&self) -> EventMask {
        self.lock().interests()
    }
}

/// Number of events seen, by kind
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventCounter {
    counts: [u64; 12],
}

impl EventCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, event: SimEvent) -> u64 {
        self.counts[event.index()]
    }

    /// Total over all kinds
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Add another counter's totals into this one
    pub fn merge(&mut self, other: &EventCounter) {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts.iter()) {
            *mine += theirs;
        }
    }

    pub fn record(&mut self, event: SimEvent) {
        self.counts[event.index()] += 1;
    }
}

impl EventListener for EventCounter {
    fn on_event(&mut self, event: SimEvent, _source: &mut EventSource<'_>) {
        self.record(event);
    }
}

/// One recorded event
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogEntry {
    pub event: SimEvent,
    /// Id of the current electron when the event fired
    pub electron_id: Option<u64>,
    pub energy: Option<f64>,
    pub stack_depth: usize,
}

/// Records every event it is interested in
#[derive(Clone, Debug)]
pub struct EventLog {
    entries: Vec<LogEntry>,
    mask: EventMask,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            mask: EventMask::all(),
        }
    }

    /// Only record events in `mask`
    pub fn with_mask(mut self, mask: EventMask) -> Self {
        self.mask = mask;
        self
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Just the event kinds, in order
    pub fn events(&self) -> Vec<SimEvent> {
        self.entries.iter().map(|e| e.event).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl EventListener for EventLog {
    fn on_event(&mut self, event: SimEvent, source: &mut EventSource<'_>) {
        let electron = source.electron();
        self.entries.push(LogEntry {
            event,
            electron_id: electron.map(|e| e.id()),
            energy: electron.map(|e| e.energy()),
            stack_depth: source.stack_depth(),
        });
    }

    fn interests(&self) -> EventMask {
        self.mask
    }
}

/// Totals accumulated over a run
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventTally {
    pub events: EventCounter,
    /// Completed cascades
    pub trajectories: u64,
    /// Primaries that left the chamber
    pub backscattered: u64,
    /// Summed energy (eV) of backscattered primaries
    pub backscattered_energy: f64,
    /// Secondaries that were tracked
    pub secondaries: u64,
}

impl EventTally {
    /// Fraction of primaries that left the chamber
    pub fn backscatter_fraction(&self) -> f64 {
        if self.trajectories == 0 {
            0.0
        } else {
            self.backscattered as f64 / self.trajectories as f64
        }
    }
}

/// Handle to an [`EventTally`] shared between engines
///
/// Clones share the same totals, so one handle can be given to each worker
/// of a parallel run and read afterwards.
#[derive(Clone, Debug, Default)]
pub struct SharedTally {
    inner: Arc<Mutex<EventTally>>,
}

impl SharedTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current totals
    pub fn snapshot(&self) -> EventTally {
        self.inner.lock().clone()
    }

    pub fn reset(&self) {
        *self.inner.lock() = EventTally::default();
    }
}

impl EventListener for SharedTally {
    fn on_event(&mut self, event: SimEvent, source: &mut EventSource<'_>) {
        let mut tally = self.inner.lock();
        tally.events.record(event);
        match event {
            SimEvent::TrajectoryEnd => tally.trajectories += 1,
            SimEvent::StartSecondary => tally.secondaries += 1,
            SimEvent::Backscatter => {
                if let Some(e) = source.electron().filter(|e| !e.is_secondary()) {
                    tally.backscattered += 1;
                    tally.backscattered_energy += e.energy();
                }
            }
            _ => {}
        }
    }
}
