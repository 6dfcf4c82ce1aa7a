//! Name-addressed action dispatch.
//!
//! Remote senders trigger device behavior by name; the registry maps bounded
//! names to callbacks. Immediate and scheduled actions live in disjoint
//! sequences. Unknown names are dropped silently so forward-incompatible
//! senders never crash the device.

use alloc::boxed::Box;
use alloc::vec::Vec;

use serde_json::Value;

use crate::settings::bounded;

/// Maximum registered action name length; longer names are truncated.
pub const ACTION_NAME_MAX: usize = 32;

pub type ActionName = heapless::String<ACTION_NAME_MAX>;

/// Immediate action callback, invoked with the decoded parameter list.
pub type ActionCallback = Box<dyn FnMut(&[Value])>;

/// Scheduled action callback, invoked with the opaque cron expression and
/// the decoded parameter list. Actual time-triggering is the external
/// scheduler's job; this registry only resolves names.
pub type ScheduledCallback = Box<dyn FnMut(&str, &[Value])>;

struct ActionEntry {
    name: ActionName,
    callback: ActionCallback,
}

struct ScheduledEntry {
    name: ActionName,
    callback: ScheduledCallback,
}

/// Registry of immediate and time-scheduled actions.
///
/// Duplicate names are permitted; dispatch invokes the first registered
/// match only. Lookup is case-sensitive and exact.
pub struct ActionRegistry {
    immediate: Vec<ActionEntry>,
    scheduled: Vec<ScheduledEntry>,
}

impl ActionRegistry {
    pub const fn new() -> Self {
        Self {
            immediate: Vec::new(),
            scheduled: Vec::new(),
        }
    }

    /// Register an immediate action.
    pub fn register(&mut self, name: &str, callback: impl FnMut(&[Value]) + 'static) {
        self.immediate.push(ActionEntry {
            name: bounded(name),
            callback: Box::new(callback),
        });
    }

    /// Register a time-scheduled action.
    pub fn register_scheduled(&mut self, name: &str, callback: impl FnMut(&str, &[Value]) + 'static) {
        self.scheduled.push(ScheduledEntry {
            name: bounded(name),
            callback: Box::new(callback),
        });
    }

    /// Invoke the first immediate action registered under `name`.
    ///
    /// Returns whether a callback ran; an unmatched name is a deliberate
    /// no-op, not an error.
    pub fn dispatch(&mut self, name: &str, parameters: &[Value]) -> bool {
        match self
            .immediate
            .iter_mut()
            .find(|entry| entry.name.as_str() == name)
        {
            Some(entry) => {
                (entry.callback)(parameters);
                true
            }
            None => false,
        }
    }

    /// Invoke the first scheduled action registered under `name`, handing it
    /// the cron expression from the schedule update.
    pub fn dispatch_scheduled(&mut self, name: &str, cron: &str, parameters: &[Value]) -> bool {
        match self
            .scheduled
            .iter_mut()
            .find(|entry| entry.name.as_str() == name)
        {
            Some(entry) => {
                (entry.callback)(cron, parameters);
                true
            }
            None => false,
        }
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
