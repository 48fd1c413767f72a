// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch hub: routes incoming events to active registrations
//!
//! The hub is the process-wide fan-out point. The host transport calls
//! [`DispatchHub::deliver`] once per incoming event; the hub offers the event
//! to every registration subscribed under that event's category. One-shot
//! waits and persistent handlers both register through the same
//! [`Deliverable`] contract, so delivery doesn't care which kind it is
//! talking to.
//!
//! Delivery operates on a snapshot of the category's registration list taken
//! at call start: registrations added or removed mid-delivery don't shift
//! what this delivery visits. `deliver` never awaits; matched work is handed
//! off through channels so a slow consumer cannot delay another.

use crate::error::{panic_message, Fault};
use crate::event::{Category, Event};
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

/// Identifier for one hub registration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegistrationId(u64);

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registration the hub can offer events to
///
/// Implementations must not block: they evaluate their trigger and hand any
/// matched work off through a channel. A panic escaping `offer` is caught by
/// the hub and reported as [`Fault::Evaluation`].
pub(crate) trait Deliverable<E>: Send + Sync {
    fn offer(&self, event: &E);
}

type Registry<E> = HashMap<Category, Vec<(RegistrationId, Arc<dyn Deliverable<E>>)>>;

/// Fan-out registry routing events to waits and handlers by category
pub struct DispatchHub<E> {
    registry: Arc<RwLock<Registry<E>>>,
    next_id: Arc<AtomicU64>,
    faults: FaultReporter,
}

impl<E: Event> DispatchHub<E> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(0)),
            faults: FaultReporter::new(),
        }
    }

    /// Add a registration under the given category
    pub(crate) fn subscribe(
        &self,
        category: Category,
        registration: Arc<dyn Deliverable<E>>,
    ) -> RegistrationId {
        let id = RegistrationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut registry = self.registry.write().unwrap_or_else(|e| e.into_inner());
        registry
            .entry(category.clone())
            .or_default()
            .push((id, registration));
        tracing::debug!(category = %category, id = %id, "registration subscribed");
        id
    }

    /// Remove a registration; removing one that is already gone is a no-op
    ///
    /// Returns whether an entry was actually removed.
    pub(crate) fn unsubscribe(&self, category: &Category, id: RegistrationId) -> bool {
        let mut registry = self.registry.write().unwrap_or_else(|e| e.into_inner());
        let Some(entries) = registry.get_mut(category) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            registry.remove(category);
        }
        if removed {
            tracing::debug!(category = %category, id = %id, "registration unsubscribed");
        }
        removed
    }

    /// Offer an event to every registration under its category
    ///
    /// Called once per incoming event by the host transport. Synchronous:
    /// predicate evaluation happens inline, matched work is handed off to
    /// independently scheduled tasks. A panicking predicate is contained to
    /// its registration and treated as "no match".
    pub fn deliver(&self, event: E) {
        let category = event.category();
        let snapshot: Vec<(RegistrationId, Arc<dyn Deliverable<E>>)> = {
            let registry = self.registry.read().unwrap_or_else(|e| e.into_inner());
            registry.get(&category).cloned().unwrap_or_default()
        };

        for (id, registration) in snapshot {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| registration.offer(&event))) {
                self.faults.report(Fault::Evaluation {
                    category: category.clone(),
                    id,
                    message: panic_message(panic.as_ref()),
                });
            }
        }
    }

    /// Receive faults from predicate and callback code (for error reporting)
    ///
    /// Faults are always logged via `tracing`; the channel lets the host
    /// surface them elsewhere as well. Only the most recent receiver is fed.
    pub fn faults(&self) -> mpsc::UnboundedReceiver<Fault> {
        self.faults.attach()
    }

    /// Count of active registrations across all categories
    pub fn registration_count(&self) -> usize {
        self.registry
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .map(Vec::len)
            .sum()
    }

    /// Count of active registrations under one category
    pub fn category_count(&self, category: &Category) -> usize {
        self.registry
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(category)
            .map_or(0, Vec::len)
    }

    pub(crate) fn reporter(&self) -> FaultReporter {
        self.faults.clone()
    }
}

impl<E: Event> Default for DispatchHub<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for DispatchHub<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            next_id: Arc::clone(&self.next_id),
            faults: self.faults.clone(),
        }
    }
}

/// Unsubscribes its registration on drop
///
/// Ties registration lifetime to the owning future, so a cancelled wait
/// deterministically leaves no dangling hub entry behind.
pub(crate) struct HubGuard<E: Event> {
    hub: DispatchHub<E>,
    category: Category,
    id: RegistrationId,
}

impl<E: Event> HubGuard<E> {
    pub(crate) fn new(hub: DispatchHub<E>, category: Category, id: RegistrationId) -> Self {
        Self { hub, category, id }
    }
}

impl<E: Event> Drop for HubGuard<E> {
    fn drop(&mut self) {
        self.hub.unsubscribe(&self.category, self.id);
    }
}

/// Shared sink for surfacing faults to the host
#[derive(Clone)]
pub(crate) struct FaultReporter {
    tx: Arc<RwLock<Option<mpsc::UnboundedSender<Fault>>>>,
}

impl FaultReporter {
    fn new() -> Self {
        Self {
            tx: Arc::new(RwLock::new(None)),
        }
    }

    fn attach(&self) -> mpsc::UnboundedReceiver<Fault> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut slot = self.tx.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(tx);
        rx
    }

    pub(crate) fn report(&self, fault: Fault) {
        tracing::warn!(fault = %fault, "registration fault");
        if let Some(tx) = self.tx.read().unwrap_or_else(|e| e.into_inner()).as_ref() {
            let _ = tx.send(fault);
        }
    }
}

#[cfg(test)]
#[path = "hub_tests.rs"]
mod tests;
