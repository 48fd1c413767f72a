// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot waits: suspend a task until a trigger matches
//!
//! [`InterruptControl::wait`] registers a trigger with the hub, suspends the
//! calling task, and resolves with the payload of the first matching event.
//! A timeout returns `None` (a normal outcome, not an error); cancelling the
//! wait future unsubscribes its registration before the cancellation
//! completes.
//!
//! The wait's result slot lives behind a single mutex together with its
//! state, so whichever of {match, timeout, cancellation} gets there first
//! wins and the loser's effect is discarded. A wait can never settle twice.

use crate::event::Event;
use crate::hub::{Deliverable, DispatchHub, HubGuard};
use crate::trigger::Trigger;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

/// Manages one-shot waits against a dispatch hub
pub struct InterruptControl<E> {
    hub: DispatchHub<E>,
}

impl<E: Event> InterruptControl<E> {
    /// Create a controller bound to the given hub
    pub fn new(hub: DispatchHub<E>) -> Self {
        Self { hub }
    }

    /// Wait for the next event matching `trigger`
    ///
    /// Suspends until a matching event arrives, returning its payload. With
    /// `timeout = Some(t)`, returns `None` once `t` elapses without a match;
    /// with `None`, waits indefinitely. Either way the registration is gone
    /// from the hub before this returns — a later matching event has no
    /// effect on an ended wait.
    ///
    /// Dropping the returned future (caller cancellation) also unsubscribes
    /// the registration as part of the drop.
    pub async fn wait<P>(&self, trigger: &Trigger<E, P>, timeout: Option<Duration>) -> Option<P>
    where
        P: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let pending = Arc::new(PendingWait {
            trigger: trigger.clone(),
            slot: Mutex::new(WaitSlot {
                state: WaitState::Waiting,
                sender: Some(tx),
            }),
        });

        let category = trigger.category().clone();
        let id = self.hub.subscribe(category.clone(), pending.clone());
        tracing::debug!(category = %category, id = %id, "waiting on trigger");

        // Settles and unsubscribes on every exit path, including drop.
        let guard = WaitGuard {
            pending: pending.clone(),
            _hub: HubGuard::new(self.hub.clone(), category, id),
        };

        let outcome = match timeout {
            Some(t) => match tokio::time::timeout(t, rx).await {
                Ok(Ok(payload)) => Some(payload),
                Ok(Err(_)) => None,
                Err(_elapsed) => {
                    pending.settle(WaitState::TimedOut);
                    None
                }
            },
            None => rx.await.ok(),
        };

        drop(guard);
        outcome
    }
}

impl<E> Clone for InterruptControl<E> {
    fn clone(&self) -> Self {
        Self {
            hub: self.hub.clone(),
        }
    }
}

/// Terminal states a wait can settle into; `Waiting` is the only
/// non-terminal state and is never re-entered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WaitState {
    Waiting,
    Resolved,
    TimedOut,
    Cancelled,
}

struct WaitSlot<P> {
    state: WaitState,
    /// Present exactly while `state == Waiting`
    sender: Option<oneshot::Sender<P>>,
}

/// A registered wait; the hub offers events to it until it settles
struct PendingWait<E, P> {
    trigger: Trigger<E, P>,
    slot: Mutex<WaitSlot<P>>,
}

impl<E, P> PendingWait<E, P> {
    /// Transition out of `Waiting`; later transitions are discarded
    fn settle(&self, next: WaitState) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if slot.state == WaitState::Waiting {
            slot.state = next;
            slot.sender = None;
        }
    }

    fn is_waiting(&self) -> bool {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        slot.state == WaitState::Waiting
    }
}

impl<E, P> Deliverable<E> for PendingWait<E, P>
where
    E: Event,
    P: Send + 'static,
{
    fn offer(&self, event: &E) {
        // Don't evaluate the trigger for a wait that already settled; the
        // lock is not held while the predicate runs.
        if !self.is_waiting() {
            return;
        }
        let Some(payload) = self.trigger.evaluate(event) else {
            return;
        };
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if slot.state == WaitState::Waiting {
            if let Some(tx) = slot.sender.take() {
                // A dropped receiver means the wait is ending concurrently;
                // the match is discarded and the wait's own exit path
                // records whether it timed out or was cancelled.
                if tx.send(payload).is_ok() {
                    slot.state = WaitState::Resolved;
                }
            }
        }
    }
}

/// Marks the wait cancelled (if still waiting) and unsubscribes from the hub
/// when the wait future is dropped
struct WaitGuard<E: Event, P> {
    pending: Arc<PendingWait<E, P>>,
    _hub: HubGuard<E>,
}

impl<E: Event, P> Drop for WaitGuard<E, P> {
    fn drop(&mut self) {
        self.pending.settle(WaitState::Cancelled);
    }
}

#[cfg(test)]
#[path = "interrupt_tests.rs"]
mod tests;
