// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent handlers: callbacks invoked on every trigger match
//!
//! [`HandlerControl::on`] binds a trigger to a callback. Each matching event
//! is handed to a per-registration worker task which invokes the callback
//! with `(event, payload)`, in arrival order. The registration stays
//! subscribed until [`HandlerControl::remove`] is called; a panicking
//! callback is contained to that one invocation and the registration keeps
//! firing.

use crate::error::{panic_message, Fault};
use crate::event::{Category, Event};
use crate::hub::{Deliverable, DispatchHub, FaultReporter, RegistrationId};
use crate::trigger::Trigger;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

type CallbackFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// A callback taking `(event, payload)`, in sync or async form
pub struct Callback<E, P> {
    f: Arc<dyn Fn(E, P) -> CallbackFuture + Send + Sync>,
}

impl<E, P> Callback<E, P>
where
    E: Event,
    P: Send + 'static,
{
    /// Wrap a synchronous callback
    pub fn new_sync(f: impl Fn(E, P) + Send + Sync + 'static) -> Self {
        Self {
            f: Arc::new(move |event, payload| {
                f(event, payload);
                let done: CallbackFuture = Box::pin(std::future::ready(()));
                done
            }),
        }
    }

    /// Wrap an asynchronous callback
    pub fn new_async<F, Fut>(f: F) -> Self
    where
        F: Fn(E, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            f: Arc::new(move |event, payload| {
                let fut: CallbackFuture = Box::pin(f(event, payload));
                fut
            }),
        }
    }

    fn call(&self, event: E, payload: P) -> CallbackFuture {
        (*self.f)(event, payload)
    }
}

impl<E, P> Clone for Callback<E, P> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
        }
    }
}

/// Handle for removing a registration created by [`HandlerControl::on`]
#[derive(Debug)]
pub struct HandlerHandle {
    category: Category,
    id: RegistrationId,
    active: Arc<AtomicBool>,
}

/// Manages persistent trigger-to-callback registrations
pub struct HandlerControl<E> {
    hub: DispatchHub<E>,
}

impl<E: Event> HandlerControl<E> {
    /// Create a controller bound to the given hub
    pub fn new(hub: DispatchHub<E>) -> Self {
        Self { hub }
    }

    /// Register `callback` to run on every event matching `trigger`
    ///
    /// Spawns the registration's worker task, so this must be called within
    /// a Tokio runtime. The registration persists until [`Self::remove`].
    pub fn on<P>(&self, trigger: &Trigger<E, P>, callback: Callback<E, P>) -> HandlerHandle
    where
        P: Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let active = Arc::new(AtomicBool::new(true));
        let registration = Arc::new(HandlerRegistration {
            trigger: trigger.clone(),
            active: active.clone(),
            tx,
        });

        let category = trigger.category().clone();
        let id = self.hub.subscribe(category.clone(), registration);
        tracing::debug!(category = %category, id = %id, "handler registered");

        tokio::spawn(run_worker(
            rx,
            callback,
            active.clone(),
            self.hub.reporter(),
            category.clone(),
            id,
        ));

        HandlerHandle {
            category,
            id,
            active,
        }
    }

    /// Remove a registration; no further callback invocations occur
    ///
    /// Deliveries already in flight check the active flag before invoking
    /// the callback, so removal wins even against a concurrent `deliver`.
    /// Removing an already-removed registration is a no-op.
    pub fn remove(&self, handle: &HandlerHandle) {
        if handle.active.swap(false, Ordering::SeqCst) {
            self.hub.unsubscribe(&handle.category, handle.id);
            tracing::debug!(category = %handle.category, id = %handle.id, "handler removed");
        } else {
            tracing::warn!(
                category = %handle.category,
                id = %handle.id,
                "tried to remove an already-removed handler"
            );
        }
    }
}

impl<E> Clone for HandlerControl<E> {
    fn clone(&self) -> Self {
        Self {
            hub: self.hub.clone(),
        }
    }
}

/// A persistent registration held in the hub registry
struct HandlerRegistration<E, P> {
    trigger: Trigger<E, P>,
    active: Arc<AtomicBool>,
    tx: mpsc::UnboundedSender<(E, P)>,
}

impl<E, P> Deliverable<E> for HandlerRegistration<E, P>
where
    E: Event,
    P: Send + 'static,
{
    fn offer(&self, event: &E) {
        if !self.active.load(Ordering::SeqCst) {
            return;
        }
        if let Some(payload) = self.trigger.evaluate(event) {
            // Worker gone means the registration is being torn down.
            let _ = self.tx.send((event.clone(), payload));
        }
    }
}

/// Per-registration worker: invokes the callback for each matched event in
/// arrival order, containing panics to the single invocation
async fn run_worker<E, P>(
    mut rx: mpsc::UnboundedReceiver<(E, P)>,
    callback: Callback<E, P>,
    active: Arc<AtomicBool>,
    reporter: FaultReporter,
    category: Category,
    id: RegistrationId,
) where
    E: Event,
    P: Send + 'static,
{
    while let Some((event, payload)) = rx.recv().await {
        if !active.load(Ordering::SeqCst) {
            break;
        }
        // The callback must only run inside the spawned task: a sync
        // callback executes as soon as `call` is invoked, so calling it
        // here would let its panic unwind the worker instead.
        let invocation = callback.clone();
        match tokio::spawn(async move { invocation.call(event, payload).await }).await {
            Ok(()) => {}
            Err(err) => {
                if err.is_panic() {
                    reporter.report(Fault::Callback {
                        category: category.clone(),
                        id,
                        message: panic_message(err.into_panic().as_ref()),
                    });
                } else {
                    // Runtime is shutting down.
                    break;
                }
            }
        }
    }
    tracing::debug!(category = %category, id = %id, "handler worker stopped");
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
