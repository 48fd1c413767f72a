// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Triggers: named predicates that turn events into payloads
//!
//! A [`Trigger`] binds a predicate to one event category. Evaluating it
//! against an event yields `None` ("did not match") or `Some(payload)`.
//! Presence alone decides: `Some("")` and `Some(0)` are matches. The
//! controllers pre-filter by category, so a predicate only ever sees events
//! of the trigger's declared kind.

use crate::event::{Category, Event};
use std::fmt;
use std::sync::Arc;

/// A predicate bound to one event category, producing an optional payload
pub struct Trigger<E, P> {
    category: Category,
    predicate: Arc<dyn Fn(&E) -> Option<P> + Send + Sync>,
}

impl<E, P> Trigger<E, P>
where
    E: Event,
    P: Send + 'static,
{
    /// Create a trigger for `category` with the given predicate
    pub fn new(
        category: impl Into<Category>,
        predicate: impl Fn(&E) -> Option<P> + Send + Sync + 'static,
    ) -> Self {
        Self {
            category: category.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// The event category this trigger accepts
    pub fn category(&self) -> &Category {
        &self.category
    }

    /// Run the predicate against an event of the declared category
    ///
    /// The trigger never mutates the event. Callers (the controllers) are
    /// responsible for only passing events of `self.category()`.
    pub fn evaluate(&self, event: &E) -> Option<P> {
        (*self.predicate)(event)
    }

    /// Add a guard that must pass before the predicate runs
    ///
    /// Guards compose: the event is offered to the predicate only if every
    /// guard accepts it. Useful for layering correlation conditions (e.g.
    /// "same sender") over an existing trigger.
    pub fn filter(self, guard: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        let predicate = self.predicate;
        Self {
            category: self.category,
            predicate: Arc::new(move |event| {
                if guard(event) {
                    (*predicate)(event)
                } else {
                    None
                }
            }),
        }
    }

    /// Transform the payload of a matching evaluation
    pub fn map<Q>(self, f: impl Fn(P) -> Q + Send + Sync + 'static) -> Trigger<E, Q>
    where
        Q: Send + 'static,
    {
        let predicate = self.predicate;
        Trigger {
            category: self.category,
            predicate: Arc::new(move |event| (*predicate)(event).map(&f)),
        }
    }
}

impl<E, P> Clone for Trigger<E, P> {
    fn clone(&self) -> Self {
        Self {
            category: self.category.clone(),
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<E, P> fmt::Debug for Trigger<E, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
