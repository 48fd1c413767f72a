// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fault taxonomy for registration-level failures
//!
//! Faults never cross registration boundaries and never abort the dispatch
//! loop. A missing match is `None`, not a fault; a timed-out wait is `None`,
//! not a fault; cancellation unwinds through the wait future itself. What
//! remains are panics inside user-supplied predicate or callback code, which
//! are contained, logged, and surfaced on the hub's fault channel.

use crate::event::Category;
use crate::hub::RegistrationId;
use std::any::Any;
use thiserror::Error;

/// An isolated failure inside one registration's user code
#[derive(Debug, Error)]
pub enum Fault {
    /// A trigger predicate panicked while evaluating an event
    ///
    /// Treated as "no match" for that registration; delivery to other
    /// registrations is unaffected.
    #[error("predicate panicked for {category} registration {id}: {message}")]
    Evaluation {
        category: Category,
        id: RegistrationId,
        message: String,
    },

    /// A persistent handler's callback panicked
    ///
    /// The registration stays active and will fire again on later events.
    #[error("callback panicked for {category} registration {id}: {message}")]
    Callback {
        category: Category,
        id: RegistrationId,
        message: String,
    },
}

/// Extract a printable message from a panic payload
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
