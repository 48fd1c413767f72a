// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tripline-core: event matching and dispatch coordination
//!
//! This crate provides:
//! - `Trigger` - A predicate bound to one event category, yielding an
//!   optional payload on match
//! - `DispatchHub` - Fan-out registry routing incoming events to active
//!   registrations
//! - `InterruptControl` - One-shot waits with timeout and cancellation
//! - `HandlerControl` - Persistent callback registrations
//!
//! The host feeds every incoming event into [`DispatchHub::deliver`]; the
//! controllers correlate those events with context captured earlier in a
//! running task ("wait for the next message from the same sender").

pub mod error;
pub mod event;
pub mod handler;
pub mod hub;
pub mod interrupt;
pub mod trigger;

// Re-exports
pub use error::Fault;
pub use event::{Category, Event};
pub use handler::{Callback, HandlerControl, HandlerHandle};
pub use hub::{DispatchHub, RegistrationId};
pub use interrupt::InterruptControl;
pub use trigger::Trigger;
