// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event category discrimination
//!
//! The library never defines concrete event types; the host supplies its own
//! event enum and implements [`Event`] on it. A [`Category`] is the cheap
//! discriminator the dispatch hub keys its registry by, so that a trigger is
//! only ever evaluated against events of its declared kind.

use std::borrow::Cow;
use std::fmt;

/// Discriminator for one kind of event (e.g. `"FriendMessage"`)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Category(Cow<'static, str>);

impl Category {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for Category {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for Category {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An event the dispatch hub can route
///
/// Events are cloned once per matching registration, so hosts should keep
/// them cheap to clone (or wrap large bodies in `Arc`).
pub trait Event: Clone + Send + Sync + 'static {
    /// The category this event instance belongs to
    fn category(&self) -> Category;
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
