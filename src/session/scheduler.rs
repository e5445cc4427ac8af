// SPDX-License-Identifier: GPL-3.0-only
//! Deferred actions used by the session
//!
//! The session never sleeps itself. It asks a [`Scheduler`] to deliver a
//! [`TimerId`] after a delay; whoever drives the event loop hands fired ids
//! back to the controller.

use std::time::Duration;

/// The two kinds of deferred action a session can have outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Closes the session after a period without interaction
    Inactivity,
    /// Applies the mode selected with the hotkey
    AutoApply,
}

/// Handle of a scheduled timer, unique for the lifetime of a scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

pub trait Scheduler {
    /// Arrange for `id` to be delivered back after `delay`
    fn schedule(&mut self, kind: TimerKind, delay: Duration) -> TimerId;

    /// Make sure a scheduled timer is never delivered; unknown ids are ignored
    fn cancel(&mut self, id: TimerId);
}
