// SPDX-License-Identifier: GPL-3.0-only
//! Host-facing collaborators of the controller
//!
//! The controller only talks to these traits. The daemon backs them with
//! freedesktop D-Bus services; tests use the recording fakes in [`testing`].

pub mod notification;
pub mod screensaver;

use crate::mode::Mode;
use crate::scale::ScaleMetrics;

/// Renders the mode menu of an open session
pub trait SessionView {
    /// Show the menu with all four modes
    fn show(&mut self, metrics: ScaleMetrics);

    /// Mark `mode` as the active button, or none
    fn highlight(&mut self, mode: Option<Mode>);

    /// Remove the menu; must be harmless when nothing is shown
    fn hide(&mut self);
}

/// Fire-and-forget messages to the user
pub trait UserNotifier {
    fn notify(&self, summary: &str, body: &str, icon: &str);
}

/// Read-only view of the desktop lock state
pub trait LockState {
    fn is_locked(&self) -> bool;
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ViewCall {
        Show(ScaleMetrics),
        Highlight(Option<Mode>),
        Hide,
    }

    #[derive(Debug, Clone, Default)]
    pub struct RecordingView(Rc<RefCell<Vec<ViewCall>>>);

    impl RecordingView {
        pub fn calls(&self) -> Vec<ViewCall> {
            self.0.borrow().clone()
        }

        pub fn shows(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, ViewCall::Show(_)))
                .count()
        }

        pub fn last_highlight(&self) -> Option<Option<Mode>> {
            self.calls().iter().rev().find_map(|c| match c {
                ViewCall::Highlight(mode) => Some(*mode),
                _ => None,
            })
        }
    }

    impl SessionView for RecordingView {
        fn show(&mut self, metrics: ScaleMetrics) {
            self.0.borrow_mut().push(ViewCall::Show(metrics));
        }

        fn highlight(&mut self, mode: Option<Mode>) {
            self.0.borrow_mut().push(ViewCall::Highlight(mode));
        }

        fn hide(&mut self) {
            self.0.borrow_mut().push(ViewCall::Hide);
        }
    }

    #[derive(Debug, Clone, Default)]
    pub struct RecordingNotifier(Rc<RefCell<Vec<String>>>);

    impl RecordingNotifier {
        pub fn summaries(&self) -> Vec<String> {
            self.0.borrow().clone()
        }
    }

    impl UserNotifier for RecordingNotifier {
        fn notify(&self, summary: &str, _body: &str, _icon: &str) {
            self.0.borrow_mut().push(summary.to_string());
        }
    }

    #[derive(Debug, Clone, Default)]
    pub struct FakeLock(Rc<Cell<bool>>);

    impl FakeLock {
        pub fn set(&self, locked: bool) {
            self.0.set(locked);
        }
    }

    impl LockState for FakeLock {
        fn is_locked(&self) -> bool {
            self.0.get()
        }
    }
}
