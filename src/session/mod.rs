// SPDX-License-Identifier: GPL-3.0-only
//! Mode-selection session state machine
//!
//! A session is one open instance of the mode menu. It tracks the hotkey
//! selection and owns two timers:
//!
//! - inactivity: closes the session [`INACTIVITY_TIMEOUT`] after the last
//!   interaction (opening, hovering and hotkey presses all count)
//! - auto-apply: armed by each hotkey press, applies the selected mode after
//!   [`AUTO_APPLY_DELAY`] unless something else happened first
//!
//! Every path out of the open state cancels both timers. Timers that still
//! arrive afterwards are reported as [`TimerOutcome::Stale`].

mod scheduler;

pub use scheduler::{Scheduler, TimerId, TimerKind};

#[cfg(test)]
pub use scheduler::testing;

use std::time::Duration;

use crate::mode::Mode;

pub const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(5);
pub const AUTO_APPLY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    OpenNoSelection,
    OpenSelected,
}

/// What a delivered timer means for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    /// Cancelled, superseded, or the session is already closed
    Stale,
    /// Inactivity timeout; the session is now closed
    Expired,
    /// The armed mode should be dispatched, after which the session closes
    Apply(Mode),
}

#[derive(Debug, Clone, Copy)]
struct ArmedApply {
    id: TimerId,
    mode: Mode,
}

pub struct Session<S: Scheduler> {
    scheduler: S,
    open: bool,
    first_open_since_close: bool,
    selected_index: Option<usize>,
    last_armed: Option<Mode>,
    highlighted: Option<Mode>,
    inactivity: Option<TimerId>,
    auto_apply: Option<ArmedApply>,
}

impl<S: Scheduler> Session<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            open: false,
            first_open_since_close: true,
            selected_index: None,
            last_armed: None,
            highlighted: None,
            inactivity: None,
            auto_apply: None,
        }
    }

    pub fn state(&self) -> SessionState {
        match (self.open, self.selected_index) {
            (false, _) => SessionState::Closed,
            (true, None) => SessionState::OpenNoSelection,
            (true, Some(_)) => SessionState::OpenSelected,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    #[cfg(test)]
    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    #[cfg(test)]
    pub fn last_armed(&self) -> Option<Mode> {
        self.last_armed
    }

    #[cfg(test)]
    /// Mode currently shown as active, by hover or hotkey
    pub fn highlighted(&self) -> Option<Mode> {
        self.highlighted
    }

    #[cfg(test)]
    pub fn has_pending_auto_apply(&self) -> bool {
        self.auto_apply.is_some()
    }

    /// Open a new session
    ///
    /// Returns `false` without touching anything when a session is already
    /// open, so overlapping probe triggers never stack menus.
    pub fn open(&mut self) -> bool {
        if self.open || !self.first_open_since_close {
            debug!("Session already open, ignoring open request");
            return false;
        }

        self.open = true;
        self.first_open_since_close = false;
        self.selected_index = None;
        self.last_armed = None;
        self.highlighted = None;
        self.reset_inactivity();

        info!("Mode selection session opened");
        true
    }

    /// Pointer entered the button for `mode`
    ///
    /// Highlights it and restarts the inactivity timer. A pending hotkey
    /// auto-apply is cancelled, but hovering never arms one and never moves
    /// the hotkey selection.
    pub fn hover(&mut self, mode: Mode) -> bool {
        if !self.open {
            return false;
        }

        self.reset_inactivity();
        self.highlighted = Some(mode);

        if let Some(armed) = self.auto_apply.take() {
            self.scheduler.cancel(armed.id);
            info!(
                "[auto] Hotkey selection {} cancelled by pointer interaction",
                armed.mode
            );
        }
        true
    }

    /// Hotkey pressed while open: select the next mode and arm auto-apply
    ///
    /// The first press selects the first mode of the cycle.
    pub fn cycle(&mut self) -> Option<Mode> {
        if !self.open {
            return None;
        }

        self.cancel_auto_apply();

        let index = match self.selected_index {
            Some(current) => (current + 1) % Mode::CYCLE.len(),
            None => 0,
        };
        let mode = Mode::from_cycle_index(index);

        self.selected_index = Some(index);
        self.highlighted = Some(mode);
        self.last_armed = Some(mode);
        self.reset_inactivity();

        let id = self
            .scheduler
            .schedule(TimerKind::AutoApply, AUTO_APPLY_DELAY);
        self.auto_apply = Some(ArmedApply { id, mode });

        debug!("Hotkey selected {} (index {}), auto-apply armed", mode, index);
        Some(mode)
    }

    /// Button for `mode` clicked
    ///
    /// Cancels a pending auto-apply and returns the mode to dispatch; the
    /// caller closes the session after dispatching.
    pub fn click(&mut self, mode: Mode) -> Option<Mode> {
        if !self.open {
            return None;
        }

        self.cancel_auto_apply();
        info!("Mode {} clicked", mode);
        Some(mode)
    }

    /// Close the session, cancelling both timers
    ///
    /// Returns whether a session was open. Closing a closed session is a no-op.
    pub fn close(&mut self) -> bool {
        if let Some(id) = self.inactivity.take() {
            self.scheduler.cancel(id);
        }
        self.cancel_auto_apply();

        let was_open = self.open;
        self.open = false;
        self.first_open_since_close = true;
        self.selected_index = None;
        self.last_armed = None;
        self.highlighted = None;

        if was_open {
            info!("Mode selection session closed");
        }
        was_open
    }

    /// Handle a timer delivered by the scheduler
    pub fn on_timer(&mut self, id: TimerId) -> TimerOutcome {
        if self.inactivity == Some(id) {
            self.inactivity = None;
            if !self.open {
                return TimerOutcome::Stale;
            }
            info!("Session closed after inactivity");
            self.close();
            return TimerOutcome::Expired;
        }

        match self.auto_apply {
            Some(armed) if armed.id == id => {
                self.auto_apply = None;
                if self.open && self.last_armed == Some(armed.mode) {
                    info!("[auto] Mode {} applied automatically", armed.mode);
                    TimerOutcome::Apply(armed.mode)
                } else {
                    debug!("Auto-apply for {} superseded, ignoring", armed.mode);
                    TimerOutcome::Stale
                }
            }
            _ => {
                debug!("Ignoring stale timer {:?}", id);
                TimerOutcome::Stale
            }
        }
    }

    fn reset_inactivity(&mut self) {
        if let Some(id) = self.inactivity.take() {
            self.scheduler.cancel(id);
        }
        let id = self
            .scheduler
            .schedule(TimerKind::Inactivity, INACTIVITY_TIMEOUT);
        self.inactivity = Some(id);
    }

    fn cancel_auto_apply(&mut self) {
        if let Some(armed) = self.auto_apply.take() {
            self.scheduler.cancel(armed.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeScheduler;
    use super::*;

    fn session() -> (Session<FakeScheduler>, FakeScheduler) {
        let clock = FakeScheduler::new();
        (Session::new(clock.clone()), clock)
    }

    #[test]
    fn test_open_arms_inactivity_only() {
        let (mut session, clock) = session();
        assert_eq!(session.state(), SessionState::Closed);

        assert!(session.open());
        assert_eq!(session.state(), SessionState::OpenNoSelection);
        assert_eq!(clock.pending_of(TimerKind::Inactivity), 1);
        assert_eq!(clock.pending_of(TimerKind::AutoApply), 0);
        assert_eq!(clock.deadline_of(TimerKind::Inactivity), Some(INACTIVITY_TIMEOUT));
    }

    #[test]
    fn test_open_while_open_is_noop() {
        let (mut session, clock) = session();
        session.open();
        session.cycle();
        let before = clock.pending();

        assert!(!session.open());
        assert_eq!(session.state(), SessionState::OpenSelected);
        assert_eq!(session.selected_index(), Some(0));
        assert_eq!(clock.pending(), before);
    }

    #[test]
    fn test_cycle_wraps() {
        let (mut session, _clock) = session();
        session.open();

        let modes: Vec<_> = (0..5).filter_map(|_| session.cycle()).collect();
        assert_eq!(
            modes,
            vec![
                Mode::Internal,
                Mode::External,
                Mode::Join,
                Mode::Mirror,
                Mode::Internal
            ]
        );
        assert_eq!(session.selected_index(), Some(0));
    }

    #[test]
    fn test_cycle_keeps_single_auto_apply() {
        let (mut session, clock) = session();
        session.open();
        session.cycle();
        clock.advance(Duration::from_secs(1));
        session.cycle();

        assert_eq!(clock.pending_of(TimerKind::AutoApply), 1);
        assert_eq!(clock.pending_of(TimerKind::Inactivity), 1);
        assert_eq!(
            clock.deadline_of(TimerKind::AutoApply),
            Some(Duration::from_secs(3))
        );
        // Inactivity on both presses, the first auto-apply on the second
        assert_eq!(clock.cancelled(), 3);
    }

    #[test]
    fn test_cycle_when_closed() {
        let (mut session, clock) = session();
        assert_eq!(session.cycle(), None);
        assert!(clock.pending().is_empty());
    }

    #[test]
    fn test_hover_does_not_select() {
        let (mut session, clock) = session();
        session.open();

        assert!(session.hover(Mode::Mirror));
        assert_eq!(session.highlighted(), Some(Mode::Mirror));
        assert_eq!(session.selected_index(), None);
        assert_eq!(session.state(), SessionState::OpenNoSelection);
        assert_eq!(clock.pending_of(TimerKind::AutoApply), 0);
    }

    #[test]
    fn test_hover_cancels_auto_apply_and_resets_inactivity() {
        let (mut session, clock) = session();
        session.open();
        session.cycle();
        clock.advance(Duration::from_secs(1));

        session.hover(Mode::Join);
        assert!(!session.has_pending_auto_apply());
        assert_eq!(clock.pending_of(TimerKind::AutoApply), 0);
        assert_eq!(
            clock.deadline_of(TimerKind::Inactivity),
            Some(Duration::from_secs(1) + INACTIVITY_TIMEOUT)
        );
        // Selection survives the hover, the next press continues from it
        assert_eq!(session.selected_index(), Some(0));
        assert_eq!(session.cycle(), Some(Mode::External));
    }

    #[test]
    fn test_auto_apply_fires() {
        let (mut session, clock) = session();
        session.open();
        session.cycle();

        let fired = clock.advance(AUTO_APPLY_DELAY);
        assert_eq!(fired.len(), 1);
        assert_eq!(session.on_timer(fired[0]), TimerOutcome::Apply(Mode::Internal));
    }

    #[test]
    fn test_superseded_auto_apply_is_stale() {
        let (mut session, clock) = session();
        session.open();

        let first = clock.pending().len();
        session.cycle();
        let (stale_id, _) = clock.pending()[first];
        session.cycle();

        // A late delivery of the cancelled timer must not apply Internal
        assert_eq!(session.on_timer(stale_id), TimerOutcome::Stale);
        assert!(session.is_open());
    }

    #[test]
    fn test_inactivity_closes() {
        let (mut session, clock) = session();
        session.open();

        let fired = clock.advance(INACTIVITY_TIMEOUT);
        assert_eq!(fired.len(), 1);
        assert_eq!(session.on_timer(fired[0]), TimerOutcome::Expired);
        assert_eq!(session.state(), SessionState::Closed);
        assert!(clock.pending().is_empty());
    }

    #[test]
    fn test_close_cancels_both_timers() {
        let (mut session, clock) = session();
        session.open();
        session.cycle();
        assert_eq!(clock.pending().len(), 2);

        assert!(session.close());
        assert!(clock.pending().is_empty());
        assert_eq!(session.selected_index(), None);
        assert_eq!(session.last_armed(), None);
        assert!(!session.close());
    }

    #[test]
    fn test_timer_after_close_is_stale() {
        let (mut session, clock) = session();
        session.open();
        session.cycle();
        let ids: Vec<_> = clock.pending().into_iter().map(|(id, _)| id).collect();
        session.close();

        for id in ids {
            assert_eq!(session.on_timer(id), TimerOutcome::Stale);
        }
    }

    #[test]
    fn test_click_cancels_auto_apply() {
        let (mut session, clock) = session();
        session.open();
        session.cycle();

        assert_eq!(session.click(Mode::External), Some(Mode::External));
        assert_eq!(clock.pending_of(TimerKind::AutoApply), 0);
    }

    #[test]
    fn test_click_when_closed() {
        let (mut session, _clock) = session();
        assert_eq!(session.click(Mode::External), None);
        assert!(!session.hover(Mode::External));
    }

    #[test]
    fn test_reopen_after_close_starts_fresh() {
        let (mut session, _clock) = session();
        session.open();
        session.cycle();
        session.cycle();
        session.close();

        assert!(session.open());
        assert_eq!(session.selected_index(), None);
        assert_eq!(session.cycle(), Some(Mode::Internal));
    }
}
