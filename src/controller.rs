// SPDX-License-Identifier: GPL-3.0-only
//! Top-level controller
//!
//! Owns the session, the event-file watch and the collaborators, and turns
//! events from the loop (hotkey, file change, pointer, timers) into session
//! transitions. Everything here runs on one thread, one event at a time.

use std::path::Path;

use crate::connector::{ConnectorProber, DEFAULT_DISPLAY_HEIGHT};
use crate::dispatcher::Dispatcher;
use crate::frontend::{LockState, SessionView, UserNotifier};
use crate::mode::Mode;
use crate::notifier::FileWatch;
use crate::scale::{ScaleMetrics, scale};
use crate::session::{Scheduler, Session, TimerId, TimerOutcome};

/// Everything the event loop can feed into the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerEvent {
    /// Global hotkey pressed: probe, or cycle when a session is open
    Hotkey,
    /// Settled change on the event file (or a udev hotplug)
    FileChanged,
    /// Pointer entered a mode button
    Hover(Mode),
    /// Mode button clicked
    Click(Mode),
    /// Close the session without applying anything
    Close,
    /// A scheduled session timer came due
    Timer(TimerId),
}

pub struct Controller<S: Scheduler> {
    prober: ConnectorProber,
    session: Session<S>,
    dispatcher: Dispatcher,
    view: Box<dyn SessionView>,
    notifier: Box<dyn UserNotifier>,
    lock: Box<dyn LockState>,
    watch: FileWatch,
    display_height: Option<i64>,
    notify_disconnected: bool,
}

impl<S: Scheduler> Controller<S> {
    pub fn new(
        prober: ConnectorProber,
        scheduler: S,
        dispatcher: Dispatcher,
        view: Box<dyn SessionView>,
        notifier: Box<dyn UserNotifier>,
        lock: Box<dyn LockState>,
    ) -> Self {
        Self {
            prober,
            session: Session::new(scheduler),
            dispatcher,
            view,
            notifier,
            lock,
            watch: FileWatch::new(),
            display_height: None,
            notify_disconnected: true,
        }
    }

    /// Use a fixed display height for the menu metrics instead of probing
    pub fn with_display_height(mut self, height: Option<i64>) -> Self {
        self.display_height = height;
        self
    }

    /// Whether to tell the user when no external display is found
    pub fn with_disconnect_notice(mut self, enabled: bool) -> Self {
        self.notify_disconnected = enabled;
        self
    }

    #[cfg(test)]
    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    pub fn is_watching(&self) -> bool {
        self.watch.is_active()
    }

    /// Start watching the event file
    ///
    /// `on_change` runs on the watcher's thread and should only post
    /// [`ControllerEvent::FileChanged`] back into the loop.
    pub fn enable<F>(&mut self, event_path: &Path, on_change: F)
    where
        F: Fn() + Send + 'static,
    {
        if let Err(e) = self.watch.watch(event_path, on_change) {
            error!("Event file monitoring failed: {}", e);
        }
    }

    /// Close any session and stop watching
    pub fn disable(&mut self) {
        self.close_session();
        self.watch.destroy();
        info!("Controller disabled");
    }

    pub fn handle(&mut self, event: ControllerEvent) {
        trace!(?event, state = ?self.session.state(), "Handling event");
        match event {
            ControllerEvent::Hotkey => self.on_hotkey(),
            ControllerEvent::FileChanged => self.on_file_change(),
            ControllerEvent::Hover(mode) => self.on_hover(mode),
            ControllerEvent::Click(mode) => self.on_click(mode),
            ControllerEvent::Close => self.close_session(),
            ControllerEvent::Timer(id) => self.on_timer(id),
        }
    }

    /// Probe when closed, advance the selection when open
    ///
    /// A press that opens the session also selects the first mode, so
    /// pressing once and waiting applies "internal only". Presses on the lock
    /// screen are dropped.
    pub fn on_hotkey(&mut self) {
        if self.lock.is_locked() {
            info!("Ignoring hotkey, screen is locked");
            return;
        }

        if self.session.is_open() {
            self.cycle();
            return;
        }

        let connected = self.prober.probe();
        if self.on_probe_result(connected) {
            self.cycle();
        }
    }

    /// Re-probe after a change notification, unless the desktop is locked
    pub fn on_file_change(&mut self) {
        if self.lock.is_locked() {
            info!("Ignoring change event, screen is locked");
            return;
        }

        let connected = self.prober.probe();
        self.on_probe_result(connected);
    }

    /// React to a probe; returns whether a new session was opened
    pub fn on_probe_result(&mut self, connected: bool) -> bool {
        if connected {
            if !self.session.open() {
                return false;
            }
            let metrics = self.metrics();
            self.view.show(metrics);
            return true;
        }

        self.close_session();
        info!("No external display connected");
        if self.notify_disconnected {
            self.notifier.notify(
                "HDMI not connected.",
                "You must have HDMI connected.",
                "dialog-information",
            );
        }
        false
    }

    pub fn on_hover(&mut self, mode: Mode) {
        if self.session.hover(mode) {
            self.view.highlight(Some(mode));
        }
    }

    pub fn on_click(&mut self, mode: Mode) {
        if let Some(mode) = self.session.click(mode) {
            self.apply(mode);
        }
    }

    pub fn on_timer(&mut self, id: TimerId) {
        match self.session.on_timer(id) {
            TimerOutcome::Stale => {}
            TimerOutcome::Expired => self.view.hide(),
            TimerOutcome::Apply(mode) => self.apply(mode),
        }
    }

    fn cycle(&mut self) {
        if let Some(mode) = self.session.cycle() {
            self.view.highlight(Some(mode));
        }
    }

    /// Dispatch exactly once, then tear the session down
    fn apply(&mut self, mode: Mode) {
        self.dispatcher.dispatch(mode);
        self.close_session();
    }

    fn close_session(&mut self) {
        if self.session.close() {
            self.view.hide();
        }
    }

    fn metrics(&self) -> ScaleMetrics {
        let height = self
            .display_height
            .or_else(|| self.prober.internal_panel_height())
            .unwrap_or(DEFAULT_DISPLAY_HEIGHT);
        let metrics = scale(height);
        debug!(height, %metrics, "Session menu metrics");
        metrics
    }
}
