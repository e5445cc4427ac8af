// SPDX-License-Identifier: GPL-3.0-only
//! Session-bus interface of the daemon
//!
//! Owning [`BUS_NAME`] doubles as the hotkey registration: a compositor
//! shortcut runs `display-mode-switcher hotkey`, which calls `Hotkey()` here.
//! A second daemon fails to acquire the name and exits.

use tokio::sync::mpsc::UnboundedSender;
use zbus::{fdo, interface, proxy};

use crate::controller::ControllerEvent;
use crate::mode::Mode;

pub const BUS_NAME: &str = "io.github.DisplayModeSwitcher";
pub const OBJECT_PATH: &str = "/io/github/DisplayModeSwitcher";

/// Forwards method calls into the controller's event loop
pub struct SwitcherService {
    events: UnboundedSender<ControllerEvent>,
}

impl SwitcherService {
    pub fn new(events: UnboundedSender<ControllerEvent>) -> Self {
        Self { events }
    }

    fn post(&self, event: ControllerEvent) -> fdo::Result<()> {
        self.events
            .send(event)
            .map_err(|_| fdo::Error::Failed("Controller is shutting down".to_string()))
    }
}

fn parse_mode(mode: &str) -> fdo::Result<Mode> {
    mode.parse()
        .map_err(|e: crate::error::AppError| fdo::Error::InvalidArgs(e.to_string()))
}

#[interface(name = "io.github.DisplayModeSwitcher1")]
impl SwitcherService {
    /// Probe for an external display, or cycle the selection of the open menu
    fn hotkey(&self) -> fdo::Result<()> {
        debug!("Hotkey requested over D-Bus");
        self.post(ControllerEvent::Hotkey)
    }

    /// Pointer entered the button for `mode`
    fn hover(&self, mode: &str) -> fdo::Result<()> {
        let mode = parse_mode(mode)?;
        self.post(ControllerEvent::Hover(mode))
    }

    /// Apply `mode` and close the menu
    fn select(&self, mode: &str) -> fdo::Result<()> {
        let mode = parse_mode(mode)?;
        self.post(ControllerEvent::Click(mode))
    }

    /// Close the menu without applying anything
    fn close(&self) -> fdo::Result<()> {
        self.post(ControllerEvent::Close)
    }
}

/// Client side, used by the CLI subcommands
#[proxy(
    interface = "io.github.DisplayModeSwitcher1",
    default_service = "io.github.DisplayModeSwitcher",
    default_path = "/io/github/DisplayModeSwitcher"
)]
pub trait Switcher {
    fn hotkey(&self) -> zbus::Result<()>;
    fn hover(&self, mode: &str) -> zbus::Result<()>;
    fn select(&self, mode: &str) -> zbus::Result<()>;
    fn close(&self) -> zbus::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_methods_post_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let service = SwitcherService::new(tx);

        service.hotkey().unwrap();
        service.hover("join").unwrap();
        service.select("External").unwrap();
        service.close().unwrap();

        assert_eq!(rx.try_recv().unwrap(), ControllerEvent::Hotkey);
        assert_eq!(rx.try_recv().unwrap(), ControllerEvent::Hover(Mode::Join));
        assert_eq!(rx.try_recv().unwrap(), ControllerEvent::Click(Mode::External));
        assert_eq!(rx.try_recv().unwrap(), ControllerEvent::Close);
    }

    #[test]
    fn test_invalid_mode_rejected() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let service = SwitcherService::new(tx);

        assert!(matches!(
            service.select("upside-down"),
            Err(fdo::Error::InvalidArgs(_))
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_loop_reports_failure() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let service = SwitcherService::new(tx);

        assert!(service.hotkey().is_err());
    }
}
