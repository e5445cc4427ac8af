// SPDX-License-Identifier: GPL-3.0-only
//! The long-running switcher daemon
//!
//! Owns the session-bus name, watches the event file, and feeds every input
//! (file changes, D-Bus calls, notification actions, timers) through one
//! channel into the [`Controller`], which runs on the main task only.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use zbus::connection;

use crate::config::Config;
use crate::connector::ConnectorProber;
use crate::controller::{Controller, ControllerEvent};
use crate::dispatcher::{CommandMutator, Dispatcher};
use crate::frontend::notification::{self, CurrentNotification, NotificationView};
use crate::frontend::screensaver::{self, SharedLockState};
use crate::service::{BUS_NAME, OBJECT_PATH, SwitcherService};
use crate::session::{Scheduler, TimerId, TimerKind};

/// Session timers as tokio tasks that post [`ControllerEvent::Timer`]
pub struct TokioScheduler {
    events: UnboundedSender<ControllerEvent>,
    next_id: u64,
    handles: HashMap<TimerId, JoinHandle<()>>,
}

impl TokioScheduler {
    pub fn new(events: UnboundedSender<ControllerEvent>) -> Self {
        Self {
            events,
            next_id: 0,
            handles: HashMap::new(),
        }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, kind: TimerKind, delay: Duration) -> TimerId {
        self.handles.retain(|_, handle| !handle.is_finished());

        self.next_id += 1;
        let id = TimerId(self.next_id);
        let events = self.events.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            trace!("{:?} timer {:?} fired", kind, id);
            let _ = events.send(ControllerEvent::Timer(id));
        });
        self.handles.insert(id, handle);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(handle) = self.handles.remove(&id) {
            handle.abort();
        }
    }
}

fn build_dispatcher(command: &str) -> Result<Dispatcher> {
    let mutator = CommandMutator::from_command_line(command).context("Invalid mutator")?;
    info!("Mutator: {} {}", mutator.program(), mutator.args().join(" "));
    Ok(Dispatcher::new(Box::new(mutator)))
}

/// Run until SIGINT or SIGTERM
pub async fn run(config: Config) -> Result<()> {
    info!("Starting display mode switcher");

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();

    let connection = connection::Builder::session()
        .context("Failed to connect to D-Bus session bus")?
        .name(BUS_NAME)
        .context("Invalid bus name")?
        .serve_at(OBJECT_PATH, SwitcherService::new(events_tx.clone()))
        .context("Failed to export switcher interface")?
        .build()
        .await
        .with_context(|| format!("Failed to acquire {} (is the daemon already running?)", BUS_NAME))?;

    info!("Listening on {} {}", BUS_NAME, OBJECT_PATH);

    let lock = SharedLockState::default();
    tokio::spawn(screensaver::track(connection.clone(), lock.clone()));

    let (view_tx, view_rx) = mpsc::unbounded_channel();
    let current = CurrentNotification::default();
    tokio::spawn(notification::render(connection.clone(), view_rx, current.clone()));
    tokio::spawn(notification::forward_interactions(
        connection.clone(),
        current,
        events_tx.clone(),
    ));

    let view = NotificationView::new(view_tx);
    let mut controller = Controller::new(
        ConnectorProber::new(config.drm_path.clone()),
        TokioScheduler::new(events_tx.clone()),
        build_dispatcher(&config.mutator)?,
        Box::new(view.clone()),
        Box::new(view),
        Box::new(lock),
    )
    .with_display_height(config.display_height)
    .with_disconnect_notice(config.notify_disconnected);

    let file_events = events_tx.clone();
    controller.enable(&config.event_path, move || {
        let _ = file_events.send(ControllerEvent::FileChanged);
    });
    if !controller.is_watching() {
        warn!(
            "Not watching {}, only the hotkey will open the menu",
            config.event_path.display()
        );
    }

    if config.udev_hotplug {
        #[cfg(feature = "udev-hotplug")]
        crate::hotplug::spawn_hotplug_listener(events_tx.clone());
        #[cfg(not(feature = "udev-hotplug"))]
        warn!("udev_hotplug is set but this build lacks the udev-hotplug feature");
    }

    drop(events_tx);

    let mut sigterm = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

    loop {
        tokio::select! {
            event = events_rx.recv() => match event {
                Some(event) => controller.handle(event),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            _ = sigterm.recv() => {
                info!("Terminated");
                break;
            }
        }
    }

    controller.disable();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timer_posts_event() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = TokioScheduler::new(tx);

        let id = scheduler.schedule(TimerKind::AutoApply, Duration::from_secs(2));
        assert_eq!(rx.recv().await, Some(ControllerEvent::Timer(id)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_stays_silent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = TokioScheduler::new(tx);

        let cancelled = scheduler.schedule(TimerKind::Inactivity, Duration::from_secs(5));
        let kept = scheduler.schedule(TimerKind::Inactivity, Duration::from_secs(6));
        scheduler.cancel(cancelled);

        assert_eq!(rx.recv().await, Some(ControllerEvent::Timer(kept)));
        assert_ne!(cancelled, kept);
    }

    #[test]
    fn test_bad_mutator_rejected() {
        assert!(build_dispatcher("\"unterminated").is_err());
        assert!(build_dispatcher("/usr/bin/switch --quiet").is_ok());
    }
}
