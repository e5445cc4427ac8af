// SPDX-License-Identifier: GPL-3.0-only
//! Session menu rendered as a desktop notification
//!
//! The four modes are the notification's actions. Highlight changes replace
//! the notification in place, an invoked action is a click, and the user
//! dismissing the notification closes the session.
//!
//! The controller is synchronous, so [`NotificationView`] only queues
//! [`ViewCommand`]s; [`render`] performs the D-Bus calls on the runtime.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use futures::StreamExt;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use zbus::zvariant::Value;
use zbus::{Connection, proxy};

use super::{SessionView, UserNotifier};
use crate::controller::ControllerEvent;
use crate::mode::Mode;
use crate::scale::ScaleMetrics;

const APP_NAME: &str = "Display Mode Switcher";
const TITLE: &str = "HDMI Display Mode";
const ICON: &str = "video-display-symbolic";

/// `NotificationClosed` reason for "dismissed by the user"
const REASON_DISMISSED: u32 = 2;

#[proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications"
)]
trait Notifications {
    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: &[&str],
        hints: &HashMap<&str, &Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;

    fn close_notification(&self, id: u32) -> zbus::Result<()>;

    #[zbus(signal)]
    fn action_invoked(&self, id: u32, action_key: &str) -> zbus::Result<()>;

    #[zbus(signal)]
    fn notification_closed(&self, id: u32, reason: u32) -> zbus::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    Show(ScaleMetrics),
    Highlight(Option<Mode>),
    Hide,
    Notice {
        summary: String,
        body: String,
        icon: String,
    },
}

/// Id of the notification currently showing the session menu, 0 if none
pub type CurrentNotification = Arc<AtomicU32>;

/// Queues view changes for [`render`]
#[derive(Debug, Clone)]
pub struct NotificationView {
    commands: UnboundedSender<ViewCommand>,
}

impl NotificationView {
    pub fn new(commands: UnboundedSender<ViewCommand>) -> Self {
        Self { commands }
    }

    fn send(&self, command: ViewCommand) {
        if self.commands.send(command).is_err() {
            debug!("Notification renderer is gone, dropping view update");
        }
    }
}

impl SessionView for NotificationView {
    fn show(&mut self, metrics: ScaleMetrics) {
        self.send(ViewCommand::Show(metrics));
    }

    fn highlight(&mut self, mode: Option<Mode>) {
        self.send(ViewCommand::Highlight(mode));
    }

    fn hide(&mut self) {
        self.send(ViewCommand::Hide);
    }
}

impl UserNotifier for NotificationView {
    fn notify(&self, summary: &str, body: &str, icon: &str) {
        self.send(ViewCommand::Notice {
            summary: summary.to_string(),
            body: body.to_string(),
            icon: icon.to_string(),
        });
    }
}

/// Actions as alternating `key, label` pairs
fn mode_actions() -> Vec<&'static str> {
    Mode::CYCLE
        .iter()
        .flat_map(|mode| [mode.as_arg(), mode.label()])
        .collect()
}

fn menu_body(highlighted: Option<Mode>) -> String {
    match highlighted {
        Some(mode) => format!("Selected: {}", mode.label()),
        None => "Choose how to use the external display".to_string(),
    }
}

struct Menu {
    metrics: ScaleMetrics,
    highlighted: Option<Mode>,
}

/// Apply queued view commands until every [`NotificationView`] is dropped
pub async fn render(
    connection: Connection,
    mut commands: UnboundedReceiver<ViewCommand>,
    current: CurrentNotification,
) {
    let proxy = match NotificationsProxy::new(&connection).await {
        Ok(proxy) => proxy,
        Err(e) => {
            error!("Notification service unavailable, session menu disabled: {}", e);
            return;
        }
    };

    let mut menu: Option<Menu> = None;

    while let Some(command) = commands.recv().await {
        let result = match command {
            ViewCommand::Show(metrics) => {
                debug!("Showing session menu ({})", metrics);
                let shown = Menu {
                    metrics,
                    highlighted: None,
                };
                let result = show_menu(&proxy, &current, &shown).await;
                menu = Some(shown);
                result
            }
            ViewCommand::Highlight(mode) => match menu.as_mut() {
                Some(shown) if shown.highlighted != mode => {
                    shown.highlighted = mode;
                    show_menu(&proxy, &current, shown).await
                }
                _ => Ok(()),
            },
            ViewCommand::Hide => {
                menu = None;
                let id = current.swap(0, Ordering::SeqCst);
                if id != 0 {
                    // Already gone when the user picked an action
                    if let Err(e) = proxy.close_notification(id).await {
                        debug!("Closing notification {} failed: {}", id, e);
                    }
                }
                Ok(())
            }
            ViewCommand::Notice {
                summary,
                body,
                icon,
            } => proxy
                .notify(APP_NAME, 0, &icon, &summary, &body, &[], &HashMap::new(), -1)
                .await
                .map(|_| ()),
        };

        if let Err(e) = result {
            warn!("Notification request failed: {}", e);
        }
    }

    debug!("Notification renderer stopped");
}

async fn show_menu(
    proxy: &NotificationsProxy<'_>,
    current: &CurrentNotification,
    menu: &Menu,
) -> zbus::Result<()> {
    let margin_top = Value::from(menu.metrics.margin_top);
    let icon_size = Value::from(menu.metrics.icon_size);
    let font_size = Value::from(menu.metrics.font_size);
    let resident = Value::from(true);

    let mut hints = HashMap::new();
    hints.insert("resident", &resident);
    hints.insert("x-display-mode-switcher-margin-top", &margin_top);
    hints.insert("x-display-mode-switcher-icon-size", &icon_size);
    hints.insert("x-display-mode-switcher-font-size", &font_size);

    let actions = mode_actions();
    let id = proxy
        .notify(
            APP_NAME,
            current.load(Ordering::SeqCst),
            menu.highlighted.map_or(ICON, Mode::icon_name),
            TITLE,
            &menu_body(menu.highlighted),
            &actions,
            &hints,
            0,
        )
        .await?;
    current.store(id, Ordering::SeqCst);
    Ok(())
}

/// Turn notification signals for the session menu into controller events
pub async fn forward_interactions(
    connection: Connection,
    current: CurrentNotification,
    events: UnboundedSender<ControllerEvent>,
) {
    if let Err(e) = listen(&connection, &current, &events).await {
        warn!("Stopped listening for notification actions: {}", e);
    }
}

async fn listen(
    connection: &Connection,
    current: &CurrentNotification,
    events: &UnboundedSender<ControllerEvent>,
) -> zbus::Result<()> {
    let proxy = NotificationsProxy::new(connection).await?;
    let mut actions = proxy.receive_action_invoked().await?;
    let mut closed = proxy.receive_notification_closed().await?;

    let is_menu = |id: u32| id != 0 && id == current.load(Ordering::SeqCst);

    loop {
        let event = tokio::select! {
            // Servers close the notification right after an action; the
            // action has to win
            biased;
            Some(signal) = actions.next() => {
                let args = signal.args()?;
                if !is_menu(*args.id()) {
                    continue;
                }
                match args.action_key().parse::<Mode>() {
                    Ok(mode) => ControllerEvent::Click(mode),
                    Err(e) => {
                        debug!("Ignoring notification action: {}", e);
                        continue;
                    }
                }
            }
            Some(signal) = closed.next() => {
                let args = signal.args()?;
                if !is_menu(*args.id()) || *args.reason() != REASON_DISMISSED {
                    continue;
                }
                current.store(0, Ordering::SeqCst);
                ControllerEvent::Close
            }
            else => break,
        };

        if events.send(event).is_err() {
            break;
        }
    }
    Ok(())
}
