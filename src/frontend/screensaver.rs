// SPDX-License-Identifier: GPL-3.0-only
//! Desktop lock state from `org.freedesktop.ScreenSaver`

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::StreamExt;
use zbus::{Connection, proxy};

use super::LockState;

#[proxy(
    interface = "org.freedesktop.ScreenSaver",
    default_service = "org.freedesktop.ScreenSaver",
    default_path = "/org/freedesktop/ScreenSaver"
)]
trait ScreenSaver {
    /// Whether the screensaver (and with it the lock screen) is active
    fn get_active(&self) -> zbus::Result<bool>;

    #[zbus(signal)]
    fn active_changed(&self, active: bool) -> zbus::Result<()>;
}

/// Lock flag shared between the tracking task and the controller
#[derive(Debug, Clone, Default)]
pub struct SharedLockState(Arc<AtomicBool>);

impl SharedLockState {
    pub fn set(&self, locked: bool) {
        let previous = self.0.swap(locked, Ordering::SeqCst);
        if previous != locked {
            info!("Desktop session {}", if locked { "locked" } else { "unlocked" });
        }
    }
}

impl LockState for SharedLockState {
    fn is_locked(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Keep `state` in sync with the screensaver until the bus goes away
///
/// Without a screensaver service the session is treated as unlocked.
pub async fn track(connection: Connection, state: SharedLockState) {
    match follow(&connection, &state).await {
        Ok(()) => debug!("Screensaver signal stream ended"),
        Err(e) => warn!("Screen lock state unavailable, assuming unlocked: {}", e),
    }
}

async fn follow(connection: &Connection, state: &SharedLockState) -> zbus::Result<()> {
    let proxy = ScreenSaverProxy::new(connection).await?;

    // Subscribe before the initial read so no transition is missed
    let mut changes = proxy.receive_active_changed().await?;
    state.set(proxy.get_active().await?);

    while let Some(signal) = changes.next().await {
        let args = signal.args()?;
        state.set(*args.active());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_state() {
        let state = SharedLockState::default();
        let reader = state.clone();
        assert!(!reader.is_locked());

        state.set(true);
        assert!(reader.is_locked());
        state.set(false);
        assert!(!reader.is_locked());
    }
}
