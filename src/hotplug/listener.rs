// SPDX-License-Identifier: GPL-3.0-only
use std::time::Duration;

use tokio::sync::mpsc::{self, Receiver, UnboundedSender};

use super::udev_monitor::UdevMonitor;
use crate::controller::ControllerEvent;

/// Time for connector status to settle after the last event of a burst
const SETTLE_DELAY: Duration = Duration::from_millis(1000);

/// Start udev monitoring on its own thread and forward debounced events
pub fn spawn_hotplug_listener(events: UnboundedSender<ControllerEvent>) {
    let (tx, rx) = mpsc::channel(100);

    std::thread::spawn(move || {
        let monitor = match UdevMonitor::new() {
            Ok(m) => m,
            Err(e) => {
                error!("Failed to initialize DRM hotplug monitoring: {}", e);
                return;
            }
        };

        let _err = monitor.run(|| match tx.try_send(()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("Hotplug channel full, skipping event");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    });

    tokio::spawn(forward(rx, events, SETTLE_DELAY));
}

/// Collapse each burst of raw events into one controller event
async fn forward(
    mut raw: Receiver<()>,
    events: UnboundedSender<ControllerEvent>,
    settle: Duration,
) {
    while raw.recv().await.is_some() {
        tokio::time::sleep(settle).await;

        let mut drained = 0;
        while raw.try_recv().is_ok() {
            drained += 1;
        }
        if drained > 0 {
            debug!("Drained {} additional hotplug events", drained);
        }

        info!("DRM hotplug settled, probing");
        if events.send(ControllerEvent::FileChanged).is_err() {
            break;
        }
    }

    debug!("Hotplug listener stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_one_event() {
        let (raw_tx, raw_rx) = mpsc::channel(10);
        let (tx, mut rx) = mpsc::unbounded_channel();

        for _ in 0..4 {
            raw_tx.try_send(()).unwrap();
        }
        drop(raw_tx);

        forward(raw_rx, tx, SETTLE_DELAY).await;

        assert_eq!(rx.try_recv().unwrap(), ControllerEvent::FileChanged);
        assert!(rx.try_recv().is_err());
    }
}
