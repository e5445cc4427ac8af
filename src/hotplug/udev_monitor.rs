// SPDX-License-Identifier: GPL-3.0-only
use std::ffi::OsStr;
use std::io;
use std::os::fd::AsRawFd;

/// Whether a DRM uevent reports a connector change
///
/// The kernel sends `change` with `HOTPLUG=1` on the card device when a
/// connector's status changes. Add and remove of the card itself count too.
pub fn is_connector_event(event_type: udev::EventType, hotplug: Option<&OsStr>) -> bool {
    match event_type {
        udev::EventType::Change => hotplug.is_some_and(|value| value == "1"),
        udev::EventType::Add | udev::EventType::Remove => true,
        _ => false,
    }
}

/// Monitors udev for DRM hotplug events
///
/// Runs on a dedicated thread because `MonitorSocket` is not Send; waits on
/// the socket with `libc::poll()`.
pub struct UdevMonitor {
    socket: udev::MonitorSocket,
}

impl UdevMonitor {
    pub fn new() -> io::Result<Self> {
        let socket = udev::MonitorBuilder::new()?
            .match_subsystem_devtype("drm", "drm_minor")?
            .listen()?;

        Ok(Self { socket })
    }

    /// Call `callback` for every connector event until it returns false
    ///
    /// Blocks the calling thread. Returns the error that ended the loop.
    pub fn run<F>(self, mut callback: F) -> io::Error
    where
        F: FnMut() -> bool,
    {
        info!("DRM hotplug monitoring started");

        let fd = self.socket.as_raw_fd();

        loop {
            let mut poll_fd = libc::pollfd {
                fd,
                events: libc::POLLIN,
                revents: 0,
            };

            // SAFETY: `poll_fd` is a valid pollfd for the lifetime of the call
            let poll_result = unsafe { libc::poll(&mut poll_fd, 1, -1) };

            if poll_result < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                error!("Poll error: {}", err);
                return err;
            }

            for event in self.socket.iter() {
                let hotplug = event.property_value("HOTPLUG");
                if !is_connector_event(event.event_type(), hotplug) {
                    continue;
                }

                debug!(
                    "DRM event: type={:?}, syspath={:?}",
                    event.event_type(),
                    event.syspath()
                );

                if !callback() {
                    info!("DRM hotplug monitoring stopped");
                    return io::Error::new(io::ErrorKind::Interrupted, "Stopped by callback");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_needs_hotplug_property() {
        assert!(is_connector_event(
            udev::EventType::Change,
            Some(OsStr::new("1"))
        ));
        assert!(!is_connector_event(
            udev::EventType::Change,
            Some(OsStr::new("0"))
        ));
        assert!(!is_connector_event(udev::EventType::Change, None));
    }

    #[test]
    fn test_add_and_remove_count() {
        assert!(is_connector_event(udev::EventType::Add, None));
        assert!(is_connector_event(udev::EventType::Remove, None));
        assert!(!is_connector_event(udev::EventType::Bind, None));
    }
}
