// SPDX-License-Identifier: GPL-3.0-only
//! DRM hotplug detection using udev
//!
//! A second trigger next to the event file: connector changes reported by
//! the kernel are debounced and posted as [`ControllerEvent::FileChanged`],
//! so they go through the same lock check and probe.
//!
//! [`ControllerEvent::FileChanged`]: crate::controller::ControllerEvent::FileChanged

mod listener;
mod udev_monitor;

pub use listener::spawn_hotplug_listener;
