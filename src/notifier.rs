// SPDX-License-Identifier: GPL-3.0-only
//! Change notifications for the hotplug event file
//!
//! An external agent (typically a udev rule) writes to a well-known file when
//! a connector changes. Only "changes settled" events, i.e. the file being
//! closed after a write or another file being renamed over it, are forwarded,
//! so a burst of writes produces a single callback.
//!
//! The watch is placed on the parent directory and filtered by file name, so
//! it survives the file being deleted and recreated or atomically replaced.
//!
//! A path that does not exist when the watch is set up is logged and left
//! unwatched. There is no retry: the file has to exist when the daemon starts.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use notify::event::{AccessKind, AccessMode, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::{AppError, Result};

pub const DEFAULT_EVENT_PATH: &str = "/opt/hdmi-events";

/// Is this the event that ends a burst of writes?
pub fn is_settled(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Access(AccessKind::Close(AccessMode::Write))
            | EventKind::Modify(ModifyKind::Name(RenameMode::To))
    )
}

fn concerns(event: &Event, file_name: &OsStr) -> bool {
    event
        .paths
        .iter()
        .any(|path| path.file_name() == Some(file_name))
}

/// Directory to watch for `path`; `.` for a bare file name
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Subscription to settled changes on a single path
#[derive(Default)]
pub struct FileWatch {
    watcher: Option<RecommendedWatcher>,
    dir: Option<PathBuf>,
}

impl std::fmt::Debug for FileWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatch")
            .field("dir", &self.dir)
            .field("active", &self.is_active())
            .finish()
    }
}

impl FileWatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.watcher.is_some()
    }

    /// Start watching `path`, calling `on_change` for every settled change
    ///
    /// Replaces any previous subscription. A missing path is not an error: the
    /// watch simply stays inactive.
    pub fn watch<F>(&mut self, path: &Path, on_change: F) -> Result<()>
    where
        F: Fn() + Send + 'static,
    {
        self.destroy();

        if !path.exists() {
            warn!("Event file not found, not watching: {}", path.display());
            return Ok(());
        }

        let Some(file_name) = path.file_name().map(OsStr::to_os_string) else {
            warn!("Event path has no file name, not watching: {}", path.display());
            return Ok(());
        };
        let dir = parent_dir(path).to_path_buf();

        let event_path = path.to_path_buf();
        let mut watcher = notify::recommended_watcher(
            move |result: std::result::Result<Event, notify::Error>| match result {
                Ok(event) => {
                    if is_settled(&event.kind) && concerns(&event, &file_name) {
                        info!("Change detected in {}", event_path.display());
                        on_change();
                    }
                }
                Err(e) => warn!("File watch error on {}: {}", event_path.display(), e),
            },
        )
        .map_err(|source| AppError::Watch {
            path: path.to_path_buf(),
            source,
        })?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|source| AppError::Watch {
                path: path.to_path_buf(),
                source,
            })?;

        info!("Watching {} for hotplug events", path.display());
        self.watcher = Some(watcher);
        self.dir = Some(dir);
        Ok(())
    }

    /// Cancel the subscription; safe to call repeatedly or when never watching
    pub fn destroy(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            if let Some(dir) = self.dir.take() {
                if let Err(e) = watcher.unwatch(&dir) {
                    debug!("Unwatch of {} failed: {}", dir.display(), e);
                }
                debug!("Stopped watching {}", dir.display());
            }
        }
    }
}

impl Drop for FileWatch {
    fn drop(&mut self) {
        self.destroy();
    }
}
