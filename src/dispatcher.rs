// SPDX-License-Identifier: GPL-3.0-only
//! Hands the chosen mode to the external mutator
//!
//! The mutator is the program that actually reconfigures the outputs. It is
//! started with one argument (`internal`, `external`, `join` or `mirror`) and
//! never awaited: its exit status is only logged, and a failing mutator is
//! invisible to the session.

use std::process::Stdio;

use crate::error::{AppError, Result};
use crate::mode::Mode;

pub const DEFAULT_MUTATOR: &str = "python3 /usr/share/display-mode-switcher/hdmi-switch.py";

/// Something that applies a display mode
pub trait Mutator {
    /// Start applying `mode`; must not block and must not fail loudly
    fn invoke(&self, mode: Mode);
}

/// Runs a configured command with the mode appended as last argument
#[derive(Debug, Clone)]
pub struct CommandMutator {
    program: String,
    args: Vec<String>,
}

impl CommandMutator {
    /// Build from a shell-style command line such as `python3 /path/switch.py`
    pub fn from_command_line(command: &str) -> Result<Self> {
        let mut words = shell_words::split(command)
            .map_err(|_| AppError::MutatorCommand(command.to_string()))?
            .into_iter();
        let program = words
            .next()
            .ok_or_else(|| AppError::MutatorCommand(command.to_string()))?;

        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Spawn the mutator and reap it in the background
    ///
    /// Must run inside a tokio runtime.
    fn spawn(&self, mode: Mode) -> Result<()> {
        let mut child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(mode.as_arg())
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| AppError::MutatorSpawn {
                program: self.program.clone(),
                source,
            })?;

        let program = self.program.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => debug!("{} {} finished", program, mode),
                Ok(status) => debug!("{} {} exited with {}", program, mode, status),
                Err(e) => debug!("Failed to wait for {}: {}", program, e),
            }
        });
        Ok(())
    }
}

impl Mutator for CommandMutator {
    fn invoke(&self, mode: Mode) {
        if let Err(e) = self.spawn(mode) {
            warn!("{}", e);
        }
    }
}

/// Maps a user decision to exactly one mutator invocation
pub struct Dispatcher {
    mutator: Box<dyn Mutator>,
}

impl Dispatcher {
    pub fn new(mutator: Box<dyn Mutator>) -> Self {
        Self { mutator }
    }

    pub fn dispatch(&self, mode: Mode) {
        info!("Applying {} display mode...", mode);
        self.mutator.invoke(mode);
        info!("Display mode set to: {}", mode);
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingMutator;
    use super::*;

    #[test]
    fn test_command_line_parsing() {
        let mutator =
            CommandMutator::from_command_line("python3 '/opt/my scripts/switch.py' --quiet")
                .unwrap();
        assert_eq!(mutator.program(), "python3");
        assert_eq!(mutator.args(), ["/opt/my scripts/switch.py", "--quiet"]);
    }

    #[test]
    fn test_invalid_command_lines() {
        assert!(CommandMutator::from_command_line("").is_err());
        assert!(CommandMutator::from_command_line("   ").is_err());
        assert!(CommandMutator::from_command_line("python3 'unterminated").is_err());
    }

    #[test]
    fn test_dispatch_invokes_once() {
        let mutator = RecordingMutator::default();
        let dispatcher = Dispatcher::new(Box::new(mutator.clone()));

        dispatcher.dispatch(Mode::Mirror);
        assert_eq!(mutator.calls(), vec![Mode::Mirror]);
    }

    #[tokio::test]
    async fn test_spawn_appends_mode() {
        let tmp = tempfile::TempDir::new().unwrap();
        let out = tmp.path().join("args");
        let command = format!("sh -c 'echo \"$1\" > {}' mutator", out.display());
        let mutator = CommandMutator::from_command_line(&command).unwrap();

        mutator.spawn(Mode::Join).unwrap();

        let mut contents = String::new();
        for _ in 0..50 {
            contents = std::fs::read_to_string(&out).unwrap_or_default();
            if !contents.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
        assert_eq!(contents.trim(), "join");
    }

    #[tokio::test]
    async fn test_missing_program_is_not_fatal() {
        let mutator =
            CommandMutator::from_command_line("/nonexistent/display-mode-switcher/mutator").unwrap();

        assert!(matches!(
            mutator.spawn(Mode::External),
            Err(AppError::MutatorSpawn { .. })
        ));
        // Through the trait the failure is only logged
        mutator.invoke(Mode::External);
    }
}
