// SPDX-License-Identifier: GPL-3.0-only
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::connector::ConnectorProber;
use crate::mode::Mode;
use crate::service::SwitcherProxy;

#[macro_use]
extern crate tracing;

mod config;
mod connector;
mod controller;
mod daemon;
mod dispatcher;
mod error;
mod frontend;
#[cfg(feature = "udev-hotplug")]
mod hotplug;
mod mode;
mod notifier;
mod scale;
mod service;
mod session;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Config file instead of $XDG_CONFIG_HOME/display-mode-switcher/config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the daemon (default)
    Run,
    /// Press the hotkey: probe, or cycle the open menu
    Hotkey,
    /// Apply a mode and close the menu
    Select { mode: Mode },
    /// Highlight a mode as if the pointer entered its button
    Hover { mode: Mode },
    /// Close the menu without applying anything
    Close,
    /// List connectors; exits 0 when an external display is connected
    Probe,
    /// Print the menu metrics for a display height
    Scale { height: i64 },
}

fn setup_logs() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = fmt::layer().with_target(false);
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new(format!(
        "warn,{}=info",
        env!("CARGO_CRATE_NAME")
    )));

    if let Ok(journal_layer) = tracing_journald::layer() {
        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .with(journal_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    setup_logs();

    let cli = Cli::parse();
    let config = Config::load_or_default(cli.config.as_deref());

    let result = match cli.command.unwrap_or(Command::Run) {
        Command::Run => daemon::run(config).await,
        Command::Hotkey => call(|proxy| async move { proxy.hotkey().await }).await,
        Command::Select { mode } => {
            call(|proxy| async move { proxy.select(mode.as_arg()).await }).await
        }
        Command::Hover { mode } => {
            call(|proxy| async move { proxy.hover(mode.as_arg()).await }).await
        }
        Command::Close => call(|proxy| async move { proxy.close().await }).await,
        Command::Probe => return probe(&config),
        Command::Scale { height } => {
            println!("{}", scale::scale(height));
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Call the running daemon
async fn call<F, Fut>(request: F) -> anyhow::Result<()>
where
    F: FnOnce(SwitcherProxy<'static>) -> Fut,
    Fut: Future<Output = zbus::Result<()>>,
{
    let connection = zbus::Connection::session()
        .await
        .context("Failed to connect to D-Bus session bus")?;
    let proxy = SwitcherProxy::new(&connection)
        .await
        .context("Failed to create switcher proxy")?;

    request(proxy)
        .await
        .context("Request to the switcher daemon failed (is it running?)")
}

fn probe(config: &Config) -> ExitCode {
    let prober = ConnectorProber::new(config.drm_path.clone());
    let connectors = match prober.scan() {
        Ok(connectors) => connectors,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    for connector in &connectors {
        println!(
            "{}\t{:?}\t{}",
            connector.name,
            connector.kind,
            if connector.connected { "connected" } else { "disconnected" }
        );
    }

    if connectors.iter().any(|c| c.connected) {
        println!("External display connected");
        ExitCode::SUCCESS
    } else {
        println!("No external display connected");
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_command_is_run() {
        let cli = Cli::parse_from(["display-mode-switcher"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_mode_arguments() {
        let cli = Cli::parse_from(["display-mode-switcher", "select", "mirror"]);
        assert!(matches!(cli.command, Some(Command::Select { mode: Mode::Mirror })));

        assert!(Cli::try_parse_from(["display-mode-switcher", "hover", "sideways"]).is_err());
    }
}
