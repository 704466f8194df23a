//! `tuyadash-tui`: terminal dashboard for smart-home devices.
//!
//! Shows one card per device with its connectivity, readings and switch
//! buttons. Toggling a switch writes through the dashboard core, which marks
//! the button pending and re-reads the device until the card settles.
//!
//! Logs are written to a file (default `/tmp/tuyadash-tui.log`) to avoid
//! corrupting the terminal UI.

mod action;
mod app;
mod component;
mod event;
mod screens;
mod theme;
mod tui;
mod view;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use tuyadash_core::DashboardConfig;

use crate::app::App;

/// Terminal dashboard for switching and watching smart-home devices.
#[derive(Parser, Debug)]
#[command(name = "tuyadash-tui", version, about)]
struct Cli {
    /// Backend base URL (e.g., http://192.168.1.10:8080)
    #[arg(short = 'u', long, env = "TUYADASH_URL")]
    url: Option<String>,

    /// Configuration profile to use
    #[arg(short = 'p', long, env = "TUYADASH_PROFILE")]
    profile: Option<String>,

    /// Log file path (defaults to /tmp/tuyadash-tui.log)
    #[arg(long, default_value = "/tmp/tuyadash-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-based tracing; stdout and stderr belong to the terminal UI.
/// The returned guard must live until exit so buffered logs are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "tuyadash_tui={log_level},tuyadash_core={log_level},tuyadash_api={log_level}"
        ))
    });

    let log_dir = cli
        .log_file
        .parent()
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("tuyadash-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    guard
}

/// `--url` wins; otherwise the named (or default) profile is used.
fn build_config(cli: &Cli) -> Result<DashboardConfig> {
    if let Some(ref raw) = cli.url {
        let url = tuyadash_config::parse_backend_url(raw)?;
        return Ok(DashboardConfig::new(url));
    }

    let cfg = tuyadash_config::load_config()?;
    let (name, profile) = cfg.profile(cli.profile.as_deref()).wrap_err_with(|| {
        format!(
            "no backend configured; pass --url or create a profile in {}",
            tuyadash_config::config_path().display()
        )
    })?;
    info!(profile = name, "using configured profile");
    Ok(tuyadash_config::profile_to_dashboard_config(
        profile,
        &cfg.defaults,
    )?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Install panic/error hooks BEFORE entering the terminal
    tui::install_hooks()?;

    let _log_guard = setup_tracing(&cli);

    let config = build_config(&cli)?;
    info!(url = %config.url, "starting tuyadash-tui");

    let mut app = App::new(&config)?;
    app.run().await?;

    Ok(())
}
