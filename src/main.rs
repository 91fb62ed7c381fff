mod api;
mod cli;
mod config;
mod error;
mod handoff;
mod model;
mod orchestrator;
mod pages;
mod progress;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use anyhow::{Context, Result};
use clap::Parser;

/// Install the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `-v`/`-vv` raise the default `warn` level. The TUI
/// owns the terminal, so in that mode logs go to a file under the local data directory.
fn init_logging(verbose: u8, to_file: bool) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("{level},hyper=warn,reqwest=warn")))?;

    let fmt_layer = if to_file {
        let dir = dirs::data_local_dir()
            .context("no local data directory for the log file")?
            .join("imageauto");
        std::fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        let path = dir.join("imageauto.log");
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open {}", path.display()))?;
        fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(std::sync::Mutex::new(file))
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "logging initialised");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_tui = args.is_tui();
    if let Err(e) = init_logging(args.verbose, is_tui) {
        eprintln!("Logging disabled: {e:#}");
    }

    match cli::run(args).await {
        Ok(()) => {
            // Explicitly exit with code 0 on success, especially for non-TUI modes
            if !is_tui {
                std::process::exit(0);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}
