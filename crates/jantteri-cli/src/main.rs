//! Jantteri CLI - run Lua device scripts as concurrent sessions.
//!
//! Starts `--sessions` sessions of the configured script, prints every
//! publication to stdout as one JSON line, and ends all sessions when they
//! finish on their own, on Ctrl-C, or after `--run-for` seconds.
//!
//! ```text
//! {"topic":"console_output","payload":{"message":"Round 1","session_id":"QWERTY","timestamp":1760000000.12}}
//! {"topic":"jantteri_event","payload":{"device_id":1,"event_kind":"ACTIVATE_REQUEST","timestamp":1760000000,"delay":0.0}}
//! ```
//!
//! # Configuration
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`JANTTERI_*`)
//! 3. Config file (`jantteri.toml` in the current directory, or `--config`)
//! 4. Default values (lowest priority)
//!
//! Logs go to stderr so stdout stays machine-readable.

use anyhow::{bail, Result};
use clap::Parser;
use jantteri_lua::LuaHost;
use jantteri_runtime::{
    load_script, ConfigError, ConfigLoader, JantteriConfig, Rooms, SessionEnd, SessionRegistry,
};
use jantteri_types::{ErrorCode, SessionId};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// How often the main loop checks whether every session has finished.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Jantteri - Lua script session engine
#[derive(Parser, Debug)]
#[command(name = "jantteri")]
#[command(version, about, long_about = None)]
struct Args {
    /// Config file (defaults to ./jantteri.toml when present)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Script to run (overrides config and JANTTERI_SCRIPT)
    #[arg(short, long, value_name = "PATH")]
    script: Option<PathBuf>,

    /// Number of sessions to start
    #[arg(short = 'n', long, default_value_t = 1)]
    sessions: usize,

    /// Stop all sessions after this many seconds
    #[arg(long, value_name = "SECS", allow_negative_numbers = true)]
    run_for: Option<f64>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn run_limit(&self) -> Option<Duration> {
        self.run_for
            .map(|secs| Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX))
    }
}

/// Loads file/env config through `loader` and applies CLI overrides.
fn resolve_config(args: &Args, mut loader: ConfigLoader) -> Result<JantteriConfig, ConfigError> {
    if let Some(ref path) = args.config {
        loader = loader.with_config_file(path);
    }

    let mut config = loader.load()?;

    if let Some(ref path) = args.script {
        config.script.path.clone_from(path);
    }

    Ok(config)
}

/// Terminal filter: --debug > --verbose > RUST_LOG > configured level.
fn filter_directive(args: &Args, rust_log: Option<String>, configured: &str) -> String {
    if args.debug {
        "debug".into()
    } else if args.verbose {
        "info".into()
    } else {
        rust_log.unwrap_or_else(|| configured.to_string())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = resolve_config(&args, ConfigLoader::new())
        .map_err(|e| anyhow::anyhow!("Config error: {e}"))?;

    let directive = filter_directive(
        &args,
        std::env::var(EnvFilter::DEFAULT_ENV).ok(),
        &config.logging.level,
    );
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("Warning: invalid log filter '{directive}': {e}");
        EnvFilter::new("warn")
    });
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .init();

    info!(
        script = %config.script.path.display(),
        sleep_slice_ms = config.session.sleep_slice_ms,
        stop_timeout_ms = config.session.stop_timeout_ms,
        "Configuration resolved"
    );

    let mut registry = SessionRegistry::new(Arc::new(LuaHost::new()), Arc::new(Rooms::new()))
        .with_session_config(&config.session);

    match load_script(&config.script.path) {
        Ok(source) => {
            info!(path = %config.script.path.display(), "Default script loaded");
            registry = registry.with_default_script(source);
        }
        Err(e) => {
            warn!(code = e.code(), error = %e, "Could not load default script");
            warn!("Session creation will be unavailable until the script is fixed");
        }
    }
    let registry = Arc::new(registry);

    let mut ids = Vec::with_capacity(args.sessions);
    let mut forwarders = Vec::with_capacity(args.sessions);
    for _ in 0..args.sessions {
        match registry.create() {
            Ok(id) => {
                let subscription = registry.subscribe(&id)?;
                forwarders.push(tokio::spawn(forward(subscription)));
                ids.push(id);
            }
            Err(e) => {
                error!(code = e.code(), error = %e, "Failed to create session");
                break;
            }
        }
    }

    if ids.is_empty() && args.sessions > 0 {
        bail!("no sessions could be started");
    }
    info!(count = ids.len(), "Sessions started");

    let limit = async {
        match args.run_limit() {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        () = wait_for_sessions(&registry, &ids) => info!("All sessions finished"),
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "Failed to listen for Ctrl-C");
            }
            info!("Interrupted, stopping sessions");
        }
        () = limit => info!("Run time limit reached, stopping sessions"),
    }

    // `end` blocks while sessions acknowledge the stop.
    let ender = Arc::clone(&registry);
    let reports = tokio::task::spawn_blocking(move || ender.end_all()).await?;

    // Rooms are closed by `end`, so every forwarder drains and returns.
    for forwarder in forwarders {
        if let Err(e) = forwarder.await {
            warn!(error = %e, "Output forwarder failed");
        }
    }

    print_summary(&reports);
    Ok(())
}

/// Writes each publication of one session to stdout as a JSON line.
async fn forward(mut subscription: jantteri_runtime::Subscription) {
    while let Some(publication) = subscription.recv().await {
        match serde_json::to_string(&publication) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!(
                session_id = %subscription.session_id(),
                error = %e,
                "Failed to encode publication"
            ),
        }
    }
}

async fn wait_for_sessions(registry: &SessionRegistry, ids: &[SessionId]) {
    let mut tick = tokio::time::interval(POLL_INTERVAL);
    loop {
        tick.tick().await;
        let done = ids.iter().all(|id| {
            registry
                .get(id)
                .map_or(true, |info| info.status.is_terminal())
        });
        if done {
            return;
        }
    }
}

fn print_summary(reports: &[SessionEnd]) {
    eprintln!("Ended {} session(s)", reports.len());
    for report in reports {
        if report.exited_in_time {
            eprintln!("  {}: {}", report.session_id, report.state);
        } else {
            eprintln!(
                "  {}: {} (did not stop in time, detached)",
                report.session_id, report.state
            );
        }
    }
}
