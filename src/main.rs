use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use modeswitch::clock::{SystemClock, resolve_now};
use modeswitch::config::{Config, verify_schedule};
use modeswitch::device::DeviceConnector;
use modeswitch::error::SwitcherError;
use modeswitch::logging::init_logging;
use modeswitch::mode::Mode;
use modeswitch::reconciler::Reconciler;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version = env!("APP_VERSION"), about, propagate_version = true)]
struct Args {
    /// Configuration file; the default locations are searched when omitted
    #[clap(long, short = 'c', env = "MODESWITCH_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile the gateway once against the schedule and exit.
    Run,

    /// Serve the HTTP trigger; every request to /api/reconcile is one invocation.
    #[cfg(feature = "web")]
    Serve {
        /// Bind address (overrides web.host)
        #[clap(long)]
        host: Option<String>,

        /// TCP port (overrides web.port)
        #[clap(long)]
        port: Option<u16>,
    },

    /// Check the schedule in the configuration file and exit.
    #[clap(name = "verify-config")]
    VerifyConfig,
}

const EXIT_FAILED: u8 = 1;
const EXIT_CONFIG: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let result = match args.command {
        Command::Run => run_once(args.config).await,
        #[cfg(feature = "web")]
        Command::Serve { host, port } => serve(args.config, host, port).await,
        Command::VerifyConfig => verify_config(args.config),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_status(&e))
        }
    }
}

/// Configuration problems exit 2; anything else that stops the process exits 1
fn exit_status(err: &anyhow::Error) -> u8 {
    let is_config = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<SwitcherError>())
        .any(SwitcherError::is_config);
    if is_config { EXIT_CONFIG } else { EXIT_FAILED }
}

/// Load, validate and start logging; any failure here is a configuration error
fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config = Config::load_from(path.as_deref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    init_logging(&config.logging).context("Failed to initialize logging")?;
    Ok(config)
}

#[cfg(feature = "cloud")]
fn build_connector(config: &Config) -> Result<Arc<dyn DeviceConnector>> {
    let connector = modeswitch::cloud::CloudConnector::new(config.device.clone())
        .context("Failed to build gateway client")?;
    Ok(Arc::new(connector))
}

#[cfg(not(feature = "cloud"))]
fn build_connector(_config: &Config) -> Result<Arc<dyn DeviceConnector>> {
    Err(SwitcherError::config("This build has no gateway client; enable the `cloud` feature").into())
}

async fn run_once(path: Option<PathBuf>) -> Result<ExitCode> {
    let config = load_config(path)?;
    let reconciler = Reconciler::from_config(&config).context("Invalid schedule")?;
    let connector = build_connector(&config)?;
    let tz = config.tz()?;

    info!("Modeswitch {} starting reconciliation", env!("APP_VERSION"));
    let now = resolve_now(&SystemClock, tz);
    let outcome = reconciler.run(&now, connector.as_ref()).await;

    println!("{}", outcome.summary());
    if outcome.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        error!("Reconciliation failed: {}", outcome);
        Ok(ExitCode::from(EXIT_FAILED))
    }
}

#[cfg(feature = "web")]
async fn serve(path: Option<PathBuf>, host: Option<String>, port: Option<u16>) -> Result<ExitCode> {
    use modeswitch::web::{AppState, serve};

    let config = load_config(path)?;
    let state = AppState {
        reconciler: Arc::new(Reconciler::from_config(&config).context("Invalid schedule")?),
        connector: build_connector(&config)?,
        clock: Arc::new(SystemClock),
        tz: config.tz()?,
    };

    let host = host.unwrap_or_else(|| config.web.host.clone());
    let port = port.unwrap_or(config.web.port);
    info!("Modeswitch {} serving the HTTP trigger", env!("APP_VERSION"));

    serve(state, &host, port).await?;
    Ok(ExitCode::SUCCESS)
}

fn verify_config(path: Option<PathBuf>) -> Result<ExitCode> {
    let config = Config::load_from(path.as_deref()).context("Failed to load configuration")?;
    let report = verify_schedule(&config);

    println!("Timezone: {}", config.timezone);
    let tz_ok = config.tz().is_ok();
    if !tz_ok {
        println!("  INVALID TIMEZONE");
    }

    println!("Schedule ({} entries):", report.checks.len());
    for check in &report.checks {
        let status = match (check.time_valid, check.mode_valid) {
            (true, true) => "valid",
            (false, true) => "INVALID TIME",
            (true, false) => "INVALID MODE",
            (false, false) => "INVALID TIME AND MODE",
        };
        println!("  {} -> {}: {}", check.time, check.mode, status);
    }
    for time in &report.duplicate_times {
        let note = if config.schedule_strict {
            "rejected (schedule_strict)"
        } else {
            "only the first entry is used"
        };
        println!("  duplicate time {}: {}", time, note);
    }

    let strict_dupes = config.schedule_strict && !report.duplicate_times.is_empty();
    if report.is_valid() && tz_ok && !strict_dupes {
        println!("Configuration is valid");
        Ok(ExitCode::SUCCESS)
    } else {
        let invalid = config.invalid_schedule_modes();
        if !invalid.is_empty() {
            println!("Invalid modes: {}", invalid.join(", "));
        }
        println!("Valid modes are: {}", Mode::canonical_names());
        Ok(ExitCode::from(EXIT_FAILED))
    }
}
