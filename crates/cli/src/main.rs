//! driftwatch: fraud pipeline drift monitor.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dw_core::alert::SmtpAlertDispatcher;
use dw_core::config::load_config;
use dw_core::cycle::CycleController;
use dw_core::pipeline::CyclePlan;
use dw_core::scheduler::CycleScheduler;

/// Periodically runs the fraud pipeline, watches the flagged-transaction
/// ratio, and alerts plus retrains when it drifts past the threshold.
#[derive(Parser)]
#[command(name = "driftwatch", version, about)]
struct Cli {
    /// Monitor root directory (pipeline modules, artifacts, logs).
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Run a single cycle and exit instead of looping.
    #[arg(long)]
    once: bool,

    /// Override the cycle interval in seconds.
    #[arg(long)]
    interval: Option<u64>,

    /// Override the drift threshold ratio.
    #[arg(long)]
    threshold: Option<f64>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = load_config(&cli.root)?;
    if let Some(secs) = cli.interval {
        config.interval_secs = secs;
    }
    if let Some(threshold) = cli.threshold {
        config.threshold = threshold;
    }
    config.validate()?;

    let interval = config.interval();
    let alerter = Arc::new(SmtpAlertDispatcher::new(config.mail.clone()));
    let mut controller = CycleController::new(config, CyclePlan::standard(), alerter);

    if cli.once {
        let outcome = controller.run_cycle().await;
        controller.shutdown().await;
        return Ok(if outcome.succeeded {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let scheduler = CycleScheduler::new(interval);
    tokio::select! {
        _ = scheduler.run(&mut controller) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received; shutting down");
        }
    }
    controller.shutdown().await;
    Ok(ExitCode::SUCCESS)
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("driftwatch=debug,dw_core=debug")
    } else {
        EnvFilter::new("driftwatch=info,dw_core=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
