//! roast-control - live coffee roast console
//!
//! Runs one roast session against a reference curve and saves the batch.
//!
//! # Usage
//!
//! ```bash
//! # Interactive, real time, against the built-in simulated master
//! cargo run --release -- --label "Batch 12" --green-kg 12
//!
//! # Unattended replay at 60x: first crack at tick 540, ends at the tick cap
//! cargo run --release -- --speed 60 --first-crack-at 540 --ephemeral
//!
//! # Compare against a previously saved batch
//! cargo run --release -- --reference <batch-id>
//! ```
//!
//! # Environment Variables
//!
//! - `ROAST_CONFIG`: Path to a roast_config.toml
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use roast_control::config::{self, defaults, validation, RoastConfig};
use roast_control::operator::{self, OperatorCommand};
use roast_control::physics_engine::ThermalModel;
use roast_control::storage::{self, BatchSink, InMemoryStore, ReferenceProvider, SledStore};
use roast_control::session::FinishedBatch;
use roast_control::{Actuators, BatchMetadata, OperatorHandle, RoastController, SessionError};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "roast-control")]
#[command(about = "Live coffee roast control loop with reference-curve advisories")]
#[command(version)]
struct CliArgs {
    /// Path to a roast_config.toml (overrides ROAST_CONFIG and ./roast_config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reference trajectory id: a saved batch id, or the simulated master
    #[arg(long, default_value = storage::SIMULATED_MASTER_ID)]
    reference: String,

    /// Initial gas power (0-100)
    #[arg(
        long,
        default_value = "75",
        value_parser = clap::value_parser!(u8).range(0..=100)
    )]
    gas: u8,

    /// Initial airflow (0-100)
    #[arg(
        long,
        default_value = "50",
        value_parser = clap::value_parser!(u8).range(0..=100)
    )]
    airflow: u8,

    /// Speed multiplier (1 = realtime, 60 = 60x faster)
    #[arg(long, default_value = "1")]
    speed: u64,

    /// Unattended mode: mark first crack at this tick and read no stdin
    #[arg(long, value_name = "TICK")]
    first_crack_at: Option<u64>,

    /// Unattended mode: drop the batch at this tick instead of running to the cap
    #[arg(long, value_name = "TICK")]
    drop_at: Option<u64>,

    /// Directory of the sled store holding batches and reference curves
    #[arg(long, default_value = defaults::DATA_DIR)]
    data_dir: PathBuf,

    /// Keep everything in memory; nothing is written to disk
    #[arg(long)]
    ephemeral: bool,

    /// Batch label
    #[arg(long, default_value = "Untitled batch")]
    label: String,

    /// Green-coffee lot
    #[arg(long, default_value = "")]
    lot: String,

    /// Process type (washed, natural, honey, ...)
    #[arg(long, default_value = defaults::DEFAULT_PROCESS_TYPE)]
    process: String,

    /// Green weight charged (kg)
    #[arg(long, default_value = "0")]
    green_kg: f64,

    /// Owning tenant reference
    #[arg(long, env = "ROAST_TENANT", default_value = "")]
    tenant: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

impl CliArgs {
    fn metadata(&self) -> BatchMetadata {
        BatchMetadata {
            label: self.label.clone(),
            source_lot: self.lot.clone(),
            process_type: self.process.clone(),
            green_weight_kg: self.green_kg,
            tenant: self.tenant.clone(),
        }
    }

    fn unattended(&self) -> bool {
        self.first_crack_at.is_some() || self.drop_at.is_some()
    }
}

// ============================================================================
// Setup
// ============================================================================

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<RoastConfig> {
    let config = match path {
        Some(p) => RoastConfig::load_from_file(p)
            .with_context(|| format!("Failed to load config {}", p.display()))?,
        None => RoastConfig::load(),
    };
    for w in validation::plausibility_warnings(&config) {
        warn!("Config: {}", w);
    }
    Ok(config)
}

/// Open the store and (re)seed the simulated master.
fn open_store(
    args: &CliArgs,
    config: &RoastConfig,
) -> Result<(Arc<dyn ReferenceProvider>, Arc<dyn BatchSink>)> {
    let master = storage::configured_master(config);

    if args.ephemeral {
        info!("💾 Storage: in-memory (nothing will be saved to disk)");
        let store = Arc::new(InMemoryStore::new().with_reference(master));
        let references: Arc<dyn ReferenceProvider> = store.clone();
        let sink: Arc<dyn BatchSink> = store;
        return Ok((references, sink));
    }

    let store = Arc::new(
        SledStore::open(&args.data_dir)
            .with_context(|| format!("Failed to open store at {}", args.data_dir.display()))?,
    );
    // Rewritten on every start so it tracks the current [reference] config
    store.store_reference(&master)?;
    info!("Seeded simulated master reference ({})", master.label);
    info!(
        "💾 Storage: {} ({} saved batches, {} references)",
        args.data_dir.display(),
        store.batch_count(),
        store.list_references().len()
    );
    let references: Arc<dyn ReferenceProvider> = store.clone();
    let sink: Arc<dyn BatchSink> = store;
    Ok((references, sink))
}

// ============================================================================
// Operator Input
// ============================================================================

/// Read console lines on a plain thread; stdin reads cannot be cancelled.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(defaults::CHANNEL_CAPACITY);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn run_console(handle: OperatorHandle, mut lines: mpsc::Receiver<String>) {
    println!("{}", operator::HELP);
    while let Some(line) = lines.recv().await {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<OperatorCommand>() {
            Ok(c) => c,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        let outcome = match command {
            OperatorCommand::Gas(v) => {
                info!("🔥 Gas -> {}%", handle.set_gas(v));
                Ok(())
            }
            OperatorCommand::Airflow(v) => {
                info!("💨 Airflow -> {}%", handle.set_airflow(v));
                Ok(())
            }
            OperatorCommand::FirstCrack => handle.mark_first_crack().await,
            OperatorCommand::Drop => handle.drop_batch().await,
            OperatorCommand::Status => {
                println!("{}", operator::format_status(&handle.snapshot()));
                Ok(())
            }
            OperatorCommand::Help => {
                println!("{}", operator::HELP);
                Ok(())
            }
        };
        if let Err(e) = outcome {
            println!("{e}");
            break;
        }
    }
}

/// Unattended mode: fire First Crack and Drop at fixed ticks.
async fn run_script(
    handle: OperatorHandle,
    first_crack_at: Option<u64>,
    drop_at: Option<u64>,
    period: Duration,
) {
    let mut first_crack_pending = first_crack_at;
    let mut poll = tokio::time::interval(period / 2);
    loop {
        poll.tick().await;
        let tick = handle.snapshot().tick;
        if let Some(at) = first_crack_pending {
            if tick >= at {
                first_crack_pending = None;
                if handle.mark_first_crack().await.is_err() {
                    return;
                }
            }
        }
        if drop_at.is_some_and(|at| tick >= at) {
            let _ = handle.drop_batch().await;
            return;
        }
    }
}

/// Log each newly accepted recommendation.
async fn watch_recommendations(handle: OperatorHandle, period: Duration) {
    let mut last_tick = None;
    let mut poll = tokio::time::interval(period);
    loop {
        poll.tick().await;
        let snapshot = handle.snapshot();
        if let Some(rec) = &snapshot.recommendation {
            if last_tick != Some(rec.tick) {
                last_tick = Some(rec.tick);
                info!(
                    tick = rec.tick,
                    delta = format!("{:+.1}", rec.temp_delta),
                    "💡 {} ({}) {}",
                    rec.action,
                    rec.intensity,
                    rec.message
                );
            }
        }
    }
}

// ============================================================================
// Finalization
// ============================================================================

/// Retry a failed save a few times before giving up.
async fn retry_unsaved(controller: &mut RoastController) -> Result<()> {
    let mut delay = Duration::from_secs(1);
    for attempt in 1..=3 {
        tokio::time::sleep(delay).await;
        match controller.retry_finalize().await {
            Ok(receipts) => {
                for r in receipts {
                    info!(batch_id = %r.batch_id, attempt, "✓ Batch saved on retry");
                }
                return Ok(());
            }
            Err(e) => {
                warn!(attempt, "Retry failed: {}", e);
                delay *= 2;
            }
        }
    }
    Err(anyhow::anyhow!(
        "{} batch(es) remain unsaved",
        controller.unsaved().len()
    ))
}

fn log_summary(finished: &FinishedBatch) {
    let s = &finished.summary;
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("☕ BATCH SUMMARY: {}", s.metadata.label);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("   Batch ID:         {}", finished.receipt.batch_id);
    info!("   Ended by:         {}", s.end_reason);
    info!("   Total ticks:      {}", s.total_ticks);
    info!("   Final temp:       {:.1} C", s.final_temp);
    info!("   Development:      {:.1}%", s.development_ratio);
    info!("   Mass loss:        {:.1}%", s.mass_loss_estimate * 100.0);
    if s.metadata.green_weight_kg > 0.0 {
        info!(
            "   Weight:           {:.2} kg -> {:.2} kg",
            s.metadata.green_weight_kg,
            s.roasted_weight_kg()
        );
    }
    for m in &s.milestones {
        info!(
            "   {:<17} tick {:>3} @ {:.1} C",
            format!("{}:", m.kind),
            m.tick,
            m.temp
        );
    }
    info!(
        "   Advisories:       {} requested, {} applied, {} discarded, {} failed",
        finished.stats.advisories_requested,
        finished.stats.advisories_applied,
        finished.stats.advisories_discarded,
        finished.stats.advisories_failed
    );
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_json);

    config::init(load_config(args.config.as_ref())?);
    let config = config::get().clone();

    let period_ms = if args.speed == 0 {
        1
    } else {
        (config.session.tick_period_ms / args.speed).max(1)
    };
    let period = Duration::from_millis(period_ms);

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Roast Control");
    info!(
        "  Tick {} ms | cap {} ticks | advisory every {} ticks",
        period_ms, config.session.max_ticks, config.advisory.sync_interval_ticks
    );
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let initial = Actuators::new(args.gas, args.airflow);
    info!(
        "🌡️  {} settles at {:.1} C",
        initial,
        ThermalModel::new(config.thermal.clone()).equilibrium(initial)
    );

    let (references, sink) = open_store(&args, &config)?;
    let mut controller = RoastController::new(config, references, sink).with_tick_period(period);
    controller.set_gas(initial.gas_power);
    controller.set_airflow(initial.airflow);

    let session_id = controller
        .start(&args.reference, args.metadata())
        .await
        .with_context(|| format!("Failed to start session against '{}'", args.reference))?;
    let handle = controller
        .operator()
        .context("Session started without an operator handle")?;
    info!("🚀 Charge: session {}", session_id);

    // Ctrl+C drops the batch rather than discarding it
    let signal_handle = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("🛑 Received Ctrl+C, dropping batch...");
            signal_handle.abort();
        }
    });

    let watcher = tokio::spawn(watch_recommendations(handle.clone(), period));
    let input = if args.unattended() {
        tokio::spawn(run_script(handle, args.first_crack_at, args.drop_at, period))
    } else {
        tokio::spawn(run_console(handle, spawn_stdin_reader()))
    };

    let result = controller.wait_finished().await;
    input.abort();
    watcher.abort();

    match result {
        Ok(finished) => log_summary(&finished),
        Err(SessionError::Persistence(e)) => {
            error!("Batch not saved: {}", e);
            retry_unsaved(&mut controller).await?;
        }
        Err(e) => return Err(e).context("Session failed"),
    }

    info!("✓ Roast Control shutdown complete");
    Ok(())
}
