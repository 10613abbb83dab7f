//! MMouse - Main Entry Point
//!
//! `run` replays a recorded pointer session through the full pipeline,
//! `replay-features` drives the trust engine from pre-extracted vectors,
//! `status` and `export` inspect a user's stored data.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tokio::sync::watch;

use mmouse_core::constants::{APP_NAME, APP_VERSION};
use mmouse_core::logic::capture::{control_channel, load_recording, ReplayListener};
use mmouse_core::logic::dataset::export_jsonl;
use mmouse_core::logic::features::load_feature_csv;
use mmouse_core::logic::lock::{CommandLocker, NoopLocker, ScreenLocker};
use mmouse_core::{replay_vectors, AuthSession, EngineConfig, SessionOutcome, TrustEngine};

#[derive(Parser, Debug)]
#[command(name = "mmouse", version, about = "Continuous authentication from pointer movement")]
struct Cli {
    /// JSON config file (defaults to $MMOUSE_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for models and the training database
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Stored vectors required before the first fit
    #[arg(long, global = true)]
    min_train_size: Option<u64>,

    /// Trust value at or below which the session is blocked
    #[arg(long, global = true)]
    lockout: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a JSONL pointer recording through a full session
    Run(RunArgs),
    /// Feed pre-extracted feature vectors (CSV) to the trust engine
    ReplayFeatures(ReplayArgs),
    /// Show training progress and model details
    Status {
        #[arg(long)]
        user: String,
    },
    /// Export a user's training vectors as JSON lines
    Export {
        #[arg(long)]
        user: String,
        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    #[arg(long)]
    user: String,
    /// Recorded events, one RawEvent JSON object per line
    #[arg(long)]
    events: PathBuf,
    /// Honour the recorded timing between events
    #[arg(long)]
    realtime: bool,
    /// Log instead of locking the screen on block
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args, Debug)]
struct ReplayArgs {
    #[arg(long)]
    user: String,
    /// Legitimate user's vectors
    #[arg(long)]
    features: PathBuf,
    /// Another user's vectors, fed after `switch_after` rows
    #[arg(long, requires = "switch_after")]
    intruder: Option<PathBuf>,
    #[arg(long)]
    switch_after: Option<usize>,
    #[arg(long)]
    dry_run: bool,
}

fn build_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let mut config = EngineConfig::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(n) = cli.min_train_size {
        config.min_train_size = n;
    }
    if let Some(lockout) = cli.lockout {
        config.trust.lockout_threshold = lockout;
    }
    config.validate()?;
    Ok(config)
}

fn locker(config: &EngineConfig, dry_run: bool) -> anyhow::Result<Box<dyn ScreenLocker>> {
    if dry_run {
        return Ok(Box::new(NoopLocker::new()));
    }
    let locker = CommandLocker::from_config(config.lock_command.as_deref())
        .context("no usable screen lock command")?;
    Ok(Box::new(locker))
}

/// Flips to `true` on Ctrl-C
fn shutdown_on_ctrl_c(what: &'static str) -> watch::Receiver<bool> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Interrupted, stopping {}", what);
            let _ = shutdown_tx.send(true);
        }
    });
    shutdown_rx
}

async fn run_session(engine: &TrustEngine, args: RunArgs) -> anyhow::Result<()> {
    let locker = locker(engine.config(), args.dry_run)?;
    let recording = load_recording(&args.events)
        .with_context(|| format!("reading {}", args.events.display()))?;
    if recording.events.is_empty() {
        bail!("{} holds no usable events", args.events.display());
    }

    let (control_tx, control_rx) = control_channel();
    let (events, feeder) = ReplayListener::new(recording.events)
        .realtime(args.realtime)
        .spawn(control_rx);

    let shutdown_rx = shutdown_on_ctrl_c("session");
    let mut session = AuthSession::new(engine, &args.user)?;
    let outcome = session.run(events, control_tx, shutdown_rx).await?;
    feeder.abort();

    if let SessionOutcome::Blocked { .. } = outcome {
        locker.lock()?;
    }

    println!(
        "{}",
        serde_json::json!({
            "session": session.id(),
            "user": args.user,
            "result": outcome,
            "stats": session.stats(),
            "rejected_lines": recording.rejected,
        })
    );
    Ok(())
}

async fn replay_features(engine: &TrustEngine, args: ReplayArgs) -> anyhow::Result<()> {
    let locker = locker(engine.config(), args.dry_run)?;
    let mut vectors = load_feature_csv(&args.features)?;

    if let (Some(path), Some(after)) = (&args.intruder, args.switch_after) {
        let intruder = load_feature_csv(path)?;
        vectors.truncate(after);
        log::info!(
            "Feeding {} vectors of {} then {} intruder vectors",
            vectors.len(),
            args.user,
            intruder.len()
        );
        vectors.extend(intruder);
    }

    let shutdown_rx = shutdown_on_ctrl_c("replay");
    let summary = replay_vectors(engine, &args.user, &vectors, &shutdown_rx).await?;
    if let SessionOutcome::Blocked { .. } = summary.outcome {
        locker.lock()?;
    }

    println!(
        "{}",
        serde_json::json!({
            "user": args.user,
            "result": summary.outcome,
            "evaluated": summary.evaluated,
            "total": vectors.len(),
            "last_verdict": summary.last_verdict,
        })
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;
    log::info!("Starting {} v{}", APP_NAME, APP_VERSION);

    let engine = TrustEngine::open(config)?;

    match cli.command {
        Command::Run(args) => run_session(&engine, args).await?,
        Command::ReplayFeatures(args) => replay_features(&engine, args).await?,
        Command::Status { user } => {
            let status = engine.status(&user)?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::Export { user, output } => {
            let written = export_jsonl(engine.training_store(), &user, &output)?;
            println!("Exported {} vectors to {}", written, output.display());
        }
    }

    Ok(())
}
