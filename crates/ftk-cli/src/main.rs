use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ftk_engine::JitterPacer;
use ftk_enrich::HttpEnrichmentProvider;
use ftk_roster::SheetRosterProvider;
use ftk_runtime::{SyncConfig, SyncOrchestrator, SyncReport};
use ftk_schemas::{SyncMode, TelemetryField};
use ftk_store::{SnapshotStore, STAMP_FORMAT};
use ftk_telemetry::AisTelemetryProvider;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ftk")]
#[command(about = "Fleet tracker synchronization CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one synchronization cycle (or loop with --every)
    Sync {
        /// Sync mode (full | incremental)
        #[arg(long, default_value = "incremental")]
        mode: String,

        /// Path to a JSON config file; defaults apply for missing sections
        #[arg(long)]
        config: Option<PathBuf>,

        /// Roster CSV endpoint, overriding the config file
        #[arg(long)]
        roster_url: Option<String>,

        /// Snapshot directory
        #[arg(long, default_value = "./snapshots")]
        data_dir: PathBuf,

        /// Repeat forever, sleeping this many seconds between cycles
        #[arg(long)]
        every: Option<u64>,
    },

    /// Snapshot store utilities
    Snapshots {
        #[command(subcommand)]
        cmd: SnapshotsCmd,

        /// Snapshot directory
        #[arg(long, default_value = "./snapshots")]
        data_dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum SnapshotsCmd {
    /// List every persisted snapshot timestamp, oldest first
    List,

    /// Print the newest snapshot's timestamp and contents summary
    Latest,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Sync {
            mode,
            config,
            roster_url,
            data_dir,
            every,
        } => {
            let mode = SyncMode::parse(&mode).map_err(anyhow::Error::new)?;

            let mut cfg = load_config(config.as_deref())?;
            if let Some(url) = roster_url {
                cfg.roster_url = url;
            }
            if cfg.roster_url.is_empty() {
                anyhow::bail!("no roster endpoint configured (set roster_url or --roster-url)");
            }

            let orchestrator = build_orchestrator(&cfg, &data_dir)?;

            match every {
                None => {
                    let report = orchestrator.run(mode).await?;
                    print_report(&report);
                }
                Some(secs) => loop {
                    match orchestrator.run(mode).await {
                        Ok(report) => print_report(&report),
                        Err(e) => tracing::error!(error = %e, "synchronization run failed"),
                    }
                    tokio::time::sleep(Duration::from_secs(secs)).await;
                },
            }
        }

        Commands::Snapshots { cmd, data_dir } => {
            let store = SnapshotStore::open(&data_dir, ftk_store::DEFAULT_RETENTION)?;
            match cmd {
                SnapshotsCmd::List => {
                    for stamp in store.list()? {
                        println!("{}", stamp.format(STAMP_FORMAT));
                    }
                }
                SnapshotsCmd::Latest => match store.latest()? {
                    None => println!("snapshots=0"),
                    Some(stamp) => {
                        let table = store.load(stamp)?;
                        println!("stamp={}", stamp.format(STAMP_FORMAT));
                        println!("vessels={}", table.len());
                        for vessel in table.iter() {
                            println!(
                                "mmsi={} name={} flag={}",
                                vessel.identity.mmsi,
                                vessel.identity.name,
                                vessel.telemetry.flag.as_deref().unwrap_or("")
                            );
                        }
                    }
                },
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SyncConfig> {
    let Some(path) = path else {
        return Ok(SyncConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read config failed: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid config: {}", path.display()))
}

fn build_orchestrator(cfg: &SyncConfig, data_dir: &Path) -> Result<SyncOrchestrator> {
    let store = SnapshotStore::open(data_dir, cfg.retention)?;
    let roster = SheetRosterProvider::new(cfg.roster_url.clone());
    let telemetry = AisTelemetryProvider::new(cfg.telemetry.clone())?;
    let enrich = HttpEnrichmentProvider::new(cfg.enrich.clone());
    let pacer = JitterPacer::new(cfg.pace.clone());

    Ok(SyncOrchestrator::new(
        store,
        Box::new(roster),
        Box::new(telemetry),
        Box::new(enrich),
        Box::new(pacer),
        cfg,
    ))
}

fn print_report(report: &SyncReport) {
    println!("mode_requested={}", report.mode_requested.as_str());
    println!("mode_effective={}", report.mode_effective.as_str());
    println!("stamp={}", report.stamp.format(STAMP_FORMAT));
    println!(
        "roster_total={} identified={} unidentified={}",
        report.roster_total, report.roster_identified, report.roster_unidentified
    );
    println!(
        "vessels={} dropped={}",
        report.vessels, report.counters.dropped
    );
    for field in TelemetryField::ALL {
        let refreshed = report.counters.refreshed_count(field);
        let inherited = report.counters.inherited_count(field);
        if refreshed > 0 || inherited > 0 {
            println!(
                "field={} refreshed={} inherited={}",
                field.name(),
                refreshed,
                inherited
            );
        }
    }
    println!(
        "pages_reused={} found={} absent={}",
        report.counters.page_reused, report.counters.page_found, report.counters.page_absent
    );
    println!(
        "images_from_page={} fallback={} default={}",
        report.counters.image_from_page,
        report.counters.image_fallback,
        report.counters.image_default
    );
}
