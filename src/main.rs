use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use routeatlas::config::DashboardConfig;
use routeatlas::dashboard::{Dashboard, PointerEvent};
use routeatlas::drag::{PointerPosition, SurfaceRect};
use routeatlas::metrics::DashboardMetrics;
use routeatlas::model::{EntityKind, Point};
use routeatlas::reconcile::{CycleReport, Origin};
use routeatlas::routes::RouteSet;

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    #[clap(short, long, global = true, default_value = "route-atlas.yaml")]
    config: PathBuf,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Run one reconciliation cycle and print the effective layout
    Sync,
    /// Keep refreshing on the configured interval until Ctrl-C
    Watch,
    /// Drag one entity to a model position and commit it
    Move {
        #[clap(long, value_enum)]
        kind: KindArg,
        #[clap(long)]
        id: String,
        #[clap(long, allow_hyphen_values = true)]
        x: f64,
        #[clap(long, allow_hyphen_values = true)]
        y: f64,
    },
    /// Drop persisted positions and reload authoritative data
    Reset,
    /// Run one cycle and print dashboard metrics as JSON
    Metrics,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Cd,
    Delivery,
}

impl From<KindArg> for EntityKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Cd => EntityKind::DistributionCenter,
            KindArg::Delivery => EntityKind::DeliveryPoint,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    if let Commands::Init = args.command {
        let serialized = serde_yaml::to_string(&DashboardConfig::default())?;
        fs::write(&args.config, serialized)
            .with_context(|| format!("writing {}", args.config.display()))?;
        info!("Wrote default config to {}", args.config.display());
        return Ok(());
    }

    let config = DashboardConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let mut dashboard = Dashboard::from_config(&config)?;

    match args.command {
        Commands::Init => {}
        Commands::Sync => {
            let report = initial_load(&mut dashboard).await?;
            print_layout(&dashboard, &report);
        }
        Commands::Watch => {
            info!(
                "Refreshing every {} ms, press Ctrl-C to stop",
                config.refresh_interval_ms
            );
            // No interactive surface here; the sender only keeps the channel open
            let (_events, rx) = tokio::sync::mpsc::channel::<PointerEvent>(64);
            dashboard
                .run(rx, async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await?;
        }
        Commands::Move { kind, id, x, y } => {
            initial_load(&mut dashboard).await?;
            move_entity(&mut dashboard, kind.into(), &id, Point::new(x, y))?;
        }
        Commands::Reset => {
            match dashboard.reset_positions().await? {
                Some(report)
                    if report.cds == Origin::Authoritative
                        && report.delivery_points == Origin::Authoritative =>
                {
                    info!("Positions reset")
                }
                _ => warn!("Overrides cleared but authoritative positions were not installed"),
            }
        }
        Commands::Metrics => {
            initial_load(&mut dashboard).await?;
            let metrics = DashboardMetrics::compute(dashboard.store());
            println!("{}", serde_json::to_string_pretty(&metrics)?);
        }
    }

    Ok(())
}

async fn initial_load(dashboard: &mut Dashboard) -> Result<CycleReport> {
    match dashboard.refresh().await? {
        Some(report) => Ok(report),
        None => bail!("initial load did not install any data"),
    }
}

/// Replays a drag on an unscaled surface: press on the entity, move by the
/// requested delta, release.
fn move_entity(dashboard: &mut Dashboard, kind: EntityKind, id: &str, target: Point) -> Result<()> {
    let Some(start) = dashboard.store().location_of(kind, id) else {
        bail!("no {} with id '{}'", kind, id);
    };
    let surface = SurfaceRect::unscaled(dashboard.drag().bounds());

    dashboard.handle_pointer(PointerEvent::Down {
        kind,
        id: id.to_string(),
        pointer: PointerPosition::new(start.x, start.y),
        surface,
    });
    dashboard.handle_pointer(PointerEvent::Move {
        pointer: PointerPosition::new(target.x, target.y),
        surface,
    });

    match dashboard.handle_pointer(PointerEvent::Up) {
        Some(outcome) if outcome.saved => {
            if let Some(position) = outcome.position {
                println!("{} {} moved to {}", kind, id, position);
            }
            Ok(())
        }
        Some(_) => {
            warn!("Move applied in memory but could not be saved");
            Ok(())
        }
        None => bail!("drag on {} '{}' did not start", kind, id),
    }
}

fn print_layout(dashboard: &Dashboard, report: &CycleReport) {
    let store = dashboard.store();
    println!(
        "cds: {:?}, delivery points: {:?}, write-backs: {}",
        report.cds, report.delivery_points, report.write_backs
    );
    let routes = RouteSet::build(store);
    for cd in store.cds() {
        println!(
            "  cd {:<8} {:<24} {} ({} deliveries)",
            cd.id,
            cd.name,
            cd.location,
            routes.routes_from(&cd.id).count()
        );
    }
    for point in store.delivery_points() {
        println!(
            "  dp {:<8} {:<24} {} -> {}",
            point.id, point.name, point.location, point.assigned_cd
        );
    }
    if !routes.dangling_assignments.is_empty() {
        warn!(
            "Delivery points without a known CD: {}",
            routes.dangling_assignments.join(", ")
        );
    }
    if let Some(warning) = store.storage_warning() {
        warn!("{}", warning);
    }
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("reqwest=off,hyper=off,{}", log_level)))
        .without_time()
        .init();
}
