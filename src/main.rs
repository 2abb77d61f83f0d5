use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use homewatch::data::duration::{format_ago, parse_duration};
use homewatch::data::history::polyline;
use homewatch::data::EventLog;
use homewatch::store::{load_ledger, save_ledger};
use homewatch::{
    FileSampler, JsonFileStore, MetricKind, Monitor, PollOutcome, Poller, Sampler, Settings,
    SystemSampler,
};
use homewatch_adapters::docker::DockerCollector;
use homewatch_adapters::host::HostCollector;
use homewatch_adapters::website::WebsiteProbe;
use homewatch_types::current_timestamp_ms;

#[derive(Parser, Debug)]
#[command(name = "homewatch")]
#[command(about = "Service uptime, resource history and alerts for self-hosted machines")]
struct Args {
    /// Config file (TOML, JSON or YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read service state from a JSON file instead of the live system
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Polling interval (e.g., "10s", "1m"); overrides the config file
    #[arg(short, long)]
    interval: Option<String>,

    /// File the uptime ledger is persisted to; overrides the config file
    #[arg(short, long)]
    state: Option<PathBuf>,

    /// Sample once, export state to a JSON file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(ref interval) = args.interval {
        settings.poll_interval = parse_duration(interval)?;
    }
    if let Some(state) = args.state {
        settings.state_file = Some(state);
    }
    settings.validate()?;

    init_tracing(&settings.log_level);

    let sampler = build_sampler(args.file.as_deref(), &settings)?;
    let poller = Poller::new(sampler).with_timeout(settings.sample_timeout);

    let store = settings.state_file.as_ref().map(|path| JsonFileStore::open(path));
    let ledger = match &store {
        Some(store) => load_ledger(store, settings.retention, current_timestamp_ms()),
        None => EventLog::new(settings.retention),
    };
    let monitor = Monitor::new(&settings).with_ledger(ledger);

    if let Some(export_path) = args.export {
        return export_once(monitor, &poller, &settings, &export_path, store.as_ref()).await;
    }

    let handle = monitor.spawn(poller, settings.poll_interval);
    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("Shutting down");

    let shared = handle.shutdown().await;
    if let Some(store) = &store {
        save_ledger(store, shared.read().ledger(), current_timestamp_ms())?;
    }
    Ok(())
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// File sampler when `--file` is given, otherwise the live system.
fn build_sampler(file: Option<&Path>, settings: &Settings) -> Result<Arc<dyn Sampler>> {
    if let Some(path) = file {
        return Ok(Arc::new(FileSampler::new(path)));
    }

    let mut builder = SystemSampler::builder().host(
        HostCollector::new()
            .with_proc_root(&settings.host.proc_root)
            .with_mount(settings.host.mount.clone())
            .with_timeout(settings.sample_timeout),
    );
    if settings.docker.enabled {
        builder = builder.docker(
            DockerCollector::builder()
                .binary(settings.docker.binary.clone())
                .timeout(settings.sample_timeout)
                .build(),
        );
    }
    for site in &settings.websites {
        let probe = WebsiteProbe::builder()
            .name(site.name.clone())
            .url(site.url.clone())
            .timeout(settings.sample_timeout)
            .build()
            .with_context(|| format!("website {}", site.name))?;
        builder = builder.website(probe);
    }
    Ok(Arc::new(builder.build()))
}

/// Run one poll cycle and write the resulting state to a JSON file
async fn export_once(
    mut monitor: Monitor,
    poller: &Poller,
    settings: &Settings,
    export_path: &Path,
    store: Option<&JsonFileStore>,
) -> Result<()> {
    match poller.poll().await {
        PollOutcome::Sampled(sample) => {
            monitor.apply(sample);
        }
        PollOutcome::Failed(e) => {
            warn!("Exporting without fresh data: {}", e);
            monitor.record_failure(&e);
        }
        PollOutcome::Skipped => {}
    }

    let now = monitor.last_updated().unwrap_or_else(current_timestamp_ms);
    let overview = monitor.overview();

    let services: Vec<serde_json::Value> = monitor
        .services()
        .iter()
        .map(|s| {
            let uptime = monitor.uptime(&s.id, now);
            serde_json::json!({
                "id": s.id,
                "name": s.name,
                "status": s.status.label(),
                "cpuPercent": s.cpu_percent,
                "memPercent": s.mem_percent,
                "ports": s.ports,
                "uptime": uptime.percent,
                "uptimeLabel": uptime.percent_label(),
                "health": uptime.grade().symbol(),
                "lastUp": format_ago(uptime.last_up, now),
                "lastDown": format_ago(uptime.last_down, now),
            })
        })
        .collect();

    let mut history = serde_json::Map::new();
    for kind in MetricKind::ALL {
        let buffer = monitor.history().buffer(kind);
        history.insert(
            kind.label().to_string(),
            serde_json::json!({
                "capacity": buffer.capacity(),
                "values": buffer.iter().collect::<Vec<_>>(),
                "points": polyline(monitor.points(kind)),
            }),
        );
    }

    let export = serde_json::json!({
        "generatedAt": now,
        "source": poller.description(),
        "schedule": {
            "pollIntervalMs": settings.poll_interval.as_millis() as u64,
            "feedIntervalMs": settings.feed_interval.as_millis() as u64,
        },
        "overview": {
            "running": overview.running,
            "stopped": overview.stopped,
            "total": overview.total,
            "avgCpu": overview.avg_cpu_label(),
            "totalMemory": overview.total_memory_label(),
        },
        "system": monitor.system(),
        "services": services,
        "uptime": monitor.uptime_all(now),
        "history": history,
        "notifications": monitor.notifications(),
        "error": monitor.last_error(),
    });

    let json = serde_json::to_string_pretty(&export)?;
    std::fs::write(export_path, json)
        .with_context(|| format!("writing {}", export_path.display()))?;

    if let Some(store) = store {
        save_ledger(store, monitor.ledger(), now)?;
    }

    println!("Exported monitor state to: {}", export_path.display());
    Ok(())
}
