mod benchmark_file;
mod config;
mod wiring;

use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;

use rand::{rngs::StdRng, SeedableRng};
use runtime::event_log::JsonlEventLog;
use runtime::events::records_from_notification;
use runtime::orchestrator::BenchmarkOrchestrator;
use runtime::report::{write_benchmark_report, write_result_report, SummaryWriter};
use runtime::run_id::RunIdStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, RunMode};

const FALLBACK_LOGS: &str = "benchmark.log";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(mode = config.mode.as_str(), service = config.service.as_str(), "bench-runner starting");

    match config.mode {
        RunMode::Benchmark => run_benchmark(&config).await,
        RunMode::Sample => run_sample(&config),
        RunMode::Result => run_result(&config).await,
        RunMode::Ingest => run_ingest(&config).await,
    }
}

async fn run_benchmark(config: &Config) -> Result<(), Box<dyn Error>> {
    let pools = benchmark_file::load_pools(&config.config_path)?;
    let run = RunIdStore::new(config.run_id_path.as_str()).next_run()?;
    let wiring = wiring::build(config)?;
    info!(run_id = run.id, pools = pools.len(), "benchmark run starting");

    let orchestrator = BenchmarkOrchestrator::new(pools, Arc::clone(&wiring.service))
        .with_event_log(Arc::clone(&wiring.event_log));
    let report = orchestrator.run(run.id).await;
    write_benchmark_report(&report, FALLBACK_LOGS)?;

    let persisted = wiring.persist_simulated_events().await?;
    if persisted > 0 {
        info!(
            records = persisted,
            path = config.event_log_path.as_str(),
            "simulated events persisted"
        );
    }
    Ok(())
}

fn run_sample(config: &Config) -> Result<(), Box<dyn Error>> {
    let pools = benchmark_file::load_pools(&config.config_path)?;
    let wiring = wiring::build(config)?;
    let orchestrator = BenchmarkOrchestrator::new(pools, wiring.service);
    let mut rng = StdRng::from_entropy();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for sampled in orchestrator.sample(config.sample_size, &mut rng) {
        writeln!(out, "{}", serde_json::to_string(&sampled)?)?;
    }
    Ok(())
}

async fn run_result(config: &Config) -> Result<(), Box<dyn Error>> {
    let pools = benchmark_file::load_pools(&config.config_path)?;
    let Some(run_id) = RunIdStore::new(config.run_id_path.as_str()).last_run()? else {
        return Err("no benchmark run has been recorded yet".into());
    };
    let wiring = wiring::build(config)?;
    let log = JsonlEventLog::new(config.event_log_path.as_str());

    let orchestrator = BenchmarkOrchestrator::new(pools, wiring.service);
    let results = orchestrator.collect_results(&log, run_id).await?;

    let mut writer = SummaryWriter::new(io::stdout().lock());
    for result in &results {
        writer.write_result_summary(run_id, result)?;
    }
    write_result_report(run_id, &results)?;
    Ok(())
}

async fn run_ingest(config: &Config) -> Result<(), Box<dyn Error>> {
    let log = JsonlEventLog::new(config.event_log_path.as_str());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut appended = 0;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match records_from_notification(&line) {
            Ok(records) => {
                log.append(&records).await?;
                appended += records.len();
            }
            Err(err) => warn!(error = %err, "skipping notification"),
        }
    }
    info!(appended, path = config.event_log_path.as_str(), "notifications ingested");
    Ok(())
}
