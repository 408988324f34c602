use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use crate::aggregate::PoolSummary;
use crate::driver::PoolRunReport;
use crate::orchestrator::{BenchmarkReport, PoolOutcome, PoolResult};

/// `MM:SS` below an hour, `HH:MM:SS` above.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// Renders the human-readable run log.
pub struct SummaryWriter<W: Write> {
    writer: W,
}

impl<W: Write> SummaryWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_counts(&mut self, pool_name: &str, summary: &PoolSummary) -> io::Result<()> {
        writeln!(self.writer, "Matchmaking Monitor for [{pool_name}] Done!")?;
        writeln!(
            self.writer,
            "Complete Tickets: {}, Average Time: {:.2} seconds",
            summary.completed, summary.completed_avg_secs
        )?;
        writeln!(
            self.writer,
            "Failed Tickets: {}, Average Time: {:.2} seconds",
            summary.failed, summary.failed_avg_secs
        )?;
        if let Some(percentiles) = &summary.percentiles {
            writeln!(
                self.writer,
                "Completed Time p50: {:.2} s, p95: {:.2} s, max: {:.2} s",
                percentiles.p50_secs, percentiles.p95_secs, percentiles.max_secs
            )?;
        }
        if summary.unresolved > 0 {
            writeln!(self.writer, "Unresolved Tickets: {}", summary.unresolved)?;
        }
        Ok(())
    }

    pub fn write_pool_report(&mut self, report: &PoolRunReport) -> io::Result<()> {
        self.write_counts(&report.pool_name, &report.summary)?;
        writeln!(
            self.writer,
            "Players: {}, Batches: {}, Submitted Tickets: {}",
            report.total_players, report.batches, report.submitted
        )?;
        writeln!(
            self.writer,
            "Total Time: {}, Average Time per Batch: {:.2} seconds",
            format_elapsed(report.elapsed),
            report.average_batch_secs()
        )?;
        if let Some(error) = &report.submission_error {
            writeln!(self.writer, "Submission stopped early: {error}")?;
        }
        if let Some(error) = &report.monitor_error {
            writeln!(self.writer, "Monitor error: {error}")?;
        }
        writeln!(self.writer)?;
        self.writer.flush()
    }

    pub fn write_crashed_pool(&mut self, pool_name: &str, error: &str) -> io::Result<()> {
        writeln!(self.writer, "Matchmaking Monitor for [{pool_name}] Failed: {error}")?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    pub fn write_run_footer(&mut self, run_id: u64, elapsed: Duration) -> io::Result<()> {
        writeln!(
            self.writer,
            "Benchmark {run_id} Total Run Time: {}",
            format_elapsed(elapsed)
        )?;
        self.writer.flush()
    }

    pub fn write_result_summary(&mut self, run_id: u64, result: &PoolResult) -> io::Result<()> {
        writeln!(self.writer, "Results of benchmark {run_id}")?;
        self.write_counts(&result.pool_name, &result.summary)?;
        writeln!(self.writer)?;
        self.writer.flush()
    }
}

fn open_log(path: &str) -> io::Result<fs::File> {
    let log_path = Path::new(path);
    if let Some(parent) = log_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(log_path)
}

/// Appends each pool's block to the log file that pool names, followed by
/// the run footer. Pools sharing a file get their blocks in pool order.
pub fn write_benchmark_report(report: &BenchmarkReport, default_logs: &str) -> io::Result<()> {
    let mut by_file: BTreeMap<&str, Vec<&PoolOutcome>> = BTreeMap::new();
    for outcome in &report.pools {
        let logs = match outcome {
            PoolOutcome::Finished(pool) => pool.logs.as_str(),
            PoolOutcome::Crashed { .. } => default_logs,
        };
        by_file.entry(logs).or_default().push(outcome);
    }

    for (logs, outcomes) in by_file {
        let mut writer = SummaryWriter::new(open_log(logs)?);
        for outcome in outcomes {
            match outcome {
                PoolOutcome::Finished(pool) => writer.write_pool_report(pool)?,
                PoolOutcome::Crashed { pool_name, error } => {
                    writer.write_crashed_pool(pool_name, error)?
                }
            }
        }
        writer.write_run_footer(report.run_id, report.elapsed)?;
    }
    Ok(())
}

pub fn write_result_report(run_id: u64, results: &[PoolResult]) -> io::Result<()> {
    for result in results {
        SummaryWriter::new(open_log(&result.logs)?).write_result_summary(run_id, result)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use super::{format_elapsed, write_benchmark_report, SummaryWriter};
    use crate::aggregate::PoolSummary;
    use crate::driver::PoolRunReport;
    use crate::metrics::ElapsedPercentiles;
    use crate::orchestrator::{BenchmarkReport, PoolOutcome};

    fn report(pool_name: &str, logs: &str) -> PoolRunReport {
        PoolRunReport {
            pool_name: pool_name.to_string(),
            logs: logs.to_string(),
            total_players: 10,
            batches: 3,
            submitted: 3,
            submission_error: None,
            monitor_error: None,
            summary: PoolSummary {
                completed: 3,
                completed_avg_secs: 4.5,
                failed: 0,
                failed_avg_secs: 0.0,
                percentiles: Some(ElapsedPercentiles {
                    count: 3,
                    p50_secs: 4.0,
                    p95_secs: 6.0,
                    max_secs: 6.0,
                }),
                unresolved: 0,
            },
            elapsed: Duration::from_secs(12),
        }
    }

    #[test]
    fn elapsed_time_formats() {
        assert_eq!(format_elapsed(Duration::from_secs(75)), "01:15");
        assert_eq!(format_elapsed(Duration::from_secs(3_725)), "01:02:05");
    }

    #[test]
    fn pool_block_lists_counts_and_averages() {
        let mut writer = SummaryWriter::new(Vec::new());

        writer.write_pool_report(&report("Classic1", "benchmark.log")).unwrap();

        let text = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Matchmaking Monitor for [Classic1] Done!");
        assert_eq!(lines[1], "Complete Tickets: 3, Average Time: 4.50 seconds");
        assert_eq!(lines[2], "Failed Tickets: 0, Average Time: 0.00 seconds");
        assert_eq!(lines[3], "Completed Time p50: 4.00 s, p95: 6.00 s, max: 6.00 s");
        assert_eq!(lines[5], "Total Time: 00:12, Average Time per Batch: 4.00 seconds");
    }

    #[test]
    fn benchmark_report_appends_to_each_pool_log() {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let root = std::env::temp_dir().join(format!("summary-report-{unique}"));
        let classic = root.join("nested").join("classic.log");
        let survival = root.join("survival.log");
        let benchmark = BenchmarkReport {
            run_id: 4,
            pools: vec![
                PoolOutcome::Finished(report("Classic1", classic.to_str().unwrap())),
                PoolOutcome::Finished(report("Survival1", survival.to_str().unwrap())),
                PoolOutcome::Crashed {
                    pool_name: "Practice1".to_string(),
                    error: "task panicked".to_string(),
                },
            ],
            elapsed: Duration::from_secs(30),
        };

        write_benchmark_report(&benchmark, classic.to_str().unwrap()).unwrap();

        let classic_text = fs::read_to_string(&classic).unwrap();
        assert!(classic_text.contains("[Classic1] Done!"));
        assert!(classic_text.contains("[Practice1] Failed: task panicked"));
        assert!(!classic_text.contains("Survival1"));
        assert!(classic_text.ends_with("Benchmark 4 Total Run Time: 00:30\n"));
        assert!(fs::read_to_string(&survival).unwrap().contains("[Survival1] Done!"));

        fs::remove_dir_all(&root).unwrap();
    }
}
