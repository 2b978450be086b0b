//! Run counters and the end-of-run statistics report.

use serde::{Serialize, Serializer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Separator framing the elapsed-time report.
pub const SEPARATOR: &str = "========================================";

fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Counters updated while the event loop runs.
#[derive(Debug, Default)]
pub struct Metrics {
    /// Events that went through every stage
    pub events_processed: AtomicU64,

    /// Events dropped by a stage returning `SkipEvent`
    pub events_skipped: AtomicU64,

    /// Events on which a stage returned an error
    pub events_failed: AtomicU64,

    /// Stage finalize failures
    pub finalize_failures: AtomicU64,
}

impl Metrics {
    /// Create new metrics.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Record a fully processed event.
    pub fn add_event_processed(&self) {
        self.events_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a skipped event.
    pub fn add_event_skipped(&self) {
        self.events_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed event.
    pub fn add_event_failed(&self) {
        self.events_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a stage that failed to finalize.
    pub fn add_finalize_failure(&self) {
        self.finalize_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Events visited so far, whatever their outcome.
    pub fn events_visited(&self) -> u64 {
        self.events_processed.load(Ordering::Relaxed)
            + self.events_skipped.load(Ordering::Relaxed)
            + self.events_failed.load(Ordering::Relaxed)
    }

    /// Build the run statistics from the current counters.
    pub fn snapshot(&self, elapsed: Duration, stage_times: Vec<StageTime>) -> RunStatistics {
        let events_processed = self.events_processed.load(Ordering::Relaxed);
        let events_visited = self.events_visited();
        let secs = elapsed.as_secs_f64();

        RunStatistics {
            events_processed,
            events_skipped: self.events_skipped.load(Ordering::Relaxed),
            events_failed: self.events_failed.load(Ordering::Relaxed),
            finalize_failures: self.finalize_failures.load(Ordering::Relaxed),
            elapsed,
            events_per_second: if secs > 0.0 {
                events_visited as f64 / secs
            } else {
                0.0
            },
            stage_times,
        }
    }
}

/// Cumulative `process` time of one stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageTime {
    pub stage: String,
    pub secs: f64,
}

/// Statistics of one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStatistics {
    pub events_processed: u64,
    pub events_skipped: u64,
    pub events_failed: u64,
    pub finalize_failures: u64,
    /// Wall-clock time of the event loop
    #[serde(serialize_with = "serialize_duration")]
    pub elapsed: Duration,
    pub events_per_second: f64,
    /// Per-stage processing time, in pipeline order
    pub stage_times: Vec<StageTime>,
}

impl RunStatistics {
    /// Events visited, whatever their outcome.
    pub fn events_visited(&self) -> u64 {
        self.events_processed + self.events_skipped + self.events_failed
    }

    /// Elapsed wall-clock seconds.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Save statistics to a JSON file.
    pub fn save_to_file(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!("Metrics saved to {}", path);
        Ok(())
    }

    /// Print the elapsed-time report framed by separator lines.
    pub fn print_timing(&self) {
        println!("{}", SEPARATOR);
        println!("{} seconds", self.elapsed_secs());
        println!("{}", SEPARATOR);
    }

    /// Print a breakdown of counters and stage timing.
    pub fn print_summary(&self) {
        println!("\n=== Run Summary ===");
        println!("Events processed: {}", self.events_processed);
        println!("Events skipped: {}", self.events_skipped);
        println!("Events failed: {}", self.events_failed);
        println!("Processing rate: {:.1} events/s", self.events_per_second);

        let total: f64 = self.stage_times.iter().map(|t| t.secs).sum();
        if total > 0.0 {
            println!("\n--- Stage Time Breakdown ---");
            for time in &self.stage_times {
                println!(
                    "{:<16} {:>9.3}s ({:>5.1}%)",
                    time.stage,
                    time.secs,
                    time.secs / total * 100.0
                );
            }
        }
        println!("===================\n");
    }
}

impl std::fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Events: {} processed, {} skipped, {} failed | Rate: {:.1} events/s | Elapsed: {:.3}s",
            self.events_processed,
            self.events_skipped,
            self.events_failed,
            self.events_per_second,
            self.elapsed_secs(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_increment() {
        let metrics = Metrics::new();

        metrics.add_event_processed();
        metrics.add_event_processed();
        metrics.add_event_skipped();
        metrics.add_event_failed();

        assert_eq!(metrics.events_processed.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.events_visited(), 4);
    }

    #[test]
    fn test_snapshot_rate() {
        let metrics = Metrics::new();
        for _ in 0..10 {
            metrics.add_event_processed();
        }

        let stats = metrics.snapshot(Duration::from_secs(2), Vec::new());

        assert_eq!(stats.events_processed, 10);
        assert_eq!(stats.events_visited(), 10);
        assert!((stats.events_per_second - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_elapsed_no_panic() {
        let metrics = Metrics::new();
        metrics.add_event_processed();

        let stats = metrics.snapshot(Duration::ZERO, Vec::new());
        assert_eq!(stats.events_per_second, 0.0);
    }

    #[test]
    fn test_statistics_display() {
        let stats = RunStatistics {
            events_processed: 8,
            events_skipped: 1,
            events_failed: 1,
            elapsed: Duration::from_millis(1500),
            ..Default::default()
        };

        let display = stats.to_string();
        assert!(display.contains("8 processed"));
        assert!(display.contains("1 skipped"));
        assert!(display.contains("1 failed"));
        assert!(display.contains("1.500s"));
    }

    #[test]
    fn test_statistics_serialize_elapsed_as_seconds() {
        let stats = RunStatistics {
            elapsed: Duration::from_millis(250),
            stage_times: vec![StageTime {
                stage: "reader".to_string(),
                secs: 0.25,
            }],
            ..Default::default()
        };

        let json: serde_json::Value = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["elapsed"], 0.25);
        assert_eq!(json["stage_times"][0]["stage"], "reader");
    }

    #[test]
    fn test_save_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");

        let stats = RunStatistics {
            events_processed: 3,
            ..Default::default()
        };
        stats.save_to_file(path.to_str().unwrap()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["events_processed"], 3);
    }
}
