//! Event window resolution for job-split runs.
//!
//! A large dataset is partitioned across many independent runs. Each run is
//! given a job index and a fixed per-job quota, and resolves the contiguous
//! range of event indices it is responsible for.
//!
//! Branches are evaluated in strict order:
//!
//! 1. Default window is the whole dataset `(0, n)`.
//! 2. `job_index >= 0`: `(job_index * quota, (job_index + 1) * quota - 1)`,
//!    with an early exit when the start lies past the dataset end and a clamp
//!    when only the stop does. The window is half-open, so the unclamped
//!    stop leaves the last index of each job slot (`(job_index + 1) * quota - 1`)
//!    unvisited by every job.
//! 3. `job_index < 0` and `0 <= quota < n`: the quota caps the stop.
//! 4. `quota == -2`: unbounded stop.
//! 5. Anything else keeps the default.

use serde::Serialize;
use std::ops::Range;

/// Job index meaning "not a split job".
pub const NOT_SPLIT: i64 = -1;

/// Quota meaning "process all events" when not splitting.
pub const ALL_EVENTS: i64 = -1;

/// Quota sentinel requesting an unbounded stop.
pub const UNBOUNDED_QUOTA: i64 = -2;

/// Stop index used for unbounded runs; larger than any realistic dataset.
pub const UNBOUNDED_STOP: i64 = 2_000_000_000;

/// Job window request: which slice of the dataset this run asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowRequest {
    /// Job index, or [`NOT_SPLIT`]
    pub job_index: i64,

    /// Per-job event quota, or one of the negative sentinels
    pub quota: i64,
}

impl Default for WindowRequest {
    fn default() -> Self {
        Self {
            job_index: NOT_SPLIT,
            quota: ALL_EVENTS,
        }
    }
}

impl WindowRequest {
    pub fn new(job_index: i64, quota: i64) -> Self {
        Self { job_index, quota }
    }
}

/// Window resolved for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedWindow {
    /// First event index (inclusive)
    pub start: i64,

    /// Stop index (exclusive)
    pub stop: i64,

    /// False when no events remain for this job
    pub should_run: bool,

    /// True when the nominal job stop ran past the dataset end
    pub clamped: bool,
}

impl ResolvedWindow {
    /// Event indices to visit, intersected with `[0, n)`.
    ///
    /// Unbounded stops and exhausted jobs both collapse to something that
    /// fits the dataset; an exhausted job always yields an empty range.
    pub fn events(&self, n: u64) -> Range<u64> {
        if !self.should_run {
            return n..n;
        }
        let bound = |v: i64| (v.max(0) as u64).min(n);
        let start = bound(self.start);
        let stop = bound(self.stop).max(start);
        start..stop
    }

    /// Number of events visited for a dataset of `n` events.
    pub fn len(&self, n: u64) -> u64 {
        let events = self.events(n);
        events.end - events.start
    }

    pub fn is_empty(&self, n: u64) -> bool {
        self.len(n) == 0
    }
}

impl std::fmt::Display for ResolvedWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.should_run {
            write!(f, "events {} to {}", self.start, self.stop)
        } else {
            write!(f, "no events left (start {})", self.start)
        }
    }
}

/// Resolve the event window for a dataset of `n` events.
pub fn resolve(n: u64, request: WindowRequest) -> ResolvedWindow {
    let total = i64::try_from(n).unwrap_or(i64::MAX);
    let WindowRequest { job_index, quota } = request;

    let mut window = ResolvedWindow {
        start: 0,
        stop: total,
        should_run: true,
        clamped: false,
    };

    if job_index >= 0 {
        window.start = job_index.saturating_mul(quota);
        window.stop = job_index
            .saturating_add(1)
            .saturating_mul(quota)
            .saturating_sub(1);

        if total < window.start {
            tracing::info!(
                job_index,
                start = window.start,
                n,
                "No events left for this job, exiting"
            );
            window.should_run = false;
            return window;
        }
        if total < window.stop {
            tracing::info!("Overwriting end event: stop={}", total);
            window.stop = total;
            window.clamped = true;
        }
    } else if quota >= 0 && quota < total {
        window.stop = quota;
    } else if quota == UNBOUNDED_QUOTA {
        window.stop = UNBOUNDED_STOP;
    }

    tracing::info!("Doing events {} to {}", window.start, window.stop);
    window
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(n: u64, job_index: i64, quota: i64) -> ResolvedWindow {
        resolve(n, WindowRequest::new(job_index, quota))
    }

    #[test]
    fn test_default_request_processes_everything() {
        let window = resolve(42, WindowRequest::default());
        assert_eq!((window.start, window.stop, window.should_run), (0, 42, true));
        assert_eq!(window.events(42), 0..42);
    }

    #[test]
    fn test_negative_quota_keeps_full_dataset() {
        for n in [0u64, 1, 7, 1000] {
            for quota in [-1i64, -3, -100] {
                let window = run(n, NOT_SPLIT, quota);
                assert_eq!((window.start, window.stop, window.should_run), (0, n as i64, true));
            }
        }
    }

    #[test]
    fn test_quota_caps_unsplit_run() {
        for (n, quota) in [(1000u64, 10i64), (5, 0), (5, 4)] {
            let window = run(n, NOT_SPLIT, quota);
            assert_eq!((window.start, window.stop, window.should_run), (0, quota, true));
        }
    }

    #[test]
    fn test_quota_at_or_above_n_keeps_default() {
        let window = run(10, NOT_SPLIT, 10);
        assert_eq!((window.start, window.stop), (0, 10));

        let window = run(10, NOT_SPLIT, 50);
        assert_eq!((window.start, window.stop), (0, 10));
    }

    #[test]
    fn test_unbounded_quota() {
        let window = run(500, NOT_SPLIT, UNBOUNDED_QUOTA);
        assert_eq!(window.stop, UNBOUNDED_STOP);
        assert!(window.should_run);
        assert_eq!(window.events(500), 0..500);
    }

    #[test]
    fn test_job_window_inside_dataset() {
        let window = run(100, 2, 10);
        assert_eq!((window.start, window.stop, window.should_run), (20, 29, true));
        assert!(!window.clamped);
    }

    #[test]
    fn test_job_past_dataset_end_does_not_run() {
        let window = run(15, 2, 10);
        assert!(!window.should_run);
        assert_eq!(window.start, 20);
        assert!(window.is_empty(15));
    }

    #[test]
    fn test_job_window_clamped_to_dataset_end() {
        let window = run(25, 2, 10);
        assert_eq!((window.start, window.stop, window.should_run), (20, 25, true));
        assert!(window.clamped);
        assert_eq!(window.len(25), 5);
    }

    #[test]
    fn test_job_start_equal_to_n_still_runs_empty() {
        // n < start is false when start == n
        let window = run(20, 2, 10);
        assert!(window.should_run);
        assert_eq!((window.start, window.stop), (20, 20));
        assert!(window.is_empty(20));
    }

    #[test]
    fn test_exhausted_jobs_for_any_positive_quota() {
        for quota in 1i64..20 {
            for job_index in 0i64..20 {
                let n = 37u64;
                let window = run(n, job_index, quota);
                if job_index * quota > n as i64 {
                    assert!(!window.should_run, "job {job_index} quota {quota}");
                } else {
                    assert!(window.should_run);
                    assert!(window.stop <= n as i64);
                    if (job_index + 1) * quota - 1 > n as i64 {
                        assert_eq!(window.stop, n as i64);
                    }
                }
            }
        }
    }

    #[test]
    fn test_job_mode_ignores_unbounded_sentinel_branch() {
        // Job mode wins even with the unbounded sentinel; the window is negative
        // and visits nothing.
        let window = run(100, 1, UNBOUNDED_QUOTA);
        assert!(window.should_run);
        assert_eq!((window.start, window.stop), (-2, -5));
        assert!(window.is_empty(100));
    }

    #[test]
    fn test_events_never_exceed_dataset() {
        let window = ResolvedWindow {
            start: -5,
            stop: UNBOUNDED_STOP,
            should_run: true,
            clamped: false,
        };
        assert_eq!(window.events(12), 0..12);
    }

    #[test]
    fn test_resolver_saturates_instead_of_overflowing() {
        let window = run(10, i64::MAX, i64::MAX);
        assert!(!window.should_run);
    }

    #[test]
    fn test_display() {
        assert_eq!(run(100, 2, 10).to_string(), "events 20 to 29");
        assert!(run(15, 2, 10).to_string().contains("no events left"));
    }
}
