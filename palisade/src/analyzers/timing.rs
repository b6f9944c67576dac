// palisade/src/analyzers/timing.rs
//
// Frequency and cadence evidence over the shared per-origin rate window.
// The only analyzer with a required side effect: it appends the evaluation
// time to the origin's window (append+prune+read is atomic per key, see
// state/window.rs). An empty origin is not tracked at all.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::config::EngineConfig;
use crate::events::{SignalFinding, SignalKind};
use crate::state::RateTracker;

pub fn analyze(
    origin: &str,
    now: DateTime<Utc>,
    tracker: &RateTracker,
    cfg: &EngineConfig,
) -> SignalFinding {
    let mut finding = SignalFinding::new(SignalKind::Timing);

    if origin.is_empty() {
        return finding;
    }

    let snapshot = tracker.observe(origin, now);

    if snapshot.count > cfg.max_requests_per_origin {
        finding.hit(
            50,
            format!("too many requests: {} in {} minutes", snapshot.count, cfg.window_minutes),
        );
    }

    if snapshot.count >= 3 && !snapshot.gaps_secs.is_empty() {
        // Gaps truncated to whole seconds; a single distinct value across
        // every gap means a machine is driving the schedule.
        let truncated: BTreeSet<i64> = snapshot.gaps_secs.iter().map(|g| *g as i64).collect();
        if truncated.len() == 1 {
            finding.hit(40, "automated cadence detected");
        }
        if snapshot.gaps_secs.iter().any(|g| *g < 1.0) {
            finding.hit(35, "burst below human reaction time");
        }
    }

    finding
}
