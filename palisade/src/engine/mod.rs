// palisade/src/engine/mod.rs
//
// The risk aggregator: runs the analyzers in their fixed order, sums
// contributions into one uncapped score, concatenates reasons, and applies
// the decision rule. Any panic inside an analyzer step is caught and
// converted to the fail-closed assessment — the engine never fails open.

mod cloak;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::analyzers::{self, ip::IpRules, user_agent::UaRules, AnalyzerContext};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::events::{EngineStats, RequestDescriptor, RiskAssessment};
use crate::fingerprint::fingerprint;
use crate::state::{BlockList, RateTracker};

/// Score at or above which a request is not allowed.
const BLOCK_THRESHOLD: u32 = 50;
/// Score at or above which advisory monitoring/cloaking recommendations kick in.
const WATCH_THRESHOLD: u32 = 30;

/// Long-lived, shareable risk-scoring engine. All analyzer logic is a pure
/// function of the request and the configuration; the only synchronized
/// state is the per-origin rate window and the block list.
pub struct RiskEngine {
    config: EngineConfig,
    ip_rules: IpRules,
    ua_rules: UaRules,
    tracker: RateTracker,
    blocklist: BlockList,
    #[cfg(test)]
    pub(crate) inject_fault: std::sync::atomic::AtomicBool,
}

impl RiskEngine {
    /// Compile the configuration (keyword automatons, CIDR ranges) and build
    /// an engine. Fails only on unusable configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let ip_rules = IpRules::compile(&config)?;
        let ua_rules = UaRules::compile(&config)?;
        let tracker = RateTracker::new(config.window_minutes);
        Ok(Self {
            config,
            ip_rules,
            ua_rules,
            tracker,
            blocklist: BlockList::new(),
            #[cfg(test)]
            inject_fault: std::sync::atomic::AtomicBool::new(false),
        })
    }

    /// Evaluate one request at the current instant.
    pub fn evaluate(&self, descriptor: &RequestDescriptor) -> RiskAssessment {
        self.evaluate_at(descriptor, Utc::now())
    }

    /// Evaluate one request at an explicit instant. The instant feeds the
    /// rate window; everything else is time-independent.
    pub fn evaluate_at(&self, descriptor: &RequestDescriptor, now: DateTime<Utc>) -> RiskAssessment {
        let fp = catch_unwind(AssertUnwindSafe(|| fingerprint(descriptor))).unwrap_or_default();

        match catch_unwind(AssertUnwindSafe(|| self.evaluate_inner(descriptor, now, &fp))) {
            Ok(assessment) => assessment,
            Err(payload) => {
                let detail = panic_message(payload.as_ref());
                warn!(origin = %descriptor.origin, detail, "analyzer fault, failing closed");
                RiskAssessment {
                    allowed: false,
                    risk_score: 100,
                    reasons: vec![format!("internal analyzer failure: {detail}")],
                    recommendations: vec!["block for safety".to_string()],
                    fingerprint: fp,
                }
            }
        }
    }

    fn evaluate_inner(
        &self,
        descriptor: &RequestDescriptor,
        now: DateTime<Utc>,
        fp: &str,
    ) -> RiskAssessment {
        #[cfg(test)]
        if self.inject_fault.load(std::sync::atomic::Ordering::Relaxed) {
            panic!("injected analyzer fault");
        }

        let ctx = AnalyzerContext {
            config: &self.config,
            ip_rules: &self.ip_rules,
            ua_rules: &self.ua_rules,
            tracker: &self.tracker,
            blocklist: &self.blocklist,
        };
        let findings = analyzers::run_all(descriptor, now, &ctx);

        let risk_score: u32 = findings.iter().map(|f| f.score).sum();
        let reasons: Vec<String> = findings.into_iter().flat_map(|f| f.reasons).collect();

        let allowed = risk_score < BLOCK_THRESHOLD;
        let mut recommendations = Vec::new();
        if risk_score >= BLOCK_THRESHOLD {
            recommendations.push("block request".to_string());
        } else if risk_score >= WATCH_THRESHOLD {
            recommendations.push("monitor closely".to_string());
            recommendations.push("apply cloaking".to_string());
        }

        if allowed {
            debug!(origin = %descriptor.origin, risk_score, "request evaluated");
        } else {
            warn!(origin = %descriptor.origin, risk_score, ?reasons, "request blocked");
        }

        RiskAssessment {
            allowed,
            risk_score,
            reasons,
            recommendations,
            fingerprint: fp.to_string(),
        }
    }

    /// Map an assessment and the real response body to what actually goes
    /// out: the body unchanged below the watch threshold, a masking page
    /// otherwise, selected by risk band.
    pub fn select_response(&self, assessment: &RiskAssessment, original: Bytes) -> Bytes {
        cloak::select_response(
            assessment,
            original,
            &self.config.redirect_destinations,
            self.config.enable_cloaking,
        )
    }

    // ── Block list administration ─────────────────────────────────────────────

    pub fn block(&self, origin: &str, reason: &str) {
        self.blocklist.block(origin, reason);
    }

    pub fn unblock(&self, origin: &str) -> bool {
        self.blocklist.unblock(origin)
    }

    pub fn is_blocked(&self, origin: &str) -> bool {
        self.blocklist.is_blocked(origin)
    }

    // ── Maintenance ───────────────────────────────────────────────────────────

    /// Evict rate windows whose newest entry has aged out entirely.
    pub fn sweep_stale(&self, now: DateTime<Utc>) -> usize {
        self.tracker.sweep(now)
    }

    /// Drop all rate-tracking state (block list is untouched).
    pub fn clear_tracking(&self) {
        self.tracker.clear();
    }

    /// Periodic eviction, for long-running hosts. Spawn once per engine.
    pub async fn housekeeping_loop(self: Arc<Self>) {
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(300)).await;
            self.sweep_stale(Utc::now());
        }
    }

    pub fn stats(&self) -> EngineStats {
        let now = Utc::now();
        EngineStats {
            total_observed: self.tracker.total_observed(),
            tracked_origins: self.tracker.tracked_origins(),
            tracked_timestamps: self.tracker.tracked_timestamps(),
            active_origins: self.tracker.active_origins(now),
            blocked_origins: self.blocklist.len(),
            request_ceiling: self.config.max_requests_per_origin,
            window_minutes: self.config.window_minutes,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

fn panic_message<'a>(payload: &'a (dyn std::any::Any + Send + 'static)) -> &'a str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
