// palisade/src/analyzers/mod.rs
//
// The five read-only signal analyzers plus the stateful timing analyzer.
// Evaluation is synchronous and CPU-bound; the fixed run order below is
// contractual because assessment reasons concatenate in this order.

pub mod geo;
pub mod ip;
pub mod referrer;
pub mod sandbox;
pub mod timing;
pub mod user_agent;

use chrono::{DateTime, Utc};

use crate::config::EngineConfig;
use crate::events::{RequestDescriptor, SignalFinding};
use crate::state::{BlockList, RateTracker};

/// Everything an analyzer run needs, borrowed from the engine.
pub(crate) struct AnalyzerContext<'a> {
    pub config: &'a EngineConfig,
    pub ip_rules: &'a ip::IpRules,
    pub ua_rules: &'a user_agent::UaRules,
    pub tracker: &'a RateTracker,
    pub blocklist: &'a BlockList,
}

/// Run all enabled analyzers in the fixed order: ip, user-agent, referrer,
/// timing, geo, sandbox. A disabled analyzer contributes nothing; the
/// user-agent analyzer always runs.
pub(crate) fn run_all(
    descriptor: &RequestDescriptor,
    now: DateTime<Utc>,
    ctx: &AnalyzerContext<'_>,
) -> Vec<SignalFinding> {
    let cfg = ctx.config;
    let mut findings = Vec::with_capacity(6);

    if cfg.enable_ip_analysis {
        findings.push(ip::analyze(&descriptor.origin, ctx.ip_rules, ctx.blocklist, ctx.tracker));
    }
    findings.push(user_agent::analyze(&descriptor.user_agent, ctx.ua_rules));
    if cfg.enable_referrer_analysis {
        findings.push(referrer::analyze(&descriptor.referrer, cfg));
    }
    if cfg.enable_timing_analysis {
        findings.push(timing::analyze(&descriptor.origin, now, ctx.tracker, cfg));
    }
    if cfg.enable_geo_analysis {
        findings.push(geo::analyze(descriptor.country.as_deref(), cfg));
    }
    if cfg.enable_sandbox_detection {
        findings.push(sandbox::analyze(descriptor, cfg));
    }

    findings
}
