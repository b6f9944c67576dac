// palisade/src/analyzers/sandbox.rs
//
// Sandbox / analysis-environment evidence: VM artifacts leaking into the
// user-agent, proxy-revealing headers, and the absence of headers every
// real browser sends.

use crate::config::EngineConfig;
use crate::events::{RequestDescriptor, SignalFinding, SignalKind};

const PROXY_HEADERS: &[(&str, &str)] = &[
    ("x-forwarded-for", "proxy header present: x-forwarded-for"),
    ("x-real-ip", "proxy header present: x-real-ip"),
    ("x-originating-ip", "proxy header present: x-originating-ip"),
];

const COMMON_BROWSER_HEADERS: &[&str] = &["accept", "accept-language", "accept-encoding"];

pub fn analyze(descriptor: &RequestDescriptor, cfg: &EngineConfig) -> SignalFinding {
    let mut finding = SignalFinding::new(SignalKind::Sandbox);

    let ua = descriptor.user_agent.to_lowercase();
    for artifact in &cfg.vm_artifact_keywords {
        if ua.contains(artifact.as_str()) {
            finding.hit(60, format!("virtualization artifact in user agent: {artifact}"));
        }
    }

    for (name, description) in PROXY_HEADERS {
        if descriptor.has_header(name) {
            finding.hit(25, *description);
        }
    }

    let missing: Vec<&str> = COMMON_BROWSER_HEADERS
        .iter()
        .copied()
        .filter(|h| !descriptor.has_header(h))
        .collect();
    if missing.len() >= 2 {
        finding.hit(30, format!("common browser headers missing: {}", missing.join(", ")));
    }

    finding
}
