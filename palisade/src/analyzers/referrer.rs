// palisade/src/analyzers/referrer.rs
//
// Referrer evidence: analysis-service hosts, security-vendor hosts, and
// suspicious query-parameter values. The URL splitter is deliberately
// minimal — scheme://host[:port][/path][?query] — because an unparsable
// referrer is itself evidence, not an error to recover from.

use crate::config::EngineConfig;
use crate::events::{SignalFinding, SignalKind};

pub fn analyze(referrer: &str, cfg: &EngineConfig) -> SignalFinding {
    let mut finding = SignalFinding::new(SignalKind::Referrer);

    if referrer.is_empty() || referrer == "unknown" {
        finding.hit(10, "no referrer");
        return finding;
    }

    let Some(url) = parse_referrer(referrer) else {
        finding.hit(15, "unparsable referrer");
        return finding;
    };

    let host = url.host.to_lowercase();

    for domain in &cfg.analysis_service_domains {
        if host.contains(domain.as_str()) {
            finding.hit(70, format!("analysis service referrer: {domain}"));
        }
    }

    for vendor in &cfg.security_vendor_names {
        if host.contains(vendor.as_str()) {
            finding.hit(60, format!("security vendor referrer: {vendor}"));
        }
    }

    for token in &cfg.suspicious_query_tokens {
        let hit = url
            .query_values
            .iter()
            .any(|v| v.to_lowercase().contains(token.as_str()));
        if hit {
            finding.hit(25, format!("suspicious query token in referrer: {token}"));
        }
    }

    finding
}

struct ReferrerUrl {
    host: String,
    query_values: Vec<String>,
}

fn parse_referrer(raw: &str) -> Option<ReferrerUrl> {
    let (scheme, rest) = raw.split_once("://")?;
    if scheme.is_empty()
        || !scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    {
        return None;
    }

    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..authority_end];
    // Strip userinfo, then port.
    let host_port = authority.rsplit_once('@').map(|(_, h)| h).unwrap_or(authority);
    let host = host_port.split_once(':').map(|(h, _)| h).unwrap_or(host_port);
    if host.is_empty() {
        return None;
    }

    let query_values = rest[authority_end..]
        .split_once('?')
        .map(|(_, q)| q)
        .map(|q| q.split('#').next().unwrap_or(""))
        .map(|q| {
            q.split('&')
                .filter_map(|pair| pair.split_once('=').map(|(_, v)| v.to_string()))
                .collect()
        })
        .unwrap_or_default();

    Some(ReferrerUrl { host: host.to_string(), query_values })
}
