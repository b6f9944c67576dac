// End-to-end engine scenarios: decision thresholds, reason ordering,
// block-list visibility, and analyzer purity.

use std::collections::HashMap;

use palisade::analyzers::{geo, referrer, user_agent};
use palisade::{EngineConfig, RequestDescriptor, RiskEngine};

const CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

fn browser_headers() -> HashMap<String, String> {
    [
        ("Accept", "text/html,application/xhtml+xml"),
        ("Accept-Language", "en-US,en;q=0.9"),
        ("Accept-Encoding", "gzip, deflate"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn engine() -> RiskEngine {
    RiskEngine::new(EngineConfig::default()).unwrap()
}

#[test]
fn unidentified_request_scores_sixty_and_blocks() {
    let engine = engine();
    let descriptor = RequestDescriptor {
        headers: browser_headers(),
        ..Default::default()
    };

    let assessment = engine.evaluate(&descriptor);

    // unknown address (20) + empty user agent (30) + no referrer (10)
    assert_eq!(assessment.risk_score, 60);
    assert!(!assessment.allowed);
    assert!(assessment.recommendations.iter().any(|r| r.contains("block")));

    // Reasons concatenate in analyzer order: ip, user-agent, referrer.
    assert_eq!(assessment.reasons.len(), 3);
    assert!(assessment.reasons[0].contains("address"));
    assert!(assessment.reasons[1].contains("user agent"));
    assert!(assessment.reasons[2].contains("referrer"));
}

#[test]
fn unidentified_request_without_headers_also_loses_header_signal() {
    let engine = engine();
    let assessment = engine.evaluate(&RequestDescriptor::default());

    // As above plus the missing-common-headers rule (30).
    assert_eq!(assessment.risk_score, 90);
    assert!(!assessment.allowed);
}

#[test]
fn vendor_range_alone_flips_the_decision() {
    let engine = engine();
    let descriptor = RequestDescriptor {
        origin: "8.8.8.8".to_string(),
        user_agent: CHROME_UA.to_string(),
        referrer: "https://www.example.com".to_string(),
        headers: browser_headers(),
        ..Default::default()
    };

    let assessment = engine.evaluate(&descriptor);

    // 8.8.8.8 sits inside the configured 8.8.8.0/24 vendor range; that +60
    // is the sole contribution and is already past the block threshold.
    assert_eq!(assessment.risk_score, 60);
    assert!(!assessment.allowed);
    assert!(assessment.reasons.iter().any(|r| r.contains("vendor")));
}

#[test]
fn clean_request_is_allowed() {
    let engine = engine();
    let descriptor = RequestDescriptor {
        origin: "93.184.216.34".to_string(),
        user_agent: CHROME_UA.to_string(),
        referrer: "https://www.example.com/articles?page=2".to_string(),
        headers: browser_headers(),
        ..Default::default()
    };

    let assessment = engine.evaluate(&descriptor);
    assert_eq!(assessment.risk_score, 0, "reasons: {:?}", assessment.reasons);
    assert!(assessment.allowed);
    assert!(assessment.recommendations.is_empty());
    assert_eq!(assessment.fingerprint, palisade::fingerprint(&descriptor));
}

#[test]
fn watch_band_gets_monitoring_recommendations() {
    let engine = engine();
    let descriptor = RequestDescriptor {
        origin: "93.184.216.34".to_string(),
        // empty user agent (30) + no referrer (10) = 40: allowed but watched
        headers: browser_headers(),
        ..Default::default()
    };

    let assessment = engine.evaluate(&descriptor);
    assert_eq!(assessment.risk_score, 40);
    assert!(assessment.allowed);
    assert_eq!(
        assessment.recommendations,
        vec!["monitor closely".to_string(), "apply cloaking".to_string()]
    );
}

#[test]
fn decision_threshold_invariant_always_holds() {
    let engine = engine();
    engine.block("203.0.113.50", "integration test");

    let samples = [
        RequestDescriptor { headers: browser_headers(), ..Default::default() },
        RequestDescriptor {
            origin: "127.0.0.1".to_string(),
            user_agent: "curl/7.64.1".to_string(),
            ..Default::default()
        },
        RequestDescriptor {
            origin: "203.0.113.50".to_string(),
            user_agent: CHROME_UA.to_string(),
            referrer: "https://www.virustotal.com/gui".to_string(),
            headers: browser_headers(),
            country: Some("NL".to_string()),
            ..Default::default()
        },
        RequestDescriptor {
            origin: "93.184.216.34".to_string(),
            user_agent: CHROME_UA.to_string(),
            referrer: "https://www.example.com".to_string(),
            headers: browser_headers(),
            ..Default::default()
        },
    ];

    for descriptor in &samples {
        let a = engine.evaluate(descriptor);
        assert_eq!(a.allowed, a.risk_score < 50, "descriptor {:?}", descriptor.origin);
    }
}

#[test]
fn blocklist_mutations_are_visible_to_the_next_evaluation() {
    let engine = engine();
    let descriptor = RequestDescriptor {
        origin: "198.51.100.23".to_string(),
        user_agent: CHROME_UA.to_string(),
        referrer: "https://www.example.com".to_string(),
        headers: browser_headers(),
        ..Default::default()
    };
    // Spaced, irregular evaluation times keep the timing analyzer quiet.
    let t0 = chrono::Utc::now();

    assert!(engine.evaluate_at(&descriptor, t0).allowed);

    engine.block("198.51.100.23", "abuse report");
    assert!(engine.is_blocked("198.51.100.23"));

    let assessment = engine.evaluate_at(&descriptor, t0 + chrono::Duration::seconds(30));
    assert_eq!(assessment.risk_score, 80);
    assert!(!assessment.allowed);
    // Blocking is advisory evidence, not a short-circuit: the full reasons
    // list is still produced (here, just the block-list reason).
    assert!(assessment.reasons.iter().any(|r| r.contains("block list")));

    assert!(engine.unblock("198.51.100.23"));
    assert!(engine.evaluate_at(&descriptor, t0 + chrono::Duration::seconds(95)).allowed);
}

#[test]
fn blocked_origin_still_accumulates_other_signals() {
    let engine = engine();
    engine.block("8.8.8.8", "manual");

    let descriptor = RequestDescriptor {
        origin: "8.8.8.8".to_string(),
        user_agent: CHROME_UA.to_string(),
        referrer: "https://www.example.com".to_string(),
        headers: browser_headers(),
        ..Default::default()
    };

    let assessment = engine.evaluate(&descriptor);
    // vendor range (60) + block list (80)
    assert_eq!(assessment.risk_score, 140);
    assert_eq!(assessment.reasons.len(), 2);
}

#[test]
fn stats_reflect_engine_state() {
    let engine = engine();
    engine.block("203.0.113.1", "x");

    let descriptor = RequestDescriptor {
        origin: "198.51.100.5".to_string(),
        user_agent: CHROME_UA.to_string(),
        headers: browser_headers(),
        ..Default::default()
    };
    engine.evaluate(&descriptor);
    engine.evaluate(&descriptor);

    let stats = engine.stats();
    assert_eq!(stats.tracked_origins, 1);
    assert_eq!(stats.tracked_timestamps, 2);
    assert_eq!(stats.blocked_origins, 1);
    assert_eq!(stats.request_ceiling, 5);

    engine.clear_tracking();
    assert_eq!(engine.stats().tracked_origins, 0);
    assert_eq!(engine.stats().blocked_origins, 1);
}

#[test]
fn pure_analyzers_are_idempotent() {
    let cfg = EngineConfig::default();
    let ua_rules = user_agent::UaRules::compile(&cfg).unwrap();

    let first = user_agent::analyze("sqlmap/1.7 scraperbot", &ua_rules);
    let second = user_agent::analyze("sqlmap/1.7 scraperbot", &ua_rules);
    assert_eq!(first, second);

    let first = referrer::analyze("https://www.virustotal.com/?q=scan", &cfg);
    let second = referrer::analyze("https://www.virustotal.com/?q=scan", &cfg);
    assert_eq!(first, second);

    let first = geo::analyze(Some("US"), &cfg);
    let second = geo::analyze(Some("US"), &cfg);
    assert_eq!(first, second);
}
