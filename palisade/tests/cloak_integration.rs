// Response policy selection by risk band. The masking pages are static and
// never reference the request; the redirect destination is drawn from the
// configured list on every call.

use bytes::Bytes;
use palisade::{EngineConfig, RequestDescriptor, RiskAssessment, RiskBand, RiskEngine};

fn assessment(score: u32) -> RiskAssessment {
    RiskAssessment {
        allowed: score < 50,
        risk_score: score,
        reasons: vec![],
        recommendations: vec![],
        fingerprint: "0123456789abcdef".to_string(),
    }
}

fn engine() -> RiskEngine {
    RiskEngine::new(EngineConfig::default()).unwrap()
}

fn body() -> Bytes {
    Bytes::from_static(b"<html>the real page</html>")
}

#[test]
fn low_band_passes_the_original_body_through() {
    let engine = engine();
    for score in [0, 12, 29] {
        assert_eq!(engine.select_response(&assessment(score), body()), body());
    }
}

#[test]
fn moderate_band_serves_the_landing_page() {
    let engine = engine();
    let out = engine.select_response(&assessment(33), body());
    let html = String::from_utf8(out.to_vec()).unwrap();
    assert!(html.contains("Welcome"));
    assert!(!html.contains("the real page"));
}

#[test]
fn elevated_band_serves_a_redirect_to_a_configured_destination() {
    let engine = engine();
    let destinations = engine.config().redirect_destinations.clone();

    for _ in 0..8 {
        let out = engine.select_response(&assessment(45), body());
        let html = String::from_utf8(out.to_vec()).unwrap();
        assert!(html.contains("Redirecting"));
        assert!(!html.contains("the real page"));
        assert!(
            destinations.iter().any(|d| html.contains(d.as_str())),
            "destination not from configured list: {html}"
        );
    }
}

#[test]
fn redirect_destination_honors_a_custom_list() {
    let cfg = EngineConfig {
        redirect_destinations: vec!["https://docs.example.org".to_string()],
        ..Default::default()
    };
    let engine = RiskEngine::new(cfg).unwrap();

    let out = engine.select_response(&assessment(42), body());
    let html = String::from_utf8(out.to_vec()).unwrap();
    assert!(html.contains("https://docs.example.org"));
}

#[test]
fn high_band_always_serves_the_maintenance_page() {
    let engine = engine();
    for score in [50, 65, 69] {
        let out = engine.select_response(&assessment(score), body());
        let html = String::from_utf8(out.to_vec()).unwrap();
        assert!(html.contains("Maintenance"), "score {score}");
        assert!(!html.contains("the real page"));
    }
}

#[test]
fn critical_band_serves_the_not_found_page() {
    let engine = engine();
    for score in [70, 88, 200] {
        let out = engine.select_response(&assessment(score), body());
        let html = String::from_utf8(out.to_vec()).unwrap();
        assert!(html.contains("404"), "score {score}");
    }
}

#[test]
fn bands_cover_the_score_line() {
    assert_eq!(RiskBand::from_score(0), RiskBand::Low);
    assert_eq!(RiskBand::from_score(29), RiskBand::Low);
    assert_eq!(RiskBand::from_score(30), RiskBand::Moderate);
    assert_eq!(RiskBand::from_score(39), RiskBand::Moderate);
    assert_eq!(RiskBand::from_score(40), RiskBand::Elevated);
    assert_eq!(RiskBand::from_score(49), RiskBand::Elevated);
    assert_eq!(RiskBand::from_score(50), RiskBand::High);
    assert_eq!(RiskBand::from_score(69), RiskBand::High);
    assert_eq!(RiskBand::from_score(70), RiskBand::Critical);
}

#[test]
fn cloaking_disabled_passes_everything_through() {
    let cfg = EngineConfig { enable_cloaking: false, ..Default::default() };
    let engine = RiskEngine::new(cfg).unwrap();
    assert_eq!(engine.select_response(&assessment(88), body()), body());
}

#[test]
fn evaluated_block_feeds_straight_into_masking() {
    let engine = engine();
    let descriptor = RequestDescriptor {
        origin: "8.8.8.8".to_string(),
        ..Default::default()
    };

    let assessment = engine.evaluate(&descriptor);
    assert!(!assessment.allowed);

    let out = engine.select_response(&assessment, body());
    assert!(!out.is_empty());
    assert_ne!(out, body());
}