// palisade/src/analyzers/geo.rs
//
// Country-code evidence from the external geo-IP collaborator. No geo info
// means no contribution. Country comparisons are case-insensitive.
//
// Deny-list and allow-list checks run independently: a country that is
// deny-listed and also absent from a configured allow list scores both +80
// and +60. That is a configuration hazard, preserved as-is.

use crate::config::EngineConfig;
use crate::events::{SignalFinding, SignalKind};

pub fn analyze(country: Option<&str>, cfg: &EngineConfig) -> SignalFinding {
    let mut finding = SignalFinding::new(SignalKind::Geo);

    let Some(country) = country else {
        return finding;
    };
    let country = country.to_ascii_uppercase();

    if cfg.denied_countries.iter().any(|c| c.eq_ignore_ascii_case(&country)) {
        finding.hit(80, format!("denied country: {country}"));
    }

    if !cfg.allowed_countries.is_empty()
        && !cfg.allowed_countries.iter().any(|c| c.eq_ignore_ascii_case(&country))
    {
        finding.hit(60, format!("country not on allow list: {country}"));
    }

    if cfg
        .analysis_heavy_countries
        .iter()
        .any(|c| c.eq_ignore_ascii_case(&country))
    {
        finding.hit(20, format!("analysis-heavy country: {country}"));
    }

    finding
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_geo_info_is_clean() {
        assert!(analyze(None, &EngineConfig::default()).is_clear());
    }

    #[test]
    fn analysis_heavy_country() {
        let f = analyze(Some("nl"), &EngineConfig::default());
        assert_eq!(f.score, 20);
    }

    #[test]
    fn deny_and_allow_both_fire_when_misconfigured() {
        let cfg = EngineConfig {
            denied_countries: vec!["XX".to_string()],
            allowed_countries: vec!["YY".to_string()],
            ..Default::default()
        };
        let f = analyze(Some("XX"), &cfg);
        assert_eq!(f.score, 140);
        assert_eq!(f.reasons.len(), 2);
    }

    #[test]
    fn allow_listed_country_passes() {
        let cfg = EngineConfig {
            allowed_countries: vec!["SE".to_string()],
            ..Default::default()
        };
        assert!(analyze(Some("se"), &cfg).is_clear());
    }
}
