// palisade/src/analyzers/user_agent.rs
//
// User-agent evidence: curated keyword categories, bot markers, and a
// structural parse into (browser family, major version, OS family).
//
// A keyword scores once per category it appears in; the bot-marker list is
// additive with the categories, so a string like "scraperbot" is penalized
// by both. Matching is case-insensitive via one Aho-Corasick automaton per
// list, deduplicated per keyword.

use std::collections::BTreeSet;

use aho_corasick::AhoCorasick;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::events::{SignalFinding, SignalKind};

struct KeywordSet {
    label: &'static str,
    automaton: AhoCorasick,
    keywords: Vec<String>,
}

impl KeywordSet {
    fn build(label: &'static str, keywords: &[String]) -> Result<Self> {
        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(keywords)
            .map_err(|e| EngineError::Config(format!("bad keyword set {label}: {e}")))?;
        Ok(Self { label, automaton, keywords: keywords.to_vec() })
    }

    /// Keywords present in `haystack`, each at most once, in list order.
    fn matches<'a>(&'a self, haystack: &str) -> impl Iterator<Item = &'a str> {
        let ids: BTreeSet<usize> = self
            .automaton
            .find_overlapping_iter(haystack)
            .map(|m| m.pattern().as_usize())
            .collect();
        ids.into_iter().map(move |i| self.keywords[i].as_str())
    }
}

/// Compiled user-agent rules.
pub struct UaRules {
    categories: Vec<KeywordSet>,
    bots: KeywordSet,
    min_browser_major: u32,
}

impl UaRules {
    pub fn compile(cfg: &EngineConfig) -> Result<Self> {
        let categories = vec![
            KeywordSet::build("security tool", &cfg.security_tool_keywords)?,
            KeywordSet::build("automated browser", &cfg.automation_keywords)?,
            KeywordSet::build("packet analysis tool", &cfg.packet_tool_keywords)?,
            KeywordSet::build("virtualization marker", &cfg.virtualization_keywords)?,
        ];
        Ok(Self {
            categories,
            bots: KeywordSet::build("bot marker", &cfg.bot_keywords)?,
            min_browser_major: cfg.min_browser_major,
        })
    }
}

pub fn analyze(user_agent: &str, rules: &UaRules) -> SignalFinding {
    let mut finding = SignalFinding::new(SignalKind::UserAgent);

    if user_agent.is_empty() {
        finding.hit(30, "empty user agent");
        return finding;
    }

    for set in &rules.categories {
        for kw in set.matches(user_agent) {
            finding.hit(40, format!("suspicious keyword: {kw} ({})", set.label));
        }
    }

    for kw in rules.bots.matches(user_agent) {
        finding.hit(35, format!("bot marker: {kw}"));
    }

    match parse_structure(user_agent) {
        Ok(profile) => {
            if let Some((family, major)) = &profile.browser {
                if *major < rules.min_browser_major {
                    finding.hit(20, format!("outdated browser version: {family} {major}"));
                }
            }
            if profile.browser.is_none() || profile.os.is_none() {
                finding.hit(25, "browser or platform family undetermined");
            }
        }
        Err(_) => finding.hit(30, "malformed or unparsable user agent"),
    }

    finding
}

// ── Structural parse ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UaProfile {
    /// (family, major version) when a known browser family is recognizable.
    pub browser: Option<(&'static str, u32)>,
    pub os: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UaParseError;

// Product-token precedence: Edge and Opera embed a Chrome token, Chrome
// embeds a Safari token, so specific families come first.
const FAMILIES: &[(&str, &str)] = &[
    ("edg", "Edge"),
    ("edge", "Edge"),
    ("opr", "Opera"),
    ("opera", "Opera"),
    ("firefox", "Firefox"),
    ("fxios", "Firefox"),
    ("crios", "Chrome"),
    ("chrome", "Chrome"),
    ("safari", "Safari"),
];

/// Best-effort structural parse. `Err` means the string is malformed as a
/// user-agent (unbalanced platform parentheses, or a known product token
/// carrying a non-numeric version) rather than merely unrecognized.
pub fn parse_structure(user_agent: &str) -> std::result::Result<UaProfile, UaParseError> {
    let (products, platform) = split_tokens(user_agent)?;

    let mut browser = None;
    'family: for (token, family) in FAMILIES {
        for (name, version) in &products {
            if name.eq_ignore_ascii_case(token) {
                let mut major = parse_major(version)?;
                // Safari advertises its real version in a separate token.
                if *family == "Safari" {
                    if let Some((_, v)) =
                        products.iter().find(|(n, _)| n.eq_ignore_ascii_case("version"))
                    {
                        major = parse_major(v)?;
                    }
                }
                browser = Some((*family, major));
                break 'family;
            }
        }
    }

    Ok(UaProfile { browser, os: detect_os(&platform) })
}

/// Split into product/version tokens outside parentheses and the concatenated
/// parenthesized platform text. Unbalanced parentheses are malformed.
fn split_tokens(ua: &str) -> std::result::Result<(Vec<(String, String)>, String), UaParseError> {
    let mut products = Vec::new();
    let mut platform = String::new();
    let mut outside = String::new();
    let mut depth = 0usize;

    for ch in ua.chars() {
        match ch {
            '(' => {
                depth += 1;
                platform.push(' ');
            }
            ')' => {
                depth = depth.checked_sub(1).ok_or(UaParseError)?;
            }
            _ if depth > 0 => platform.push(ch),
            _ => outside.push(ch),
        }
    }
    if depth != 0 {
        return Err(UaParseError);
    }

    for token in outside.split_whitespace() {
        if let Some((name, version)) = token.split_once('/') {
            if !name.is_empty() && !version.is_empty() {
                products.push((name.to_string(), version.to_string()));
            }
        }
    }

    Ok((products, platform))
}

fn parse_major(version: &str) -> std::result::Result<u32, UaParseError> {
    version
        .split('.')
        .next()
        .and_then(|v| v.parse::<u32>().ok())
        .ok_or(UaParseError)
}

fn detect_os(platform: &str) -> Option<&'static str> {
    let p = platform.to_lowercase();
    if p.contains("windows") {
        Some("Windows")
    } else if p.contains("android") {
        Some("Android")
    } else if p.contains("iphone") || p.contains("ipad") || p.contains("ipod") {
        Some("iOS")
    } else if p.contains("mac os") || p.contains("macintosh") {
        Some("macOS")
    } else if p.contains("linux") || p.contains("x11") || p.contains("cros") {
        Some("Linux")
    } else {
        None
    }
}
