// palisade/src/config.rs
//
// Engine configuration: thresholds, feature flags, and the curated evidence
// lists the analyzers match against. Loaded once, immutable for the lifetime
// of an engine — reconfigure by constructing a new engine, never by mutating
// in place. Multiple engines with different policies can coexist in one
// process (per-tenant policy).

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // ── Thresholds ────────────────────────────────────────────────────────────
    /// Per-origin request ceiling inside the trailing window.
    pub max_requests_per_origin: usize,
    /// Trailing window length for rate tracking, in minutes.
    pub window_minutes: i64,
    /// Browsers of a known family with a major version below this score as
    /// outdated. Applied uniformly across families.
    pub min_browser_major: u32,

    // ── Feature flags ─────────────────────────────────────────────────────────
    // A disabled analyzer contributes nothing. All default to enabled.
    pub enable_ip_analysis: bool,
    pub enable_referrer_analysis: bool,
    pub enable_timing_analysis: bool,
    pub enable_geo_analysis: bool,
    pub enable_sandbox_detection: bool,
    pub enable_cloaking: bool,

    // ── Country policy ────────────────────────────────────────────────────────
    /// Countries always scored +80.
    pub denied_countries: Vec<String>,
    /// If non-empty, countries absent from this list score +60. Evaluated
    /// independently of the deny list: a country can be hit by both (a
    /// configuration hazard the engine preserves rather than papers over).
    pub allowed_countries: Vec<String>,
    /// Countries hosting a disproportionate share of analysis services.
    pub analysis_heavy_countries: Vec<String>,

    // ── User-agent keyword categories (+40 per matched keyword) ───────────────
    pub security_tool_keywords: Vec<String>,
    pub automation_keywords: Vec<String>,
    pub packet_tool_keywords: Vec<String>,
    pub virtualization_keywords: Vec<String>,

    /// Short bot-marker list, +35 per match, additive with the categories.
    pub bot_keywords: Vec<String>,

    // ── Sandbox / referrer lists ──────────────────────────────────────────────
    /// VM artifacts looked for in the user-agent by the sandbox analyzer
    /// (distinct from `virtualization_keywords` above).
    pub vm_artifact_keywords: Vec<String>,
    /// Known sandbox / malware-analysis service domains.
    pub analysis_service_domains: Vec<String>,
    /// Security-vendor company names matched as domain substrings.
    pub security_vendor_names: Vec<String>,
    /// Tokens looked for inside referrer query parameter values.
    pub suspicious_query_tokens: Vec<String>,

    // ── Network policy ────────────────────────────────────────────────────────
    /// CIDR ranges of well-known security-vendor / scanning infrastructure.
    pub vendor_networks: Vec<String>,

    // ── Cloaking ──────────────────────────────────────────────────────────────
    /// Legitimate destinations for the redirect masking page.
    pub redirect_destinations: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_requests_per_origin: 5,
            window_minutes: 60,
            min_browser_major: 100,

            enable_ip_analysis: true,
            enable_referrer_analysis: true,
            enable_timing_analysis: true,
            enable_geo_analysis: true,
            enable_sandbox_detection: true,
            enable_cloaking: true,

            denied_countries: vec![],
            allowed_countries: vec![],
            analysis_heavy_countries: strings(&["US", "NL", "DE", "GB", "FR"]),

            security_tool_keywords: strings(&[
                "nmap", "nikto", "sqlmap", "burp", "owasp", "zap", "w3af",
                "metasploit", "nessus", "openvas", "acunetix", "qualys",
            ]),
            automation_keywords: strings(&[
                "headless", "phantom", "selenium", "webdriver", "automation",
                "bot", "crawler", "spider", "scraper", "monitor",
            ]),
            packet_tool_keywords: strings(&[
                "wireshark", "fiddler", "charles", "mitmproxy", "tcpdump",
                "ettercap", "aircrack", "hashcat", "john",
            ]),
            virtualization_keywords: strings(&[
                "vmware", "virtualbox", "qemu", "xen", "hyper-v",
                "sandbox", "analysis", "malware", "virus", "threat",
            ]),

            bot_keywords: strings(&["bot", "crawler", "spider", "scraper"]),

            vm_artifact_keywords: strings(&[
                "vmware", "virtualbox", "vbox", "qemu", "xen", "hyper-v",
                "parallels", "bochs", "sandboxie", "wine",
            ]),
            analysis_service_domains: strings(&[
                "virustotal.com", "hybrid-analysis.com", "malwr.com",
                "anubis.iseclab.org", "joesandbox.com", "cuckoosandbox.org",
            ]),
            security_vendor_names: strings(&[
                "symantec", "mcafee", "kaspersky", "avast", "avg", "bitdefender",
                "eset", "f-secure", "trend", "sophos", "malwarebytes",
            ]),
            suspicious_query_tokens: strings(&["test", "scan", "probe", "check", "analyze"]),

            vendor_networks: strings(&[
                // Cloudflare
                "173.245.48.0/20", "103.21.244.0/22", "103.22.200.0/22",
                "103.31.4.0/22", "141.101.64.0/18", "108.162.192.0/18",
                // Google
                "8.8.8.0/24", "8.8.4.0/24", "64.233.160.0/19",
                // Microsoft
                "40.76.0.0/14", "40.112.0.0/13", "52.96.0.0/14",
                // Amazon AWS
                "52.95.0.0/16", "54.239.0.0/16", "52.119.0.0/16",
            ]),

            redirect_destinations: strings(&[
                "https://www.google.com",
                "https://www.microsoft.com",
                "https://www.github.com",
                "https://www.stackoverflow.com",
            ]),
        }
    }
}

impl EngineConfig {
    /// Load a config from a JSON file. Missing fields fall back to defaults.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
