// palisade/src/events.rs
//
// Shared domain types flowing through palisade: the inbound request
// descriptor, per-analyzer findings, the composite assessment, and the
// block-list / stats records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_timestamp() -> DateTime<Utc> {
    Utc::now()
}

// ── Inbound request ───────────────────────────────────────────────────────────

/// One inbound request, as extracted by the HTTP boundary layer.
///
/// The boundary layer owns address extraction (including whether to trust
/// forwarding headers); palisade treats whatever it is handed as the origin.
/// Constructed per request, evaluated once, discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestDescriptor {
    /// Origin address in string form. May be empty or `"unknown"`.
    #[serde(default)]
    pub origin: String,

    /// Raw user-agent string. May be empty.
    #[serde(default)]
    pub user_agent: String,

    /// Referrer URL string. May be empty or `"unknown"`.
    #[serde(default)]
    pub referrer: String,

    /// Header map. Keys are matched case-insensitively via [`Self::header`].
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Country code from the external geo-IP collaborator, if any.
    #[serde(default)]
    pub country: Option<String>,

    /// Transport timestamp — used by the replay driver for pacing only.
    /// Evaluation time is supplied separately (`RiskEngine::evaluate_at`).
    #[serde(default = "default_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl RequestDescriptor {
    /// Find a specific header value (case-insensitive key match).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }
}

impl Default for RequestDescriptor {
    fn default() -> Self {
        Self {
            origin: String::new(),
            user_agent: String::new(),
            referrer: String::new(),
            headers: HashMap::new(),
            country: None,
            timestamp: Utc::now(),
        }
    }
}

// ── Analyzer findings ─────────────────────────────────────────────────────────

/// Which evidence dimension produced a finding. Also fixes the order in which
/// reasons are concatenated into the final assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    Ip,
    UserAgent,
    Referrer,
    Timing,
    Geo,
    Sandbox,
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ip => write!(f, "ip"),
            Self::UserAgent => write!(f, "user_agent"),
            Self::Referrer => write!(f, "referrer"),
            Self::Timing => write!(f, "timing"),
            Self::Geo => write!(f, "geo"),
            Self::Sandbox => write!(f, "sandbox"),
        }
    }
}

/// What one analyzer concluded about one request: a non-negative risk
/// contribution plus the reasons behind it. Purely a return value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalFinding {
    pub kind: SignalKind,
    pub score: u32,
    pub reasons: Vec<String>,
}

impl SignalFinding {
    pub fn new(kind: SignalKind) -> Self {
        Self { kind, score: 0, reasons: Vec::new() }
    }

    /// Record one triggered rule: add its contribution and its reason.
    pub fn hit(&mut self, points: u32, reason: impl Into<String>) {
        self.score += points;
        self.reasons.push(reason.into());
    }

    pub fn is_clear(&self) -> bool {
        self.score == 0
    }
}

// ── Assessment ────────────────────────────────────────────────────────────────

/// Named score range used to select a masking response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskBand {
    Low,      // < 30 — serve the real response
    Moderate, // 30–39 — neutral landing page
    Elevated, // 40–49 — redirect page
    High,     // 50–69 — maintenance page
    Critical, // >= 70 — not-found page
}

impl RiskBand {
    /// Band boundaries run against the uncapped score sum.
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=29 => Self::Low,
            30..=39 => Self::Moderate,
            40..=49 => Self::Elevated,
            50..=69 => Self::High,
            _ => Self::Critical,
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::Elevated => write!(f, "ELEVATED"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// The composite risk assessment for one request.
///
/// Invariant: `allowed == (risk_score < 50)`. The score is the uncapped sum
/// of all analyzer contributions; reasons are concatenated in analyzer order
/// (ip, user-agent, referrer, timing, geo, sandbox).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub allowed: bool,
    pub risk_score: u32,
    pub reasons: Vec<String>,
    /// Advisory only — never feeds back into `allowed`.
    pub recommendations: Vec<String>,
    /// 16 hex characters, stable across restarts for the same client profile.
    pub fingerprint: String,
}

impl RiskAssessment {
    pub fn band(&self) -> RiskBand {
        RiskBand::from_score(self.risk_score)
    }
}

// ── Block list ────────────────────────────────────────────────────────────────

/// One explicit block-list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEntry {
    pub origin: String,
    pub reason: String,
    pub blocked_at: DateTime<Utc>,
}

// ── Stats ─────────────────────────────────────────────────────────────────────

/// Point-in-time snapshot of engine state, for operators.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    /// Requests observed by the rate tracker since engine construction.
    pub total_observed: u64,
    /// Origins with a rate window currently held in memory.
    pub tracked_origins: usize,
    /// Total timestamps currently held across all windows.
    pub tracked_timestamps: usize,
    /// Origins with at least one timestamp still inside the window.
    pub active_origins: usize,
    pub blocked_origins: usize,
    pub request_ceiling: usize,
    pub window_minutes: i64,
}
