// palisade/src/analyzers/ip.rs
//
// Address evidence. Rules are additive and independently triggered; the only
// short-circuits are the missing-address and malformed-address cases, which
// terminate further address-specific checks.
//
// The over-ceiling rule reads the tracker count as of the key's previous
// evaluation (this analyzer runs before the timing analyzer appends the
// current request), matching the reference evaluation order.

use std::net::IpAddr;

use crate::error::{EngineError, Result};
use crate::events::{SignalFinding, SignalKind};
use crate::state::{BlockList, RateTracker};

/// One parsed CIDR range. IPv4 and IPv6; an address of the other family
/// never matches.
#[derive(Debug, Clone)]
pub struct Cidr {
    net: IpAddr,
    prefix: u8,
    text: String,
}

impl Cidr {
    pub fn parse(s: &str) -> Result<Self> {
        let (addr, len) = s
            .split_once('/')
            .ok_or_else(|| EngineError::Config(format!("CIDR missing prefix length: {s}")))?;
        let net: IpAddr = addr
            .parse()
            .map_err(|_| EngineError::Config(format!("invalid CIDR network address: {s}")))?;
        let prefix: u8 = len
            .parse()
            .map_err(|_| EngineError::Config(format!("invalid CIDR prefix length: {s}")))?;
        let max = match net {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        if prefix > max {
            return Err(EngineError::Config(format!("CIDR prefix out of range: {s}")));
        }
        Ok(Self { net, prefix, text: s.to_string() })
    }

    pub fn contains(&self, addr: IpAddr) -> bool {
        match (self.net, addr) {
            (IpAddr::V4(net), IpAddr::V4(a)) => {
                let mask = if self.prefix == 0 { 0 } else { u32::MAX << (32 - self.prefix) };
                (u32::from(a) & mask) == (u32::from(net) & mask)
            }
            (IpAddr::V6(net), IpAddr::V6(a)) => {
                let mask = if self.prefix == 0 { 0 } else { u128::MAX << (128 - self.prefix) };
                (u128::from(a) & mask) == (u128::from(net) & mask)
            }
            _ => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Compiled address rules: parsed vendor ranges plus the request ceiling.
pub struct IpRules {
    vendor_networks: Vec<Cidr>,
    request_ceiling: usize,
}

impl IpRules {
    pub fn compile(cfg: &crate::config::EngineConfig) -> Result<Self> {
        let vendor_networks = cfg
            .vendor_networks
            .iter()
            .map(|s| Cidr::parse(s))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { vendor_networks, request_ceiling: cfg.max_requests_per_origin })
    }
}

pub fn analyze(
    origin: &str,
    rules: &IpRules,
    blocklist: &BlockList,
    tracker: &RateTracker,
) -> SignalFinding {
    let mut finding = SignalFinding::new(SignalKind::Ip);

    if origin.is_empty() || origin == "unknown" {
        finding.hit(20, "origin address unknown or missing");
        return finding;
    }

    let addr: IpAddr = match origin.parse() {
        Ok(a) => a,
        Err(_) => {
            finding.hit(50, "invalid address format");
            return finding;
        }
    };

    if is_private(addr) {
        finding.hit(30, "private address space");
    }
    if addr.is_loopback() {
        finding.hit(40, "loopback address");
    }

    // First matching range only.
    if let Some(range) = rules.vendor_networks.iter().find(|c| c.contains(addr)) {
        finding.hit(60, format!("address inside security vendor range {}", range.as_str()));
    }

    if blocklist.is_blocked(origin) {
        finding.hit(80, "origin is on the block list");
    }

    let tracked = tracker.count(origin);
    if tracked > rules.request_ceiling {
        finding.hit(40, format!("request volume above ceiling: {tracked} tracked"));
    }

    finding
}

fn is_private(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => v4.is_private(),
        // fc00::/7 unique-local
        IpAddr::V6(v6) => (v6.segments()[0] & 0xfe00) == 0xfc00,
    }
}
