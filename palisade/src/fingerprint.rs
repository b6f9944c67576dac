// palisade/src/fingerprint.rs
//
// Stable request fingerprint: SHA-256 over a canonical key-sorted JSON
// rendering of the four profile fields, truncated to 16 hex characters.
// No randomness and no time component, so the same client profile maps to
// the same fingerprint across requests and process restarts — correlation
// without a session store. Collisions are statistically acceptable.

use serde_json::json;
use sha2::{Digest, Sha256};

use crate::events::RequestDescriptor;

/// Derive the fingerprint for one request.
///
/// Inputs are exactly: origin address, user-agent, `Accept-Language`, and
/// `Accept-Encoding`. Missing fields serialize as the empty string.
pub fn fingerprint(descriptor: &RequestDescriptor) -> String {
    // serde_json's Map is a BTreeMap, so keys serialize sorted.
    let canonical = json!({
        "origin": descriptor.origin,
        "user_agent": descriptor.user_agent,
        "accept_language": descriptor.header("accept-language").unwrap_or(""),
        "accept_encoding": descriptor.header("accept-encoding").unwrap_or(""),
    });

    let mut h = Sha256::new();
    h.update(canonical.to_string().as_bytes());
    hex::encode(&h.finalize()[..8])
}
