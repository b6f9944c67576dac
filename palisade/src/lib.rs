// palisade/src/lib.rs
//
// palisade — request-risk scoring for inbound HTTP traffic.
//
// One `RiskEngine` per policy. Feed it `RequestDescriptor`s extracted at the
// HTTP boundary; it returns a `RiskAssessment` (uncapped additive score,
// ordered reasons, advisory recommendations, stable fingerprint) and can map
// the assessment plus the real response body to what actually goes out
// (allow, or a masking page by risk band).
//
// Evaluation is synchronous and CPU-bound and safe to call from many tasks
// concurrently: the only shared mutable state is the per-origin rate window
// and the block list, both sharded per key.

pub mod analyzers;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod fingerprint;
pub mod state;

pub use config::EngineConfig;
pub use engine::RiskEngine;
pub use error::EngineError;
pub use events::{
    BlockEntry, EngineStats, RequestDescriptor, RiskAssessment, RiskBand, SignalFinding,
    SignalKind,
};
pub use fingerprint::fingerprint;
