pub mod blocklist;
pub mod window;

pub use blocklist::BlockList;
pub use window::{RateTracker, WindowSnapshot};
