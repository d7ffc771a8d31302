// =============================================================================
// Chart Pattern Detection Module
// =============================================================================
//
// Price-geometry detectors: perceptually important points, flag/pennant
// consolidations, overnight gaps, and dynamic regression channels. All
// detectors are pure functions over a close (or bar) series.

pub mod channel;
pub mod flags;
pub mod gaps;
pub mod pips;

pub use channel::{find_dynamic_channel, Channel, ChannelParams};
pub use flags::{find_flags_pennants, FlagBuckets, FlagPattern};
pub use gaps::{find_gaps, recent_gaps, Gap};
pub use pips::{find_pips, DistanceMeasure};
