//! Weighting and consensus
//!
//! - [`weighting`] - per-ticker strategy weights from an ordered rule table
//! - [`aggregator`] - combines weighted strategy values into one fair value
//! - [`stats`] - median and percentile helpers

pub mod aggregator;
pub mod stats;
pub mod weighting;

pub use aggregator::{Aggregator, ConsensusEngine, ConsensusOutcome};
pub use weighting::{CategorySplit, Rule, WeightInputs, WeightingEngine, WeightingPolicy};
