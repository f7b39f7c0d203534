//! Feature discovery.
//!
//! Runs the enabled detectors behind a fault-isolation boundary and
//! aggregates their features into the label set for one cycle.

pub mod aggregator;
pub mod isolation;
pub mod whitelist;

pub use aggregator::{build_labels, Discovery};
pub use whitelist::LabelWhitelist;
