//! Sample distributions

pub mod numeric;

pub use numeric::NumericStatsCollector;
