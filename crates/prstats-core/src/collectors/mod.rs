//! Record aggregators: global counters plus per-user fan-out

pub mod grouping;
pub mod record;
pub mod user;

pub use grouping::{GroupingAggregator, GroupingOptions};
pub use record::RecordAggregator;
pub use user::{GroupBy, UserAggregate};
