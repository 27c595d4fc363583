pub mod collectors;
pub mod config;
pub mod engine;
pub mod errors;
pub mod lifecycle;
pub mod model;
pub mod providers;
pub mod ranking;
pub mod report;
pub mod stats;
