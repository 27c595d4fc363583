use std::fmt;

/// Errors raised by the aggregation engine.
///
/// Both variants are contract violations by the caller: they are surfaced
/// immediately and never recovered internally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    /// A value outside the accepted domain (negative sample, percentile outside 0..=100)
    InvalidArgument(String),
    /// An operation that the current lifecycle phase does not permit
    InvalidState(String),
}

impl StatsError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        StatsError::InvalidArgument(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        StatsError::InvalidState(msg.into())
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, StatsError::InvalidArgument(_))
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, StatsError::InvalidState(_))
    }
}

impl fmt::Display for StatsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatsError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            StatsError::InvalidState(msg) => write!(f, "invalid state: {msg}"),
        }
    }
}

impl std::error::Error for StatsError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(pub String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = StatsError::invalid_state("percentiles are not available until end()");
        assert_eq!(
            e.to_string(),
            "invalid state: percentiles are not available until end()"
        );
        assert!(e.is_invalid_state());
        assert!(!e.is_invalid_argument());

        let c = ConfigError("unsupported config version 3".into());
        assert_eq!(c.to_string(), "config error: unsupported config version 3");
    }

    #[test]
    fn test_converts_into_anyhow() {
        fn fails() -> anyhow::Result<()> {
            Err(StatsError::invalid_argument("sample cannot be negative"))?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert!(err.to_string().contains("sample cannot be negative"));
        assert!(err.downcast_ref::<StatsError>().is_some());
    }
}
