//! start / collect / end state machine shared by every collector.

use crate::errors::StatsError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Constructed, `start()` not yet called
    #[default]
    Fresh,
    Collecting,
    /// `end()` has frozen the derived views; only queries are allowed
    Finalized,
}

impl Phase {
    /// `start()` is a reset and is accepted from every phase.
    pub fn start(&mut self) {
        *self = Phase::Collecting;
    }

    pub fn ensure_collecting(&self, what: &str) -> Result<(), StatsError> {
        match self {
            Phase::Collecting => Ok(()),
            Phase::Fresh => Err(StatsError::invalid_state(format!(
                "cannot {what} before start()"
            ))),
            Phase::Finalized => Err(StatsError::invalid_state(format!(
                "cannot {what} after end()"
            ))),
        }
    }

    pub fn ensure_finalized(&self, what: &str) -> Result<(), StatsError> {
        if *self == Phase::Finalized {
            Ok(())
        } else {
            Err(StatsError::invalid_state(format!(
                "cannot calculate {what} until all stats are collected"
            )))
        }
    }

    /// Returns `Ok(true)` when the caller must finalize, `Ok(false)` when already finalized.
    pub fn end(&mut self) -> Result<bool, StatsError> {
        match self {
            Phase::Fresh => Err(StatsError::invalid_state("cannot end() before start()")),
            Phase::Collecting => {
                *self = Phase::Finalized;
                Ok(true)
            }
            Phase::Finalized => Ok(false),
        }
    }
}
