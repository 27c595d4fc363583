use crate::errors::StatsError;
use crate::lifecycle::Phase;
use std::collections::BTreeMap;

/// Streaming collector for non-negative integer samples (day counts).
///
/// `collect` only appends and bumps a frequency entry. The sorted view used
/// for percentiles is built once in `end()`, after which the collector only
/// answers queries until it is restarted.
#[derive(Debug, Clone, Default)]
pub struct NumericStatsCollector {
    phase: Phase,
    samples: Vec<u64>,
    // value -> occurrences, ordered by value
    frequencies: BTreeMap<u64, u64>,
    sum: u128,
    sum_of_logs: f64,
    sorted: Vec<u64>,
}

impl NumericStatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.samples.clear();
        self.frequencies.clear();
        self.sum = 0;
        self.sum_of_logs = 0.0;
        self.sorted.clear();
        self.phase.start();
    }

    pub fn collect(&mut self, sample: i64) -> Result<(), StatsError> {
        self.phase.ensure_collecting("collect a sample")?;
        let value = u64::try_from(sample).map_err(|_| {
            StatsError::invalid_argument(format!("sample cannot be negative (got {sample})"))
        })?;
        self.push(value);
        Ok(())
    }

    fn push(&mut self, value: u64) {
        self.samples.push(value);
        *self.frequencies.entry(value).or_default() += 1;
        self.sum += u128::from(value);
        self.sum_of_logs += (value as f64).ln();
    }

    pub fn end(&mut self) -> Result<(), StatsError> {
        if self.phase.end()? {
            let mut sorted = self.samples.clone();
            sorted.sort_unstable();
            self.sorted = sorted;
        }
        Ok(())
    }

    /// Folds another collector's samples into this one.
    pub fn merge(&mut self, other: &NumericStatsCollector) -> Result<(), StatsError> {
        self.phase.ensure_collecting("merge samples")?;
        for &v in &other.samples {
            self.push(v);
        }
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn count(&self) -> u64 {
        self.samples.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples in insertion order.
    pub fn samples(&self) -> &[u64] {
        &self.samples
    }

    /// Occurrences of exactly `value`.
    pub fn frequency(&self, value: u64) -> u64 {
        self.frequencies.get(&value).copied().unwrap_or(0)
    }

    pub fn min(&self) -> Option<u64> {
        self.frequencies.keys().next().copied()
    }

    pub fn max(&self) -> Option<u64> {
        self.frequencies.keys().next_back().copied()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.sum as f64 / self.samples.len() as f64)
    }

    /// `exp(mean(ln x))`; a single zero sample pulls the result to 0.
    pub fn geometric_mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some((self.sum_of_logs / self.samples.len() as f64).exp())
    }

    /// Every value sharing the highest frequency, ascending.
    pub fn modes(&self) -> Result<Vec<u64>, StatsError> {
        self.phase.ensure_finalized("modes")?;
        let Some(&top) = self.frequencies.values().max() else {
            return Ok(Vec::new());
        };
        Ok(self
            .frequencies
            .iter()
            .filter(|&(_, &c)| c == top)
            .map(|(&v, _)| v)
            .collect())
    }

    /// Percentile estimate for `p` in `[0, 100]`.
    ///
    /// Uses position `p * (n + 1) / 100` over the sorted samples, clamped to
    /// the extremes and linearly interpolated between neighbours, so `p = 0`
    /// is the minimum, `p = 100` the maximum and `p = 50` the median.
    pub fn percentile(&self, p: f64) -> Result<f64, StatsError> {
        if !(0.0..=100.0).contains(&p) {
            return Err(StatsError::invalid_argument(format!(
                "percentile must be within [0, 100] (got {p})"
            )));
        }
        self.phase.ensure_finalized("percentiles")?;

        let sorted = &self.sorted;
        let n = sorted.len();
        match n {
            0 => Err(StatsError::invalid_state(
                "cannot calculate percentiles of an empty collector",
            )),
            1 => Ok(sorted[0] as f64),
            _ => {
                let pos = p * (n as f64 + 1.0) / 100.0;
                if pos < 1.0 {
                    return Ok(sorted[0] as f64);
                }
                if pos >= n as f64 {
                    return Ok(sorted[n - 1] as f64);
                }
                let floor = pos.floor();
                let idx = floor as usize;
                let lower = sorted[idx - 1] as f64;
                let upper = sorted[idx] as f64;
                Ok(lower + (pos - floor) * (upper - lower))
            }
        }
    }

    /// Number of samples `<= value`.
    pub fn cumulative_frequency(&self, value: u64) -> Result<u64, StatsError> {
        self.phase.ensure_finalized("cumulative frequencies")?;
        Ok(self.frequencies.range(..=value).map(|(_, &c)| c).sum())
    }

    /// Fraction in `[0, 1]` of samples `<= value`.
    pub fn cumulative_percentage(&self, value: u64) -> Result<f64, StatsError> {
        let cum = self.cumulative_frequency(value)?;
        if self.samples.is_empty() {
            return Err(StatsError::invalid_state(
                "cannot calculate cumulative percentages of an empty collector",
            ));
        }
        Ok(cum as f64 / self.samples.len() as f64)
    }
}
