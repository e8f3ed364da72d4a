//! Work executor seam.
//!
//! The driver decides *when* a unit of work runs; a [`WorkExecutor`]
//! decides *what* the work is. [`SimulatedExecutor`] stands in for the
//! content backend by sleeping for a random duration in a configured band.

use std::fmt;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;

use super::GenerationRequest;
use crate::config::GenerationConfig;

/// One awaited piece of work: a substep, or a step without substeps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    pub step_id: String,
    pub substep_id: Option<String>,
    pub title: String,
}

impl WorkUnit {
    pub fn step(step_id: &str, title: &str) -> Self {
        Self {
            step_id: step_id.to_string(),
            substep_id: None,
            title: title.to_string(),
        }
    }

    pub fn substep(step_id: &str, substep_id: &str, title: &str) -> Self {
        Self {
            step_id: step_id.to_string(),
            substep_id: Some(substep_id.to_string()),
            title: title.to_string(),
        }
    }
}

impl fmt::Display for WorkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.substep_id {
            Some(sub) => write!(f, "{}/{}", self.step_id, sub),
            None => f.write_str(&self.step_id),
        }
    }
}

#[async_trait]
pub trait WorkExecutor: Send + Sync {
    /// Perform `unit` for `request`. Returning an error fails the run.
    async fn execute(&self, request: &GenerationRequest, unit: &WorkUnit) -> Result<()>;
}

/// Inclusive range of milliseconds to wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayBand {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayBand {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub fn sample(&self) -> Duration {
        let (lo, hi) = if self.min_ms <= self.max_ms {
            (self.min_ms, self.max_ms)
        } else {
            (self.max_ms, self.min_ms)
        };
        if lo == hi {
            return Duration::from_millis(lo);
        }
        Duration::from_millis(rand::rng().random_range(lo..=hi))
    }
}

pub struct SimulatedExecutor {
    substep: DelayBand,
    step: DelayBand,
}

impl SimulatedExecutor {
    pub fn new(substep: DelayBand, step: DelayBand) -> Self {
        Self { substep, step }
    }

    pub fn from_config(config: &GenerationConfig) -> Self {
        Self::new(
            DelayBand::new(config.substep_min_ms, config.substep_max_ms),
            DelayBand::new(config.step_min_ms, config.step_max_ms),
        )
    }

    /// Completes every unit without waiting
    pub fn instant() -> Self {
        Self::new(DelayBand::new(0, 0), DelayBand::new(0, 0))
    }

    fn band_for(&self, unit: &WorkUnit) -> DelayBand {
        if unit.substep_id.is_some() {
            self.substep
        } else {
            self.step
        }
    }
}

#[async_trait]
impl WorkExecutor for SimulatedExecutor {
    async fn execute(&self, _request: &GenerationRequest, unit: &WorkUnit) -> Result<()> {
        let delay = self.band_for(unit).sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}

/// Pauses the driver takes between units, and the per-unit limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub step_gap: Duration,
    pub finish_delay: Duration,
    pub unit_timeout: Option<Duration>,
}

impl Pacing {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            step_gap: config.step_gap(),
            finish_delay: config.finish_delay(),
            unit_timeout: config.unit_timeout(),
        }
    }

    pub fn immediate() -> Self {
        Self {
            step_gap: Duration::ZERO,
            finish_delay: Duration::ZERO,
            unit_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_delay_band_stays_in_range() {
        let band = DelayBand::new(1500, 2500);
        for _ in 0..200 {
            let ms = band.sample().as_millis() as u64;
            assert!((1500..=2500).contains(&ms), "sampled {ms}");
        }
    }

    #[test]
    fn test_delay_band_tolerates_reversed_bounds() {
        let band = DelayBand::new(30, 10);
        for _ in 0..50 {
            let ms = band.sample().as_millis() as u64;
            assert!((10..=30).contains(&ms));
        }
        assert_eq!(DelayBand::new(7, 7).sample(), Duration::from_millis(7));
    }

    #[test]
    fn test_work_unit_display() {
        assert_eq!(
            WorkUnit::substep("analysis", "company-research", "Company research").to_string(),
            "analysis/company-research"
        );
        assert_eq!(WorkUnit::step("review", "Review").to_string(), "review");
    }

    #[test]
    fn test_executor_picks_band_by_unit_kind() {
        let config = Config::default();
        let executor = SimulatedExecutor::from_config(&config.generation);
        assert_eq!(
            executor.band_for(&WorkUnit::substep("a", "b", "")),
            DelayBand::new(1500, 2500)
        );
        assert_eq!(
            executor.band_for(&WorkUnit::step("a", "")),
            DelayBand::new(2000, 3000)
        );
    }

    #[test]
    fn test_pacing_from_default_config() {
        let pacing = Pacing::from_config(&Config::default().generation);
        assert_eq!(pacing.step_gap, Duration::from_millis(500));
        assert_eq!(pacing.finish_delay, Duration::from_millis(1000));
        assert_eq!(pacing.unit_timeout, None);
    }
}
