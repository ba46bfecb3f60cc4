//! Ascending scan for the smallest portfolio that clears a confidence target.

use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Result, SizingError};

use super::estimator::MonteCarloEstimator;
use super::types::SizingResult;

/// Portfolio sizes scanned by the search: `min, min + step, ... <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchRange {
    pub min_assets: usize,
    pub max_assets: usize,
    pub step: usize,
}

impl Default for SearchRange {
    fn default() -> Self {
        Self {
            min_assets: 100,
            max_assets: 400,
            step: 10,
        }
    }
}

impl SearchRange {
    /// Candidate sizes in scan order.
    pub fn sizes(&self) -> impl Iterator<Item = usize> + use<> {
        (self.min_assets..=self.max_assets).step_by(self.step.max(1))
    }

    fn validate(&self) -> Result<()> {
        if self.min_assets == 0 {
            return Err(SizingError::EmptyPortfolio);
        }
        if self.step == 0 {
            return Err(SizingError::InvalidSearch("step must be > 0".into()));
        }
        if self.min_assets > self.max_assets {
            return Err(SizingError::InvalidSearch(format!(
                "min_assets ({}) must be <= max_assets ({})",
                self.min_assets, self.max_assets
            )));
        }
        Ok(())
    }
}

/// Result of a capacity search.
///
/// Exhausting the range is a normal outcome: the caller decides whether to
/// widen the range or relax the model.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// The first scanned size whose probability cleared the target.
    Found {
        sizing: SizingResult,
        /// Every candidate evaluated, in scan order, ending with `sizing`.
        scanned: Vec<SizingResult>,
    },
    /// No scanned size cleared the target.
    Exhausted {
        scanned: Vec<SizingResult>,
        /// Largest size that was scanned.
        max_size: usize,
    },
}

impl SearchOutcome {
    pub fn sizing(&self) -> Option<&SizingResult> {
        match self {
            Self::Found { sizing, .. } => Some(sizing),
            Self::Exhausted { .. } => None,
        }
    }

    pub fn scanned(&self) -> &[SizingResult] {
        match self {
            Self::Found { scanned, .. } | Self::Exhausted { scanned, .. } => scanned,
        }
    }
}

/// Scans increasing portfolio sizes until one clears the confidence target.
#[derive(Debug, Clone)]
pub struct CapacitySearch {
    estimator: MonteCarloEstimator,
    range: SearchRange,
    confidence_target: f64,
}

impl CapacitySearch {
    /// Creates a search over `range` with the given confidence target.
    ///
    /// # Errors
    ///
    /// Returns [`SizingError::EmptyPortfolio`] if the range starts at zero
    /// assets, or [`SizingError::InvalidSearch`] for a zero step, an
    /// inverted range, or a target outside `[0, 1]`.
    pub fn new(
        estimator: MonteCarloEstimator,
        range: SearchRange,
        confidence_target: f64,
    ) -> Result<Self> {
        range.validate()?;
        if !(0.0..=1.0).contains(&confidence_target) {
            return Err(SizingError::InvalidSearch(format!(
                "confidence target must be in [0, 1], got {confidence_target}"
            )));
        }
        Ok(Self {
            estimator,
            range,
            confidence_target,
        })
    }

    pub fn range(&self) -> SearchRange {
        self.range
    }

    pub fn confidence_target(&self) -> f64 {
        self.confidence_target
    }

    /// Runs the scan, drawing all randomness from `rng`.
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> SearchOutcome {
        let config = self.estimator.year().config();
        let mut scanned = Vec::new();

        info!(
            confidence_target = self.confidence_target,
            min = self.range.min_assets,
            max = self.range.max_assets,
            step = self.range.step,
            trials = self.estimator.trials(),
            "starting capacity search"
        );

        for n_assets in self.range.sizes() {
            let estimate = self.estimator.estimate(n_assets, rng);
            let candidate = SizingResult {
                n_assets,
                installed_capacity_kw: config.installed_capacity_kw(n_assets),
                oversizing_ratio: config.oversizing_ratio(n_assets),
                probability: estimate.probability,
            };
            info!(
                n_assets,
                capacity_mw = candidate.installed_capacity_kw / 1000.0,
                oversizing = candidate.oversizing_ratio,
                probability = candidate.probability,
                "evaluated candidate"
            );
            scanned.push(candidate);

            if candidate.probability >= self.confidence_target {
                info!(n_assets, "confidence target reached");
                return SearchOutcome::Found {
                    sizing: candidate,
                    scanned,
                };
            }
        }

        let max_size = scanned.last().map_or(self.range.min_assets, |c| c.n_assets);
        warn!(max_size, "confidence target not reached in scanned range");
        SearchOutcome::Exhausted { scanned, max_size }
    }
}
