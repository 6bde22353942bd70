//! Weighted composite priority score and category banding.

use serde::Serialize;

use crate::cluster::PriorityCategory;
use crate::config::{ConfigError, Thresholds, Weights};

/// The five normalized sub-scores of one cluster, each in `[0, 10]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SubScores {
    pub population: f64,
    pub access_gap: f64,
    pub economic: f64,
    pub social_need: f64,
    pub grid_proximity: f64,
}

/// Combines sub-scores with validated weights.
///
/// Construction fails unless the weights sum to 1.0 and the category
/// thresholds are ordered, so a scorer in hand always yields scores in
/// `[0, 10]`.
#[derive(Debug, Clone)]
pub struct CompositeScorer {
    weights: Weights,
    thresholds: Thresholds,
}

impl CompositeScorer {
    /// # Errors
    ///
    /// Returns a `ConfigError` if the weights do not sum to 1.0 or if
    /// `thresholds.medium > thresholds.high`.
    pub fn new(weights: Weights, thresholds: Thresholds) -> Result<Self, ConfigError> {
        weights.check()?;
        thresholds.check()?;
        Ok(Self {
            weights,
            thresholds,
        })
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Weighted sum of the sub-scores, clamped to `[0, 10]`.
    pub fn composite(&self, s: &SubScores) -> f64 {
        let w = &self.weights;
        let score = w.population * s.population
            + w.access_gap * s.access_gap
            + w.economic * s.economic
            + w.social_need * s.social_need
            + w.grid_proximity * s.grid_proximity;
        score.clamp(0.0, 10.0)
    }

    /// Category for a composite score. Boundaries are inclusive upward.
    pub fn categorize(&self, score: f64) -> PriorityCategory {
        if score >= self.thresholds.high {
            PriorityCategory::High
        } else if score >= self.thresholds.medium {
            PriorityCategory::Medium
        } else {
            PriorityCategory::Low
        }
    }

    /// Composite score and its category.
    pub fn score(&self, s: &SubScores) -> (f64, PriorityCategory) {
        let score = self.composite(s);
        (score, self.categorize(score))
    }
}

/// Social-need proxy for clusters without survey data.
///
/// Peaks at `peak` and decays exponentially with distance from it, so
/// mid-sized settlements are favored over both hamlets and towns.
pub fn social_need_fallback(population_index: f64, peak: f64) -> f64 {
    (-(population_index - peak).abs()).exp()
}
