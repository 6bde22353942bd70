//! Rule-based solution recommendation.

use crate::cluster::Solution;
use crate::config::RecommendationRules;

/// Applies ordered rules; the first matching rule wins.
#[derive(Debug, Clone)]
pub struct RecommendationClassifier {
    rules: RecommendationRules,
}

impl RecommendationClassifier {
    pub fn new(rules: RecommendationRules) -> Self {
        Self { rules }
    }

    /// Recommends a solution for one cluster.
    ///
    /// # Arguments
    ///
    /// * `distance_km` - Distance to power infrastructure
    /// * `population_index` - Population index in `[0, 1]`
    /// * `road_score` - Road-access score in `[0, 1]`
    ///
    /// # Returns
    ///
    /// Grid extension for close, dense settlements; a hybrid mini-grid for
    /// mid-range ones with road access; standalone solar for remote, sparse
    /// ones; and a solar mini-grid otherwise. The grid and hybrid rules use
    /// inclusive bounds, the standalone rule strict ones.
    pub fn recommend(&self, distance_km: f64, population_index: f64, road_score: f64) -> Solution {
        let r = &self.rules;
        if distance_km <= r.grid_max_distance_km && population_index >= r.grid_min_population_index
        {
            Solution::GridExtension
        } else if distance_km <= r.hybrid_max_distance_km
            && population_index >= r.hybrid_min_population_index
            && road_score >= r.hybrid_min_road_score
        {
            Solution::MiniGridHybrid
        } else if distance_km > r.standalone_min_distance_km
            && population_index < r.standalone_max_population_index
        {
            Solution::StandaloneSolar
        } else {
            Solution::MiniGridSolar
        }
    }
}

/// Maps a 0–10 economic sub-score onto the `[0, 1]` road-access scale.
pub fn road_score(economic_score: f64) -> f64 {
    (economic_score / 10.0).clamp(0.0, 1.0)
}
