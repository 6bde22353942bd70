//! Multi-criteria priority scoring and solution recommendation.
//!
//! [`PriorityScorer::score_all`] normalizes each raw indicator across the
//! whole collection, combines the five sub-scores into a weighted composite,
//! bands it into a [`PriorityCategory`], and attaches a recommended solution
//! with an indicative cost. Scoring is a pure function of the input
//! collection and the configuration.

pub mod composite;
pub mod normalize;
pub mod recommend;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::cluster::{ClusterRecord, PriorityCategory, Solution};
use crate::config::{ConfigError, ScoringConfig, Weights};
use crate::scenario::cost::CostModel;

pub use composite::{CompositeScorer, SubScores, social_need_fallback};
pub use normalize::normalize;
pub use recommend::{RecommendationClassifier, road_score};

/// A cluster with its scores, category, recommendation, and cost estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCluster {
    pub cluster: ClusterRecord,
    pub scores: SubScores,
    /// Composite score in `[0, 10]`, unrounded.
    pub priority_score: f64,
    pub priority_category: PriorityCategory,
    pub recommended_solution: Solution,
    /// Indicative capital cost of the recommended solution (USD).
    pub estimated_cost_usd: f64,
    pub cost_per_person_usd: f64,
}

impl ScoredCluster {
    pub fn cluster_id(&self) -> i64 {
        self.cluster.cluster_id
    }
}

/// Provenance recorded alongside every scored collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringMetadata {
    pub weights: Weights,
    pub generated_at: DateTime<Utc>,
}

/// Output of one scoring pass, in input order.
#[derive(Debug, Clone)]
pub struct ScoringRun {
    pub clusters: Vec<ScoredCluster>,
    pub metadata: ScoringMetadata,
}

impl ScoringRun {
    /// Number of clusters in each priority category as `(high, medium, low)`.
    pub fn category_counts(&self) -> (usize, usize, usize) {
        self.clusters
            .iter()
            .fold((0, 0, 0), |(h, m, l), c| match c.priority_category {
                PriorityCategory::High => (h + 1, m, l),
                PriorityCategory::Medium => (h, m + 1, l),
                PriorityCategory::Low => (h, m, l + 1),
            })
    }
}

/// Scores a cluster collection.
#[derive(Debug, Clone)]
pub struct PriorityScorer {
    composite: CompositeScorer,
    classifier: RecommendationClassifier,
    social_fallback_peak: f64,
    cost: CostModel,
}

impl PriorityScorer {
    /// # Errors
    ///
    /// Returns a `ConfigError` if the weights or thresholds are invalid.
    pub fn new(config: &ScoringConfig, cost: CostModel) -> Result<Self, ConfigError> {
        Ok(Self {
            composite: CompositeScorer::new(config.weights, config.thresholds)?,
            classifier: RecommendationClassifier::new(config.recommendation),
            social_fallback_peak: config.social_fallback.peak_population_index,
            cost,
        })
    }

    /// Scores every cluster, stamping the run with the current time.
    pub fn score_all(&self, clusters: &[ClusterRecord]) -> ScoringRun {
        self.score_all_at(clusters, Utc::now())
    }

    /// Scores every cluster with an explicit generation timestamp.
    ///
    /// Output order matches input order. Raw indicators are normalized across
    /// the whole collection, so a cluster's sub-scores depend on its peers.
    pub fn score_all_at(&self, clusters: &[ClusterRecord], generated_at: DateTime<Utc>) -> ScoringRun {
        let column = |f: fn(&ClusterRecord) -> f64| clusters.iter().map(f).collect::<Vec<_>>();

        let population = normalize(&column(|c| c.indicators.population_index), false);
        let access_gap = normalize(&column(|c| c.indicators.grid_access), true);
        let economic = normalize(&column(|c| c.indicators.road_density), false);
        let peak = self.social_fallback_peak;
        let social_raw: Vec<f64> = clusters
            .iter()
            .map(|c| {
                let raw = c.indicators.social_need;
                if raw > 0.0 {
                    raw
                } else {
                    social_need_fallback(c.indicators.population_index, peak)
                }
            })
            .collect();
        let social_need = normalize(&social_raw, false);
        let grid_proximity = normalize(&column(|c| c.indicators.distance_to_power_km), true);

        let scored: Vec<ScoredCluster> = clusters
            .iter()
            .enumerate()
            .map(|(i, cluster)| {
                let scores = SubScores {
                    population: population[i],
                    access_gap: access_gap[i],
                    economic: economic[i],
                    social_need: social_need[i],
                    grid_proximity: grid_proximity[i],
                };
                let (priority_score, priority_category) = self.composite.score(&scores);
                let distance = cluster.indicators.distance_to_power_km;
                let recommended_solution = self.classifier.recommend(
                    distance,
                    cluster.indicators.population_index,
                    road_score(scores.economic),
                );
                let estimated_cost_usd =
                    self.cost
                        .cost(recommended_solution, cluster.estimated_population, distance);
                ScoredCluster {
                    cluster: cluster.clone(),
                    scores,
                    priority_score,
                    priority_category,
                    recommended_solution,
                    estimated_cost_usd,
                    cost_per_person_usd: CostModel::cost_per_person(
                        estimated_cost_usd,
                        cluster.estimated_population,
                    ),
                }
            })
            .collect();

        debug!(clusters = scored.len(), "scored cluster collection");

        ScoringRun {
            clusters: scored,
            metadata: ScoringMetadata {
                weights: *self.composite.weights(),
                generated_at,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{ElectrificationStatus, Indicators};
    use serde_json::Map;

    fn record(id: i64, indicators: Indicators) -> ClusterRecord {
        ClusterRecord {
            cluster_id: id,
            geometry: None,
            indicators,
            estimated_population: indicators.population_index * 5000.0,
            electrification_status: ElectrificationStatus::Unelectrified,
            energy_need_score: 0.0,
            building_density: 0.0,
            properties: Map::new(),
        }
    }

    fn scorer() -> PriorityScorer {
        PriorityScorer::new(&ScoringConfig::default(), CostModel::default())
            .expect("defaults are valid")
    }

    #[test]
    fn empty_collection_scores_nothing() {
        let run = scorer().score_all(&[]);
        assert!(run.clusters.is_empty());
        assert_eq!(run.category_counts(), (0, 0, 0));
    }

    #[test]
    fn identical_clusters_score_midpoint() {
        let ind = Indicators {
            population_index: 0.5,
            grid_access: 0.2,
            road_density: 3.0,
            social_need: 0.7,
            distance_to_power_km: 12.0,
        };
        let run = scorer().score_all(&[record(1, ind), record(2, ind)]);
        for c in &run.clusters {
            assert!((c.priority_score - 5.0).abs() < 1e-9);
            assert_eq!(c.priority_category, PriorityCategory::Medium);
        }
    }

    #[test]
    fn better_cluster_ranks_higher() {
        let strong = Indicators {
            population_index: 0.9,
            grid_access: 0.0,
            road_density: 20.0,
            social_need: 1.0,
            distance_to_power_km: 1.0,
        };
        let weak = Indicators {
            population_index: 0.1,
            grid_access: 1.0,
            road_density: 0.0,
            social_need: 0.1,
            distance_to_power_km: 40.0,
        };
        let run = scorer().score_all(&[record(1, strong), record(2, weak)]);
        assert!((run.clusters[0].priority_score - 10.0).abs() < 1e-9);
        assert!(run.clusters[1].priority_score.abs() < 1e-9);
        assert_eq!(run.clusters[0].priority_category, PriorityCategory::High);
        assert_eq!(run.clusters[1].priority_category, PriorityCategory::Low);
        assert_eq!(run.clusters[0].recommended_solution, Solution::GridExtension);
        assert_eq!(run.clusters[1].recommended_solution, Solution::StandaloneSolar);
        assert_eq!(run.category_counts(), (1, 0, 1));
    }

    #[test]
    fn output_preserves_input_order_and_ids() {
        let ind = Indicators::default();
        let run = scorer().score_all(&[record(30, ind), record(10, ind), record(20, ind)]);
        let ids: Vec<i64> = run.clusters.iter().map(ScoredCluster::cluster_id).collect();
        assert_eq!(ids, vec![30, 10, 20]);
    }

    #[test]
    fn missing_survey_uses_fallback() {
        let near_peak = Indicators {
            population_index: 0.4,
            ..Indicators::default()
        };
        let far = Indicators {
            population_index: 1.0,
            ..Indicators::default()
        };
        let run = scorer().score_all(&[record(1, near_peak), record(2, far)]);
        assert!(run.clusters[0].scores.social_need > run.clusters[1].scores.social_need);
    }

    #[test]
    fn metadata_records_weights() {
        let ts = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_default();
        let run = scorer().score_all_at(&[], ts);
        assert_eq!(run.metadata.weights, Weights::default());
        assert_eq!(run.metadata.generated_at, ts);
    }
}
