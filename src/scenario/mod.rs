//! Intervention scenarios evaluated against a shared baseline snapshot.
//!
//! A [`Snapshot`] joins scored clusters with their demand records once per
//! run. Each scenario clones the snapshot's cluster states, applies its
//! interventions and growth, and reports a [`ScenarioResult`]. The snapshot
//! itself is never mutated, so scenarios can be evaluated in any order or in
//! parallel.

pub mod compare;
pub mod cost;
pub mod simulator;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cluster::{ElectrificationStatus, Solution};
use crate::demand::DemandRecord;
use crate::error::{Error, Result};
use crate::scoring::ScoredCluster;

pub use compare::{compare, compare_outcomes};
pub use cost::CostModel;
pub use simulator::ScenarioSimulator;

/// Order in which grid-extension candidates are served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GridTarget {
    /// Highest priority score first.
    #[default]
    TopPriority,
    /// Shortest distance to existing power infrastructure first.
    NearestGrid,
    /// Snapshot order.
    InputOrder,
}

/// A named intervention budget with background growth assumptions.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Number of clusters receiving a grid extension.
    #[serde(default)]
    pub grid_count: usize,
    /// How grid-extension candidates are ranked.
    #[serde(default)]
    pub grid_target: GridTarget,
    /// Number of clusters receiving a mini-grid.
    #[serde(default)]
    pub mini_grid_count: usize,
    /// Background population growth as a fraction (0.10 = 10 %).
    #[serde(default)]
    pub population_growth: f64,
    /// Background demand growth as a fraction.
    #[serde(default)]
    pub demand_growth: f64,
    /// Solar capacity (MW) spread evenly over every cluster.
    #[serde(default)]
    pub solar_capacity_mw: f64,
}

impl ScenarioConfig {
    pub fn new(name: impl Into<String>, grid_count: usize, mini_grid_count: usize) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            grid_count,
            grid_target: GridTarget::default(),
            mini_grid_count,
            population_growth: 0.0,
            demand_growth: 0.0,
            solar_capacity_mw: 0.0,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_growth(mut self, population_growth: f64, demand_growth: f64) -> Self {
        self.population_growth = population_growth;
        self.demand_growth = demand_growth;
        self
    }

    pub fn with_grid_target(mut self, grid_target: GridTarget) -> Self {
        self.grid_target = grid_target;
        self
    }

    pub fn with_solar_capacity(mut self, solar_capacity_mw: f64) -> Self {
        self.solar_capacity_mw = solar_capacity_mw;
        self
    }

    /// The scenario set compared when no configuration overrides it.
    pub fn predefined() -> Vec<Self> {
        vec![
            Self::new("Business As Usual", 0, 0)
                .with_description("No interventions; background growth only")
                .with_growth(0.10, 0.20),
            Self::new("Grid Expansion", 10, 0)
                .with_description("Extend the grid to the 10 highest-priority clusters"),
            Self::new("Mini-Grid Rollout", 0, 20)
                .with_description("Deploy mini-grids in the 20 most populous unserved clusters"),
            Self::new("Hybrid Strategy", 10, 20)
                .with_description("Grid extension plus mini-grid deployment"),
            Self::new("Rapid Growth", 10, 20)
                .with_description("Hybrid strategy under accelerated population and demand growth")
                .with_growth(0.10, 0.20),
        ]
    }

    /// File-name-safe form of the scenario name.
    pub fn slug(&self) -> String {
        let slug: String = self
            .name
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect();
        if slug.is_empty() { "scenario".to_string() } else { slug }
    }
}

/// The per-cluster fields a scenario reads and rewrites.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterState {
    pub cluster_id: i64,
    pub priority_score: f64,
    pub estimated_population: f64,
    pub distance_to_power_km: f64,
    pub electrification_status: ElectrificationStatus,
    pub solution: Solution,
    pub demand_mwh_year: f64,
    pub peak_kw: f64,
    /// Solar capacity added by the scenario (MW).
    pub solar_capacity_mw: f64,
    /// Intervention applied by the scenario, if any.
    pub scenario_tag: Option<Solution>,
}

/// Immutable baseline shared by every scenario of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    clusters: Vec<ClusterState>,
}

impl Snapshot {
    pub fn new(clusters: Vec<ClusterState>) -> Self {
        Self { clusters }
    }

    /// Joins scored clusters with their demand records by cluster id.
    ///
    /// Output order follows `scored`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SnapshotMismatch`] if the two collections differ in
    /// length or a scored cluster has no demand record.
    pub fn from_stages(scored: &[ScoredCluster], demand: &[DemandRecord]) -> Result<Self> {
        if scored.len() != demand.len() {
            return Err(Error::SnapshotMismatch(format!(
                "{} scored clusters but {} demand records",
                scored.len(),
                demand.len()
            )));
        }
        let by_id: HashMap<i64, &DemandRecord> = demand.iter().map(|d| (d.cluster_id, d)).collect();
        let clusters = scored
            .iter()
            .map(|s| {
                let id = s.cluster_id();
                let d = by_id.get(&id).ok_or_else(|| {
                    Error::SnapshotMismatch(format!("no demand record for cluster {id}"))
                })?;
                Ok(ClusterState {
                    cluster_id: id,
                    priority_score: s.priority_score,
                    estimated_population: d.estimated_population,
                    distance_to_power_km: s.cluster.indicators.distance_to_power_km,
                    electrification_status: d.electrification_status,
                    solution: s.recommended_solution,
                    demand_mwh_year: d.baseline_demand_mwh_year,
                    peak_kw: d.baseline_peak_kw,
                    solar_capacity_mw: 0.0,
                    scenario_tag: None,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { clusters })
    }

    pub fn clusters(&self) -> &[ClusterState] {
        &self.clusters
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn total_population(&self) -> f64 {
        total_population(&self.clusters)
    }

    pub fn unelectrified_population(&self) -> f64 {
        unelectrified(&self.clusters).map(|c| c.estimated_population).sum()
    }

    pub fn unelectrified_count(&self) -> usize {
        unelectrified(&self.clusters).count()
    }

    pub fn total_demand_mwh(&self) -> f64 {
        total_demand(&self.clusters)
    }
}

pub(crate) fn unelectrified(clusters: &[ClusterState]) -> impl Iterator<Item = &ClusterState> {
    clusters
        .iter()
        .filter(|c| c.electrification_status == ElectrificationStatus::Unelectrified)
}

pub(crate) fn total_population(clusters: &[ClusterState]) -> f64 {
    clusters.iter().map(|c| c.estimated_population).sum()
}

pub(crate) fn total_demand(clusters: &[ClusterState]) -> f64 {
    clusters.iter().map(|c| c.demand_mwh_year).sum()
}

/// Aggregate impact of one scenario relative to the baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub description: String,
    /// Drop in unelectrified population, floored at 0.
    pub people_electrified: f64,
    /// Drop in the number of unelectrified clusters, floored at 0.
    pub settlements_connected: usize,
    /// Post-scenario total demand minus baseline total demand (MWh/year).
    pub demand_increase_mwh: f64,
    pub cost_usd: f64,
    /// 0 when nobody was newly electrified.
    pub cost_per_person_usd: f64,
    /// Share of post-scenario population with any access, in `[0, 1]`.
    pub electrification_rate: f64,
}

/// One intervention applied to one cluster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Intervention {
    pub cluster_id: i64,
    pub solution: Solution,
    pub cost_usd: f64,
}

/// A scenario result together with the post-scenario cluster states.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    pub config: ScenarioConfig,
    pub result: ScenarioResult,
    pub clusters: Vec<ClusterState>,
    pub interventions: Vec<Intervention>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{ClusterRecord, Indicators, PriorityCategory};
    use crate::scoring::SubScores;
    use serde_json::Map;

    fn scored(id: i64) -> ScoredCluster {
        ScoredCluster {
            cluster: ClusterRecord {
                cluster_id: id,
                geometry: None,
                indicators: Indicators {
                    distance_to_power_km: 4.0,
                    ..Indicators::default()
                },
                estimated_population: 100.0,
                electrification_status: ElectrificationStatus::Unelectrified,
                energy_need_score: 0.0,
                building_density: 0.0,
                properties: Map::new(),
            },
            scores: SubScores::default(),
            priority_score: id as f64,
            priority_category: PriorityCategory::Low,
            recommended_solution: Solution::MiniGridSolar,
            estimated_cost_usd: 0.0,
            cost_per_person_usd: 0.0,
        }
    }

    fn demand(id: i64, mwh: f64) -> DemandRecord {
        DemandRecord {
            cluster_id: id,
            estimated_population: 100.0,
            electrification_status: ElectrificationStatus::Unelectrified,
            households: 30.0,
            demand_per_household_kwh: 450.0,
            baseline_demand_mwh_year: mwh,
            baseline_peak_kw: mwh,
            horizon_year: 2030,
            horizon_population: 100.0,
            horizon_demand_mwh_year: mwh,
            horizon_peak_kw: mwh,
        }
    }

    #[test]
    fn snapshot_joins_by_id_in_scored_order() {
        let snap = Snapshot::from_stages(
            &[scored(2), scored(1)],
            &[demand(1, 10.0), demand(2, 20.0)],
        )
        .expect("ids match");
        assert_eq!(snap.clusters()[0].cluster_id, 2);
        assert_eq!(snap.clusters()[0].demand_mwh_year, 20.0);
        assert_eq!(snap.clusters()[1].demand_mwh_year, 10.0);
        assert_eq!(snap.clusters()[0].distance_to_power_km, 4.0);
        assert_eq!(snap.total_demand_mwh(), 30.0);
        assert_eq!(snap.unelectrified_count(), 2);
    }

    #[test]
    fn snapshot_rejects_missing_demand() {
        let err = Snapshot::from_stages(&[scored(1)], &[demand(9, 1.0)]);
        assert!(matches!(err, Err(Error::SnapshotMismatch(_))));
        let err = Snapshot::from_stages(&[scored(1)], &[]);
        assert!(matches!(err, Err(Error::SnapshotMismatch(_))));
    }

    #[test]
    fn predefined_names_are_unique() {
        let all = ScenarioConfig::predefined();
        let mut names: Vec<&str> = all.iter().map(|s| s.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), all.len());
    }

    #[test]
    fn scenario_toml_fields() {
        let cfg: ScenarioConfig = toml::from_str(
            "name = \"Near\"\ngrid_count = 3\ngrid_target = \"nearest_grid\"\nsolar_capacity_mw = 12.5\n",
        )
        .expect("scenario parses");
        assert_eq!(cfg.grid_target, GridTarget::NearestGrid);
        assert_eq!(cfg.solar_capacity_mw, 12.5);
        let plain: ScenarioConfig = toml::from_str("name = \"Plain\"\n").expect("scenario parses");
        assert_eq!(plain.grid_target, GridTarget::TopPriority);
        assert_eq!(plain.solar_capacity_mw, 0.0);
    }

    #[test]
    fn slug_is_file_safe() {
        assert_eq!(ScenarioConfig::new("Grid Expansion", 1, 0).slug(), "grid_expansion");
        assert_eq!(ScenarioConfig::new("Mini-Grid Rollout", 0, 1).slug(), "mini-grid_rollout");
        assert_eq!(ScenarioConfig::new("a/b", 0, 0).slug(), "a_b");
        assert_eq!(ScenarioConfig::new("  ", 0, 0).slug(), "scenario");
    }
}
