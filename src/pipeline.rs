//! End-to-end recompute: ingest, score, project, snapshot, simulate.

use tracing::info;

use crate::cluster::{self, ClusterRecord, RawCluster};
use crate::config::EngineConfig;
use crate::demand::{DemandProjector, DemandRecord, DemandTotals, TrajectoryPoint};
use crate::error::Result;
use crate::job::CancelToken;
use crate::scenario::{
    CostModel, ScenarioOutcome, ScenarioResult, ScenarioSimulator, Snapshot, compare_outcomes,
};
use crate::scoring::{PriorityScorer, ScoringRun};

/// Everything one run produces, ready for publishing.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub scoring: ScoringRun,
    pub demand: Vec<DemandRecord>,
    /// Yearly demand and peak per cluster, base year to horizon.
    pub trajectories: Vec<TrajectoryPoint>,
    pub totals: DemandTotals,
    pub scenarios: Vec<ScenarioOutcome>,
}

impl PipelineOutput {
    /// Scenario results in configuration order.
    pub fn scenario_results(&self) -> Vec<ScenarioResult> {
        self.scenarios.iter().map(|s| s.result.clone()).collect()
    }
}

/// Validated stage components for one configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: EngineConfig,
    scorer: PriorityScorer,
    projector: DemandProjector,
    simulator: ScenarioSimulator,
}

impl Pipeline {
    /// Validates `config` and builds every stage.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConfig`] listing every violated invariant.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let config = config.into_validated()?;
        let cost = CostModel::new(config.cost, config.demand.households_per_person);
        Ok(Self {
            scorer: PriorityScorer::new(&config.scoring, cost.clone())?,
            projector: DemandProjector::new(config.demand.clone()),
            simulator: ScenarioSimulator::new(cost, config.interventions),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn projector(&self) -> &DemandProjector {
        &self.projector
    }

    /// Types raw upstream features.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Ingest`] on missing or duplicate cluster ids.
    pub fn ingest(&self, raw: Vec<RawCluster>) -> Result<Vec<ClusterRecord>> {
        let clusters = cluster::ingest(raw, &self.config.ingest)?;
        info!(clusters = clusters.len(), "ingested clusters");
        Ok(clusters)
    }

    /// Runs every stage, checking `cancel` before each one.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Cancelled`] naming the stage that did not
    /// start, or [`crate::Error::SnapshotMismatch`] if scoring and demand
    /// disagree on the cluster set.
    pub fn run(&self, clusters: &[ClusterRecord], cancel: &CancelToken) -> Result<PipelineOutput> {
        cancel.check("score")?;
        let scoring = self.scorer.score_all(clusters);
        let (high, medium, low) = scoring.category_counts();
        info!(high, medium, low, "scored clusters");

        cancel.check("project")?;
        let demand = self.projector.project_all(&scoring.clusters);
        let trajectories = self.projector.trajectories(&demand);
        let totals = DemandTotals::from_records(&demand, self.config.demand.horizon_year);
        info!(
            baseline_mwh = totals.baseline_demand_mwh_year,
            horizon_mwh = totals.horizon_demand_mwh_year,
            horizon_year = totals.horizon_year,
            "projected demand"
        );

        cancel.check("snapshot")?;
        let snapshot = Snapshot::from_stages(&scoring.clusters, &demand)?;

        cancel.check("simulate")?;
        let scenarios = compare_outcomes(&self.simulator, &self.config.scenarios, &snapshot);
        info!(scenarios = scenarios.len(), "simulated scenarios");

        Ok(PipelineOutput {
            scoring,
            demand,
            trajectories,
            totals,
            scenarios,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::{Map, json};

    fn raw(id: i64, norm_pop: f64, dist: f64) -> RawCluster {
        let mut props = Map::new();
        props.insert("cluster_id".into(), json!(id));
        props.insert("norm_pop".into(), json!(norm_pop));
        props.insert("dist_to_power_km".into(), json!(dist));
        RawCluster::new(None, props)
    }

    #[test]
    fn rejects_invalid_config() {
        let mut cfg = EngineConfig::baseline();
        cfg.scoring.weights.economic = 0.9;
        assert!(matches!(Pipeline::new(cfg), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn runs_all_stages() {
        let pipeline = Pipeline::new(EngineConfig::baseline()).expect("baseline is valid");
        let clusters = pipeline
            .ingest(vec![raw(1, 0.8, 2.0), raw(2, 0.1, 30.0), raw(3, 0.4, 12.0)])
            .expect("ingest");
        let out = pipeline.run(&clusters, &CancelToken::new()).expect("run");
        assert_eq!(out.scoring.clusters.len(), 3);
        assert_eq!(out.demand.len(), 3);
        assert_eq!(out.totals.clusters, 3);
        assert_eq!(out.scenarios.len(), pipeline.config().scenarios.len());
    }

    #[test]
    fn cancelled_before_first_stage() {
        let pipeline = Pipeline::new(EngineConfig::baseline()).expect("baseline is valid");
        let token = CancelToken::new();
        token.cancel();
        let out = pipeline.run(&[], &token);
        assert!(matches!(out, Err(Error::Cancelled("score"))));
    }
}
