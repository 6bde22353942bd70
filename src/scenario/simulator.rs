//! Greedy allocation of intervention budgets against a baseline snapshot.

use tracing::debug;

use super::cost::CostModel;
use super::{
    ClusterState, GridTarget, Intervention, ScenarioConfig, ScenarioOutcome, ScenarioResult, Snapshot,
    total_demand, total_population, unelectrified,
};
use crate::cluster::{ElectrificationStatus, Solution};
use crate::config::InterventionConfig;

/// Applies one [`ScenarioConfig`] to a snapshot.
///
/// Simulation is deterministic: the same snapshot and configuration always
/// produce an identical result.
#[derive(Debug, Clone)]
pub struct ScenarioSimulator {
    cost: CostModel,
    uplift: InterventionConfig,
}

impl ScenarioSimulator {
    pub fn new(cost: CostModel, uplift: InterventionConfig) -> Self {
        Self { cost, uplift }
    }

    /// Aggregate impact of one scenario.
    pub fn simulate(&self, snapshot: &Snapshot, config: &ScenarioConfig) -> ScenarioResult {
        self.run(snapshot, config).result
    }

    /// Runs one scenario and keeps the post-scenario cluster states.
    ///
    /// 1. Grid pass: clusters not yet electrified, ranked by the scenario's
    ///    [`GridTarget`] (highest priority first by default), become
    ///    electrified with a demand uplift.
    /// 2. Mini-grid pass: clusters still without access, most populous first,
    ///    become partially electrified with a smaller uplift.
    /// 3. Solar capacity, if any, is split evenly over every cluster.
    /// 4. Background growth is applied to every cluster.
    ///
    /// Ties keep snapshot order.
    pub fn run(&self, snapshot: &Snapshot, config: &ScenarioConfig) -> ScenarioOutcome {
        let mut clusters = snapshot.clusters().to_vec();
        let mut interventions = Vec::new();

        let mut grid_candidates: Vec<usize> = (0..clusters.len())
            .filter(|&i| clusters[i].electrification_status != ElectrificationStatus::Electrified)
            .collect();
        match config.grid_target {
            GridTarget::TopPriority => grid_candidates.sort_by(|&a, &b| {
                clusters[b].priority_score.total_cmp(&clusters[a].priority_score)
            }),
            GridTarget::NearestGrid => grid_candidates.sort_by(|&a, &b| {
                clusters[a]
                    .distance_to_power_km
                    .total_cmp(&clusters[b].distance_to_power_km)
            }),
            GridTarget::InputOrder => {}
        }
        for &i in grid_candidates.iter().take(config.grid_count) {
            interventions.push(self.intervene(
                &mut clusters[i],
                Solution::GridExtension,
                ElectrificationStatus::Electrified,
                self.uplift.grid_demand_uplift,
            ));
        }

        let mut mini_grid_candidates: Vec<usize> = (0..clusters.len())
            .filter(|&i| clusters[i].electrification_status == ElectrificationStatus::Unelectrified)
            .collect();
        mini_grid_candidates.sort_by(|&a, &b| {
            clusters[b]
                .estimated_population
                .total_cmp(&clusters[a].estimated_population)
        });
        for &i in mini_grid_candidates.iter().take(config.mini_grid_count) {
            interventions.push(self.intervene(
                &mut clusters[i],
                Solution::MiniGrid,
                ElectrificationStatus::Partial,
                self.uplift.mini_grid_demand_uplift,
            ));
        }

        if config.solar_capacity_mw > 0.0 && !clusters.is_empty() {
            let per_cluster = config.solar_capacity_mw / clusters.len() as f64;
            for c in &mut clusters {
                c.solar_capacity_mw += per_cluster;
            }
        }

        let population_factor = 1.0 + config.population_growth;
        let demand_factor = 1.0 + config.demand_growth;
        for c in &mut clusters {
            c.estimated_population *= population_factor;
            c.demand_mwh_year *= demand_factor;
            c.peak_kw *= demand_factor;
        }

        let result = aggregate(snapshot, &clusters, &interventions, config);
        debug!(
            scenario = %config.name,
            interventions = interventions.len(),
            people_electrified = result.people_electrified,
            "simulated scenario"
        );

        ScenarioOutcome {
            config: config.clone(),
            result,
            clusters,
            interventions,
        }
    }

    fn intervene(
        &self,
        cluster: &mut ClusterState,
        solution: Solution,
        status: ElectrificationStatus,
        uplift: f64,
    ) -> Intervention {
        cluster.electrification_status = status;
        cluster.solution = solution;
        cluster.scenario_tag = Some(solution);
        cluster.demand_mwh_year *= uplift;
        cluster.peak_kw *= uplift;
        Intervention {
            cluster_id: cluster.cluster_id,
            solution,
            cost_usd: self.cost.cost(
                solution,
                cluster.estimated_population,
                cluster.distance_to_power_km,
            ),
        }
    }
}

fn aggregate(
    baseline: &Snapshot,
    clusters: &[ClusterState],
    interventions: &[Intervention],
    config: &ScenarioConfig,
) -> ScenarioResult {
    let post_unelectrified_population: f64 =
        unelectrified(clusters).map(|c| c.estimated_population).sum();
    let people_electrified =
        (baseline.unelectrified_population() - post_unelectrified_population).max(0.0);
    let settlements_connected = baseline
        .unelectrified_count()
        .saturating_sub(unelectrified(clusters).count());
    let cost_usd: f64 = interventions.iter().map(|i| i.cost_usd).sum();
    let total = total_population(clusters);
    let electrification_rate = if total > 0.0 {
        ((total - post_unelectrified_population) / total).clamp(0.0, 1.0)
    } else {
        0.0
    };

    ScenarioResult {
        scenario_name: config.name.clone(),
        description: config.description.clone(),
        people_electrified,
        settlements_connected,
        demand_increase_mwh: total_demand(clusters) - baseline.total_demand_mwh(),
        cost_usd,
        cost_per_person_usd: CostModel::cost_per_person(cost_usd, people_electrified),
        electrification_rate,
    }
}
