//! Scenario comparison: one simulation per configuration, same baseline.

use rayon::prelude::*;
use tracing::info;

use super::simulator::ScenarioSimulator;
use super::{ScenarioConfig, ScenarioOutcome, ScenarioResult, Snapshot};

/// Evaluates every scenario against the same snapshot.
///
/// Scenarios run in parallel; results keep the order of `configs`.
pub fn compare(
    simulator: &ScenarioSimulator,
    configs: &[ScenarioConfig],
    snapshot: &Snapshot,
) -> Vec<ScenarioResult> {
    configs
        .par_iter()
        .map(|cfg| simulator.simulate(snapshot, cfg))
        .collect()
}

/// Like [`compare`], keeping each scenario's post-simulation cluster states.
pub fn compare_outcomes(
    simulator: &ScenarioSimulator,
    configs: &[ScenarioConfig],
    snapshot: &Snapshot,
) -> Vec<ScenarioOutcome> {
    info!(
        scenarios = configs.len(),
        clusters = snapshot.len(),
        "comparing scenarios"
    );
    configs
        .par_iter()
        .map(|cfg| simulator.run(snapshot, cfg))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{ElectrificationStatus, Solution};
    use crate::config::InterventionConfig;
    use crate::scenario::{ClusterState, CostModel};

    fn snapshot() -> Snapshot {
        Snapshot::new(
            (0..12)
                .map(|i| ClusterState {
                    cluster_id: i,
                    priority_score: (i % 5) as f64,
                    estimated_population: 100.0 + (i * 37 % 11) as f64 * 50.0,
                    distance_to_power_km: i as f64,
                    electrification_status: if i % 4 == 0 {
                        ElectrificationStatus::Electrified
                    } else {
                        ElectrificationStatus::Unelectrified
                    },
                    solution: Solution::MiniGridSolar,
                    demand_mwh_year: 5.0,
                    peak_kw: 2.0,
                    solar_capacity_mw: 0.0,
                    scenario_tag: None,
                })
                .collect(),
        )
    }

    fn simulator() -> ScenarioSimulator {
        ScenarioSimulator::new(
            CostModel::default(),
            InterventionConfig::default(),
        )
    }

    #[test]
    fn preserves_config_order() {
        let configs = ScenarioConfig::predefined();
        let results = compare(&simulator(), &configs, &snapshot());
        let names: Vec<&str> = results.iter().map(|r| r.scenario_name.as_str()).collect();
        let expected: Vec<&str> = configs.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn matches_sequential_simulation() {
        let configs = ScenarioConfig::predefined();
        let snap = snapshot();
        let sim = simulator();
        let parallel = compare(&sim, &configs, &snap);
        let sequential: Vec<ScenarioResult> =
            configs.iter().map(|c| sim.simulate(&snap, c)).collect();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn idempotent_and_non_mutating() {
        let configs = vec![
            ScenarioConfig::new("A", 3, 0),
            ScenarioConfig::new("B", 0, 4).with_growth(0.1, 0.1),
        ];
        let snap = snapshot();
        let before = snap.clone();
        let first = compare(&simulator(), &configs, &snap);
        let second = compare(&simulator(), &configs, &snap);
        assert_eq!(first, second);
        assert_eq!(snap, before);
    }

    #[test]
    fn scenarios_are_not_cumulative() {
        let snap = snapshot();
        let cfg = ScenarioConfig::new("A", 3, 0);
        let results = compare(&simulator(), &[cfg.clone(), cfg], &snap);
        assert_eq!(results[0], results[1]);
    }

    #[test]
    fn outcomes_carry_cluster_states() {
        let snap = snapshot();
        let out = compare_outcomes(&simulator(), &[ScenarioConfig::new("A", 2, 2)], &snap);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].clusters.len(), snap.len());
        assert_eq!(out[0].interventions.len(), 4);
    }
}
