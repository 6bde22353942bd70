//! Shared test fixtures for integration tests.

use std::path::PathBuf;

use energymap::cluster::{ElectrificationStatus, RawCluster, Solution};
use energymap::config::{EngineConfig, InterventionConfig};
use energymap::io::geojson;
use energymap::scenario::{ClusterState, CostModel, ScenarioSimulator, Snapshot};
use serde_json::{Map, json};

/// Eight-cluster GeoJSON fixture with mixed status and messy indicators.
pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/clusters.geojson")
}

/// Raw clusters from the GeoJSON fixture.
pub fn fixture_clusters() -> Vec<RawCluster> {
    geojson::load_clusters(&fixture_path()).expect("fixture should parse")
}

/// Cluster ids in fixture order.
pub const FIXTURE_IDS: [i64; 8] = [101, 102, 103, 104, 105, 106, 107, 108];

/// A raw cluster with the three indicators most rules depend on.
pub fn raw_cluster(id: i64, norm_pop: f64, dist_km: f64) -> RawCluster {
    let mut props = Map::new();
    props.insert("cluster_id".into(), json!(id));
    props.insert("norm_pop".into(), json!(norm_pop));
    props.insert("dist_to_power_km".into(), json!(dist_km));
    RawCluster::new(Some(json!({"type": "Point", "coordinates": [0.0, 0.0]})), props)
}

/// Unelectrified cluster state with 10 MWh/yr baseline demand.
pub fn cluster_state(id: i64, priority: f64, population: f64, distance_km: f64) -> ClusterState {
    ClusterState {
        cluster_id: id,
        priority_score: priority,
        estimated_population: population,
        distance_to_power_km: distance_km,
        electrification_status: ElectrificationStatus::Unelectrified,
        solution: Solution::MiniGridSolar,
        demand_mwh_year: 10.0,
        peak_kw: 3.8,
        solar_capacity_mw: 0.0,
        scenario_tag: None,
    }
}

/// Two unelectrified clusters: A (pop 1000, priority 9, 3 km) and
/// B (pop 500, priority 4, 40 km).
pub fn two_cluster_snapshot() -> Snapshot {
    Snapshot::new(vec![
        cluster_state(1, 9.0, 1000.0, 3.0),
        cluster_state(2, 4.0, 500.0, 40.0),
    ])
}

/// Simulator with default cost coefficients and uplifts.
pub fn default_simulator() -> ScenarioSimulator {
    ScenarioSimulator::new(
        CostModel::default(),
        InterventionConfig::default(),
    )
}

/// Baseline configuration.
pub fn baseline_config() -> EngineConfig {
    EngineConfig::baseline()
}
