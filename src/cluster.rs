//! Settlement cluster records and the closed enums shared by every stage.
//!
//! Upstream property bags are duck-typed: fields may be missing, null,
//! numeric strings, or garbage. [`ingest`] is the single place where those
//! bags become strongly typed [`ClusterRecord`]s. Indicator parsing is lenient:
//! anything that is not a finite number becomes `0.0` rather than an error.
//! Only a missing or duplicate `cluster_id` fails ingestion.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::IngestConfig;
use crate::error::{Error, Result};

/// Property holding the unique integer cluster identifier.
pub const FIELD_CLUSTER_ID: &str = "cluster_id";
/// Population proxy (0–1 index, or 0–100 percentage).
pub const FIELD_POPULATION: &str = "norm_pop";
/// Grid-access proxy; higher means better existing access.
pub const FIELD_GRID_ACCESS: &str = "grid_norm";
/// Road-density proxy used as the economic-activity indicator.
pub const FIELD_ROAD_DENSITY: &str = "total_road_km";
/// Social-need survey weight.
pub const FIELD_SOCIAL_NEED: &str = "need_level_weight";
/// Distance to the nearest power infrastructure in km.
pub const FIELD_DISTANCE_KM: &str = "dist_to_power_km";
/// Optional absolute population supplied upstream.
pub const FIELD_ESTIMATED_POPULATION: &str = "estimated_population";
/// Optional explicit electrification status.
pub const FIELD_ELECTRIFICATION_STATUS: &str = "electrification_status";
/// Optional 0–100 energy need score used to infer status.
pub const FIELD_ENERGY_NEED: &str = "energy_need_score";
/// Optional building density used to pick a population growth class.
pub const FIELD_BUILDING_DENSITY: &str = "building_density";

/// Access to power before or after interventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ElectrificationStatus {
    /// No access.
    #[default]
    #[serde(rename = "none")]
    Unelectrified,
    /// Partial access, e.g. a mini-grid with limited hours.
    #[serde(rename = "partial")]
    Partial,
    /// Full grid access.
    #[serde(rename = "electrified")]
    Electrified,
}

impl ElectrificationStatus {
    /// Wire name used in every output schema.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElectrificationStatus::Unelectrified => "none",
            ElectrificationStatus::Partial => "partial",
            ElectrificationStatus::Electrified => "electrified",
        }
    }

    /// Parses a wire name, case-insensitively. Unknown names yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Some(ElectrificationStatus::Unelectrified),
            "partial" => Some(ElectrificationStatus::Partial),
            "electrified" => Some(ElectrificationStatus::Electrified),
            _ => None,
        }
    }

    /// Infers status from a 0–100 need score.
    ///
    /// Need at or above `unelectrified_min_need` means no access, at or above
    /// `partial_min_need` means partial access, anything lower is electrified.
    pub fn from_need(need: f64, config: &IngestConfig) -> Self {
        if need >= config.unelectrified_min_need {
            ElectrificationStatus::Unelectrified
        } else if need >= config.partial_min_need {
            ElectrificationStatus::Partial
        } else {
            ElectrificationStatus::Electrified
        }
    }
}

impl fmt::Display for ElectrificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority band derived from the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriorityCategory {
    High,
    Medium,
    Low,
}

impl PriorityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityCategory::High => "High",
            PriorityCategory::Medium => "Medium",
            PriorityCategory::Low => "Low",
        }
    }
}

impl fmt::Display for PriorityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Electrification solution attached to a cluster.
///
/// The first four variants are produced by the recommendation classifier;
/// [`Solution::MiniGrid`] is the generic tag written by the scenario
/// simulator's mini-grid pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Solution {
    GridExtension,
    MiniGridHybrid,
    MiniGridSolar,
    StandaloneSolar,
    MiniGrid,
}

impl Solution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Solution::GridExtension => "grid_extension",
            Solution::MiniGridHybrid => "mini_grid_hybrid",
            Solution::MiniGridSolar => "mini_grid_solar",
            Solution::StandaloneSolar => "standalone_solar",
            Solution::MiniGrid => "mini_grid",
        }
    }

    /// True for every `mini_grid*` solution (prefix match on the wire name).
    pub fn is_mini_grid(&self) -> bool {
        self.as_str().starts_with("mini_grid")
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw indicator values after default-filling. All values are finite and >= 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Indicators {
    /// Population index in [0, 1].
    pub population_index: f64,
    /// Grid-access proxy (`grid_norm`).
    pub grid_access: f64,
    /// Road-density proxy (`total_road_km`).
    pub road_density: f64,
    /// Social-need proxy (`need_level_weight`); 0 when no survey data.
    pub social_need: f64,
    /// Distance to power infrastructure (km).
    pub distance_to_power_km: f64,
}

/// One settlement cluster as seen by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterRecord {
    /// Unique, stable identifier.
    pub cluster_id: i64,
    /// Point geometry, opaque to the engine and passed through to outputs.
    pub geometry: Option<Value>,
    /// Default-filled raw indicators.
    pub indicators: Indicators,
    /// Estimated absolute population (>= 0).
    pub estimated_population: f64,
    /// Current electrification status.
    pub electrification_status: ElectrificationStatus,
    /// Energy need score (0–100), 0 when absent.
    pub energy_need_score: f64,
    /// Building density, 0 when absent.
    pub building_density: f64,
    /// Original property bag, passed through untouched to enriched outputs.
    pub properties: Map<String, Value>,
}

/// A feature as read from upstream, before typing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCluster {
    pub geometry: Option<Value>,
    pub properties: Map<String, Value>,
}

impl RawCluster {
    pub fn new(geometry: Option<Value>, properties: Map<String, Value>) -> Self {
        Self {
            geometry,
            properties,
        }
    }
}

/// Reads a numeric property leniently.
///
/// Numbers and numeric strings are accepted; missing, null, non-numeric, and
/// non-finite values become `0.0`. Negative values are clamped to `0.0`.
pub fn lenient_f64(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => v.max(0.0),
        _ => 0.0,
    }
}

fn parse_cluster_id(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Brings raw `norm_pop` values into [0, 1].
///
/// If any value exceeds 1 the whole collection is treated as percentages.
fn population_indices(raw: &[f64]) -> Vec<f64> {
    let percentages = raw.iter().any(|&v| v > 1.0);
    raw.iter()
        .map(|&v| {
            let v = if percentages { v.clamp(0.0, 100.0) / 100.0 } else { v };
            v.clamp(0.0, 1.0)
        })
        .collect()
}

/// Converts raw upstream features into typed cluster records.
///
/// # Errors
///
/// Returns [`Error::Ingest`] if a feature has no integer `cluster_id` or if
/// two features share an identifier. Indicator problems never raise.
pub fn ingest(raw: Vec<RawCluster>, config: &IngestConfig) -> Result<Vec<ClusterRecord>> {
    let mut seen = HashSet::with_capacity(raw.len());
    let mut ids = Vec::with_capacity(raw.len());
    for (i, feature) in raw.iter().enumerate() {
        let id = parse_cluster_id(feature.properties.get(FIELD_CLUSTER_ID)).ok_or_else(|| {
            Error::Ingest(format!(
                "feature {i}: `{FIELD_CLUSTER_ID}` missing or not an integer"
            ))
        })?;
        if !seen.insert(id) {
            return Err(Error::Ingest(format!(
                "feature {i}: duplicate `{FIELD_CLUSTER_ID}` {id}"
            )));
        }
        ids.push(id);
    }

    let raw_population: Vec<f64> = raw
        .iter()
        .map(|f| lenient_f64(f.properties.get(FIELD_POPULATION)))
        .collect();
    let population_index = population_indices(&raw_population);

    let records = raw
        .into_iter()
        .zip(ids)
        .zip(population_index)
        .map(|((feature, cluster_id), population_index)| {
            let props = &feature.properties;
            let indicators = Indicators {
                population_index,
                grid_access: lenient_f64(props.get(FIELD_GRID_ACCESS)),
                road_density: lenient_f64(props.get(FIELD_ROAD_DENSITY)),
                social_need: lenient_f64(props.get(FIELD_SOCIAL_NEED)),
                distance_to_power_km: lenient_f64(props.get(FIELD_DISTANCE_KM)),
            };

            let estimated_population = match props.get(FIELD_ESTIMATED_POPULATION) {
                Some(v) if !v.is_null() => lenient_f64(Some(v)),
                _ => population_index * config.population_scale,
            };

            let need_value = props.get(FIELD_ENERGY_NEED).filter(|v| !v.is_null());
            let energy_need_score = lenient_f64(need_value);
            let explicit_status = props
                .get(FIELD_ELECTRIFICATION_STATUS)
                .and_then(Value::as_str)
                .and_then(ElectrificationStatus::parse);
            let electrification_status = match (explicit_status, need_value) {
                (Some(status), _) => status,
                (None, Some(_)) => ElectrificationStatus::from_need(energy_need_score, config),
                (None, None) => ElectrificationStatus::Unelectrified,
            };

            ClusterRecord {
                cluster_id,
                geometry: feature.geometry,
                indicators,
                estimated_population,
                electrification_status,
                energy_need_score,
                building_density: lenient_f64(props.get(FIELD_BUILDING_DENSITY)),
                properties: feature.properties,
            }
        })
        .collect();

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(props: Value) -> RawCluster {
        let properties = match props {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        RawCluster::new(None, properties)
    }

    #[test]
    fn lenient_parsing_defaults_to_zero() {
        assert_eq!(lenient_f64(None), 0.0);
        assert_eq!(lenient_f64(Some(&Value::Null)), 0.0);
        assert_eq!(lenient_f64(Some(&json!("abc"))), 0.0);
        assert_eq!(lenient_f64(Some(&json!(" 2.5 "))), 2.5);
        assert_eq!(lenient_f64(Some(&json!(-4.0))), 0.0);
        assert_eq!(lenient_f64(Some(&json!(7))), 7.0);
    }

    #[test]
    fn missing_indicators_become_zero() {
        let records = ingest(vec![raw(json!({"cluster_id": 1}))], &IngestConfig::default())
            .expect("ingest should succeed");
        let r = &records[0];
        assert_eq!(r.indicators, Indicators::default());
        assert_eq!(r.estimated_population, 0.0);
        assert_eq!(r.electrification_status, ElectrificationStatus::Unelectrified);
    }

    #[test]
    fn missing_cluster_id_is_an_error() {
        let err = ingest(vec![raw(json!({"norm_pop": 0.4}))], &IngestConfig::default());
        assert!(matches!(err, Err(Error::Ingest(_))));
    }

    #[test]
    fn duplicate_cluster_id_is_an_error() {
        let err = ingest(
            vec![raw(json!({"cluster_id": 3})), raw(json!({"cluster_id": "3"}))],
            &IngestConfig::default(),
        );
        let msg = err.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(msg.contains("duplicate"), "got: {msg}");
    }

    #[test]
    fn percentage_population_is_rescaled() {
        let records = ingest(
            vec![
                raw(json!({"cluster_id": 1, "norm_pop": 50.0})),
                raw(json!({"cluster_id": 2, "norm_pop": 100.0})),
            ],
            &IngestConfig::default(),
        )
        .expect("ingest should succeed");
        assert!((records[0].indicators.population_index - 0.5).abs() < 1e-12);
        assert!((records[0].estimated_population - 2500.0).abs() < 1e-9);
        assert!((records[1].estimated_population - 5000.0).abs() < 1e-9);
    }

    #[test]
    fn explicit_population_wins_over_index() {
        let records = ingest(
            vec![raw(json!({"cluster_id": 1, "norm_pop": 0.5, "estimated_population": 1234}))],
            &IngestConfig::default(),
        )
        .expect("ingest should succeed");
        assert_eq!(records[0].estimated_population, 1234.0);
    }

    #[test]
    fn status_inferred_from_need_score() {
        let cfg = IngestConfig::default();
        assert_eq!(
            ElectrificationStatus::from_need(75.0, &cfg),
            ElectrificationStatus::Unelectrified
        );
        assert_eq!(
            ElectrificationStatus::from_need(40.0, &cfg),
            ElectrificationStatus::Partial
        );
        assert_eq!(
            ElectrificationStatus::from_need(10.0, &cfg),
            ElectrificationStatus::Electrified
        );
    }

    #[test]
    fn explicit_status_wins_over_need() {
        let records = ingest(
            vec![raw(json!({
                "cluster_id": 9,
                "energy_need_score": 90,
                "electrification_status": "Electrified"
            }))],
            &IngestConfig::default(),
        )
        .expect("ingest should succeed");
        assert_eq!(
            records[0].electrification_status,
            ElectrificationStatus::Electrified
        );
    }

    #[test]
    fn mini_grid_prefix_match() {
        assert!(Solution::MiniGrid.is_mini_grid());
        assert!(Solution::MiniGridHybrid.is_mini_grid());
        assert!(Solution::MiniGridSolar.is_mini_grid());
        assert!(!Solution::GridExtension.is_mini_grid());
        assert!(!Solution::StandaloneSolar.is_mini_grid());
    }

    #[test]
    fn status_wire_names() {
        let s = serde_json::to_string(&ElectrificationStatus::Unelectrified).ok();
        assert_eq!(s.as_deref(), Some("\"none\""));
        let s = serde_json::to_string(&Solution::MiniGridHybrid).ok();
        assert_eq!(s.as_deref(), Some("\"mini_grid_hybrid\""));
    }
}
