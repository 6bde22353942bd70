//! GeoJSON FeatureCollection input and enriched outputs.
//!
//! Geometry is opaque: it is read as raw JSON and written back untouched.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::cluster::RawCluster;
use crate::demand::DemandRecord;
use crate::error::{Error, Result};
use crate::scenario::ScenarioOutcome;
use crate::scoring::{ScoredCluster, ScoringRun};

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    geometry: Option<Value>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

/// Rounds to two decimals for output.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Reads raw clusters from a GeoJSON FeatureCollection.
///
/// Features with a null or missing `properties` member get an empty bag,
/// which ingestion then rejects for lacking a `cluster_id`.
///
/// # Errors
///
/// Returns [`Error::Ingest`] if the document is not a FeatureCollection.
pub fn read_clusters(reader: impl Read) -> Result<Vec<RawCluster>> {
    let collection: FeatureCollection = serde_json::from_reader(reader)
        .map_err(|e| Error::Ingest(format!("not a GeoJSON FeatureCollection: {e}")))?;
    Ok(collection
        .features
        .into_iter()
        .map(|f| RawCluster::new(f.geometry, f.properties.unwrap_or_default()))
        .collect())
}

/// Reads raw clusters from a GeoJSON file.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened, or [`Error::Ingest`]
/// if it is not a FeatureCollection.
pub fn load_clusters(path: &Path) -> Result<Vec<RawCluster>> {
    let file = File::open(path)?;
    read_clusters(BufReader::new(file))
}

fn feature(geometry: Option<&Value>, properties: Map<String, Value>) -> Value {
    json!({
        "type": "Feature",
        "geometry": geometry.cloned().unwrap_or(Value::Null),
        "properties": properties,
    })
}

fn collection(features: Vec<Value>, metadata: Option<Value>) -> Value {
    let mut fc = Map::new();
    fc.insert("type".into(), json!("FeatureCollection"));
    if let Some(metadata) = metadata {
        fc.insert("metadata".into(), metadata);
    }
    fc.insert("features".into(), Value::Array(features));
    Value::Object(fc)
}

/// Input properties extended with scores, category, recommendation, and cost.
pub fn scored_properties(c: &ScoredCluster) -> Map<String, Value> {
    let mut props = c.cluster.properties.clone();
    let s = &c.scores;
    props.insert("cluster_id".into(), json!(c.cluster_id()));
    props.insert("population_score".into(), json!(round2(s.population)));
    props.insert("access_gap_score".into(), json!(round2(s.access_gap)));
    props.insert("economic_score".into(), json!(round2(s.economic)));
    props.insert("social_need_score".into(), json!(round2(s.social_need)));
    props.insert("grid_proximity_score".into(), json!(round2(s.grid_proximity)));
    props.insert("priority_score".into(), json!(round2(c.priority_score)));
    props.insert("priority_category".into(), json!(c.priority_category.as_str()));
    props.insert(
        "recommended_solution".into(),
        json!(c.recommended_solution.as_str()),
    );
    props.insert(
        "estimated_population".into(),
        json!(c.cluster.estimated_population.round()),
    );
    props.insert(
        "electrification_status".into(),
        json!(c.cluster.electrification_status.as_str()),
    );
    props.insert("estimated_cost_usd".into(), json!(round2(c.estimated_cost_usd)));
    props.insert("cost_per_person_usd".into(), json!(round2(c.cost_per_person_usd)));
    props
}

/// Enriched cluster collection with a scoring metadata block.
///
/// # Errors
///
/// Returns a JSON error if the metadata cannot be serialized.
pub fn enriched_collection(run: &ScoringRun) -> Result<Value> {
    let features = run
        .clusters
        .iter()
        .map(|c| feature(c.cluster.geometry.as_ref(), scored_properties(c)))
        .collect();
    Ok(collection(features, Some(serde_json::to_value(&run.metadata)?)))
}

/// Demand properties with horizon fields named after the horizon year.
pub fn demand_properties(d: &DemandRecord) -> Map<String, Value> {
    let year = d.horizon_year;
    let mut props = Map::new();
    props.insert("cluster_id".into(), json!(d.cluster_id));
    props.insert("estimated_population".into(), json!(d.estimated_population.round()));
    props.insert(
        "electrification_status".into(),
        json!(d.electrification_status.as_str()),
    );
    props.insert(
        "baseline_demand_mwh_year".into(),
        json!(round2(d.baseline_demand_mwh_year)),
    );
    props.insert("baseline_peak_kw".into(), json!(round2(d.baseline_peak_kw)));
    props.insert(
        format!("population_{year}"),
        json!(d.horizon_population.round()),
    );
    props.insert(
        format!("demand_{year}_mwh_year"),
        json!(round2(d.horizon_demand_mwh_year)),
    );
    props.insert(format!("peak_{year}_kw"), json!(round2(d.horizon_peak_kw)));
    props
}

/// Scored clusters joined with their demand records.
pub fn demand_collection(scored: &[ScoredCluster], demand: &[DemandRecord]) -> Value {
    let by_id: HashMap<i64, &DemandRecord> = demand.iter().map(|d| (d.cluster_id, d)).collect();
    let features = scored
        .iter()
        .filter_map(|c| {
            let d = by_id.get(&c.cluster_id())?;
            let mut props = scored_properties(c);
            props.extend(demand_properties(d));
            Some(feature(c.cluster.geometry.as_ref(), props))
        })
        .collect();
    collection(features, None)
}

/// Post-scenario cluster states, with geometry taken from the scored clusters.
pub fn scenario_collection(scored: &[ScoredCluster], outcome: &ScenarioOutcome) -> Value {
    let geometry: HashMap<i64, Option<&Value>> = scored
        .iter()
        .map(|c| (c.cluster_id(), c.cluster.geometry.as_ref()))
        .collect();
    let features = outcome
        .clusters
        .iter()
        .map(|s| {
            let mut props = Map::new();
            props.insert("cluster_id".into(), json!(s.cluster_id));
            props.insert("priority_score".into(), json!(round2(s.priority_score)));
            props.insert("estimated_population".into(), json!(s.estimated_population.round()));
            props.insert(
                "electrification_status".into(),
                json!(s.electrification_status.as_str()),
            );
            props.insert("recommended_solution".into(), json!(s.solution.as_str()));
            props.insert(
                "baseline_demand_mwh_year".into(),
                json!(round2(s.demand_mwh_year)),
            );
            props.insert("baseline_peak_kw".into(), json!(round2(s.peak_kw)));
            props.insert("solar_capacity_mw".into(), json!(s.solar_capacity_mw));
            props.insert(
                "scenario_tag".into(),
                s.scenario_tag
                    .map_or(Value::Null, |tag| json!(tag.as_str())),
            );
            feature(geometry.get(&s.cluster_id).copied().flatten(), props)
        })
        .collect();
    let metadata = json!({
        "scenario_name": outcome.config.name,
        "description": outcome.config.description,
    });
    collection(features, Some(metadata))
}
