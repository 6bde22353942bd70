//! CSV and JSON exports for scored clusters, demand, and scenario comparison.

use std::collections::HashMap;
use std::io::Write;

use crate::demand::{DemandRecord, DemandTotals, TrajectoryPoint};
use crate::error::Result;
use crate::scenario::ScenarioResult;
use crate::scoring::ScoredCluster;

/// Column header for the scored-cluster summary.
const SCORED_HEADER: &str = "cluster_id,priority_score,priority_category,recommended_solution,\
                             population_score,access_gap_score,economic_score,\
                             social_need_score,grid_proximity_score,estimated_population,\
                             estimated_cost_usd,cost_per_person_usd";

/// Column header for the scenario comparison table.
const COMPARISON_HEADER: &str = "scenario_name,description,people_electrified,\
                                 settlements_connected,demand_increase_mwh,cost_usd,\
                                 cost_per_person_usd,electrification_rate";

fn header(columns: &str) -> impl Iterator<Item = &str> {
    columns.split(',').map(str::trim)
}

/// Writes the scored-cluster summary as CSV, one row per cluster in input order.
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_scored_csv(clusters: &[ScoredCluster], writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(header(SCORED_HEADER))?;
    for c in clusters {
        let s = &c.scores;
        wtr.write_record(&[
            c.cluster_id().to_string(),
            format!("{:.2}", c.priority_score),
            c.priority_category.to_string(),
            c.recommended_solution.to_string(),
            format!("{:.2}", s.population),
            format!("{:.2}", s.access_gap),
            format!("{:.2}", s.economic),
            format!("{:.2}", s.social_need),
            format!("{:.2}", s.grid_proximity),
            format!("{:.0}", c.cluster.estimated_population),
            format!("{:.2}", c.estimated_cost_usd),
            format!("{:.2}", c.cost_per_person_usd),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes demand forecasts joined with scoring fields as CSV.
///
/// Horizon columns are named after the horizon year (`demand_2030_mwh_year`,
/// `peak_2030_kw`). Clusters without a demand record are skipped.
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_demand_csv(
    scored: &[ScoredCluster],
    demand: &[DemandRecord],
    horizon_year: i32,
    writer: impl Write,
) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record([
        "cluster_id".to_string(),
        "priority_score".to_string(),
        "priority_category".to_string(),
        "recommended_solution".to_string(),
        "estimated_population".to_string(),
        "electrification_status".to_string(),
        "baseline_demand_mwh_year".to_string(),
        "baseline_peak_kw".to_string(),
        format!("demand_{horizon_year}_mwh_year"),
        format!("peak_{horizon_year}_kw"),
    ])?;

    let by_id: HashMap<i64, &DemandRecord> = demand.iter().map(|d| (d.cluster_id, d)).collect();
    for c in scored {
        let Some(d) = by_id.get(&c.cluster_id()) else {
            continue;
        };
        wtr.write_record(&[
            c.cluster_id().to_string(),
            format!("{:.2}", c.priority_score),
            c.priority_category.to_string(),
            c.recommended_solution.to_string(),
            format!("{:.0}", d.estimated_population),
            d.electrification_status.to_string(),
            format!("{:.2}", d.baseline_demand_mwh_year),
            format!("{:.2}", d.baseline_peak_kw),
            format!("{:.2}", d.horizon_demand_mwh_year),
            format!("{:.2}", d.horizon_peak_kw),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes yearly demand trajectories as CSV, one row per cluster and year.
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_trajectory_csv(points: &[TrajectoryPoint], writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(["cluster_id", "year", "demand_mwh_year", "peak_kw"])?;
    for t in points {
        wtr.write_record(&[
            t.cluster_id.to_string(),
            t.year.to_string(),
            format!("{:.2}", t.demand_mwh_year),
            format!("{:.2}", t.peak_kw),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the scenario comparison table as CSV, in the given order.
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_comparison_csv(results: &[ScenarioResult], writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(header(COMPARISON_HEADER))?;
    for r in results {
        wtr.write_record(&[
            r.scenario_name.clone(),
            r.description.clone(),
            format!("{:.0}", r.people_electrified),
            r.settlements_connected.to_string(),
            format!("{:.2}", r.demand_increase_mwh),
            format!("{:.2}", r.cost_usd),
            format!("{:.2}", r.cost_per_person_usd),
            format!("{:.4}", r.electrification_rate),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes collection-wide demand totals as pretty-printed JSON.
///
/// # Errors
///
/// Returns a JSON error if serialization fails.
pub fn write_summary_json(totals: &DemandTotals, writer: impl Write) -> Result<()> {
    serde_json::to_writer_pretty(writer, totals)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, people: f64) -> ScenarioResult {
        ScenarioResult {
            scenario_name: name.to_string(),
            description: "with, comma".to_string(),
            people_electrified: people,
            settlements_connected: 2,
            demand_increase_mwh: 8.0,
            cost_usd: 220_500.0,
            cost_per_person_usd: 147.0,
            electrification_rate: 1.0,
        }
    }

    fn to_string(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap_or_default()
    }

    #[test]
    fn comparison_header_and_rows() {
        let mut buf = Vec::new();
        write_comparison_csv(&[result("A", 1500.0), result("B", 0.0)], &mut buf).ok();
        let out = to_string(buf);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            "scenario_name,description,people_electrified,settlements_connected,\
             demand_increase_mwh,cost_usd,cost_per_person_usd,electrification_rate"
        );
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "A,\"with, comma\",1500,2,8.00,220500.00,147.00,1.0000"
        );
        assert!(lines[2].starts_with("B,"));
    }

    #[test]
    fn empty_scored_has_header_only() {
        let mut buf = Vec::new();
        write_scored_csv(&[], &mut buf).ok();
        let out = to_string(buf);
        assert_eq!(out.lines().count(), 1);
        assert!(out.starts_with("cluster_id,priority_score,priority_category"));
    }

    #[test]
    fn demand_header_names_horizon_year() {
        let mut buf = Vec::new();
        write_demand_csv(&[], &[], 2035, &mut buf).ok();
        let out = to_string(buf);
        let first = out.lines().next().unwrap_or("");
        assert!(first.ends_with("demand_2035_mwh_year,peak_2035_kw"), "{first}");
    }

    #[test]
    fn trajectory_rows_per_year() {
        let points = [
            TrajectoryPoint {
                cluster_id: 5,
                year: 2024,
                demand_mwh_year: 100.0,
                peak_kw: 38.051,
            },
            TrajectoryPoint {
                cluster_id: 5,
                year: 2025,
                demand_mwh_year: 141.4214,
                peak_kw: 53.8,
            },
        ];
        let mut buf = Vec::new();
        write_trajectory_csv(&points, &mut buf).ok();
        let out = to_string(buf);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines, vec![
            "cluster_id,year,demand_mwh_year,peak_kw",
            "5,2024,100.00,38.05",
            "5,2025,141.42,53.80",
        ]);
    }

    #[test]
    fn summary_json_has_totals() {
        let totals = DemandTotals {
            clusters: 3,
            horizon_year: 2030,
            ..DemandTotals::default()
        };
        let mut buf = Vec::new();
        write_summary_json(&totals, &mut buf).ok();
        let value: serde_json::Value =
            serde_json::from_slice(&buf).unwrap_or(serde_json::Value::Null);
        assert_eq!(value["clusters"], 3);
        assert_eq!(value["horizon_year"], 2030);
    }
}
