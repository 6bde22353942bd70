//! Baseline and horizon electricity demand per cluster.
//!
//! Baseline demand comes from household counts and status-dependent
//! consumption. Horizon demand grows the population by a density-class rate,
//! applies a collection-wide electrification uplift toward a target rate,
//! and grows per-person consumption year on year. Peak load follows from
//! annual energy under a fixed load factor.

pub mod growth;

use serde::Serialize;
use tracing::debug;

use crate::cluster::ElectrificationStatus;
use crate::config::DemandConfig;
use crate::scoring::ScoredCluster;

pub use growth::{YearValue, compound, interpolate, trajectory};

/// Hours in a non-leap year.
pub const HOURS_PER_YEAR: f64 = 8760.0;

/// Floor applied to the load factor before dividing by it.
const MIN_LOAD_FACTOR: f64 = 0.01;

/// Interpolated demand and peak for one cluster in one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    pub cluster_id: i64,
    pub year: i32,
    pub demand_mwh_year: f64,
    pub peak_kw: f64,
}

/// Demand figures for one cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandRecord {
    pub cluster_id: i64,
    pub estimated_population: f64,
    pub electrification_status: ElectrificationStatus,
    pub households: f64,
    pub demand_per_household_kwh: f64,
    pub baseline_demand_mwh_year: f64,
    pub baseline_peak_kw: f64,
    pub horizon_year: i32,
    pub horizon_population: f64,
    pub horizon_demand_mwh_year: f64,
    pub horizon_peak_kw: f64,
}

/// Collection-wide demand totals.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DemandTotals {
    pub clusters: usize,
    pub population: f64,
    pub baseline_demand_mwh_year: f64,
    pub baseline_peak_kw: f64,
    pub horizon_year: i32,
    pub horizon_demand_mwh_year: f64,
    pub horizon_peak_kw: f64,
}

impl DemandTotals {
    pub fn from_records(records: &[DemandRecord], horizon_year: i32) -> Self {
        records.iter().fold(
            Self {
                horizon_year,
                ..Self::default()
            },
            |mut t, r| {
                t.clusters += 1;
                t.population += r.estimated_population;
                t.baseline_demand_mwh_year += r.baseline_demand_mwh_year;
                t.baseline_peak_kw += r.baseline_peak_kw;
                t.horizon_demand_mwh_year += r.horizon_demand_mwh_year;
                t.horizon_peak_kw += r.horizon_peak_kw;
                t
            },
        )
    }
}

fn has_access(status: ElectrificationStatus) -> bool {
    status != ElectrificationStatus::Unelectrified
}

/// Projects demand for scored clusters.
#[derive(Debug, Clone)]
pub struct DemandProjector {
    config: DemandConfig,
}

impl DemandProjector {
    pub fn new(config: DemandConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DemandConfig {
        &self.config
    }

    fn years(&self) -> i32 {
        (self.config.horizon_year - self.config.base_year).max(0)
    }

    /// Annual consumption of one household by status (kWh, `>= 0`).
    pub fn household_demand_kwh(&self, status: ElectrificationStatus, energy_need_score: f64) -> f64 {
        let hd = &self.config.household_demand;
        let kwh = match status {
            ElectrificationStatus::Electrified => {
                hd.electrified_base_kwh - energy_need_score * hd.electrified_need_discount_kwh
            }
            ElectrificationStatus::Partial => hd.partial_kwh,
            ElectrificationStatus::Unelectrified => hd.unelectrified_kwh,
        };
        kwh.max(0.0)
    }

    /// Annual population growth rate for a building density.
    pub fn population_growth_rate(&self, building_density: f64) -> f64 {
        let pg = &self.config.population_growth;
        if building_density >= pg.urban_density_threshold {
            pg.urban_rate
        } else if building_density >= pg.peri_urban_density_threshold {
            pg.peri_urban_rate
        } else {
            pg.rural_rate
        }
    }

    /// Peak load (kW) for an annual demand (MWh) under the configured load factor.
    pub fn peak_kw(&self, demand_mwh_year: f64) -> f64 {
        demand_mwh_year * 1000.0 / (HOURS_PER_YEAR * self.config.load_factor.max(MIN_LOAD_FACTOR))
    }

    /// Collection-wide uplift added to every cluster's electrified fraction.
    ///
    /// The gap between the target rate and the current share of clusters with
    /// any access (partial or electrified), clipped to `[0, 1]`. Zero for an
    /// empty collection.
    pub fn electrification_uplift(&self, clusters: &[ScoredCluster]) -> f64 {
        if clusters.is_empty() {
            return 0.0;
        }
        let electrified = clusters
            .iter()
            .filter(|c| has_access(c.cluster.electrification_status))
            .count();
        let current = electrified as f64 / clusters.len() as f64;
        (self.config.electrification_target_rate - current).clamp(0.0, 1.0)
    }

    /// Projects one cluster given the collection-wide uplift.
    pub fn project(&self, scored: &ScoredCluster, uplift: f64) -> DemandRecord {
        let c = &self.config;
        let cluster = &scored.cluster;
        let population = cluster.estimated_population.max(0.0);
        let status = cluster.electrification_status;

        let households = population * c.households_per_person;
        let per_household = self.household_demand_kwh(status, cluster.energy_need_score);
        let baseline_mwh = households * per_household / 1000.0;

        let years = self.years();
        let horizon_population =
            population * compound(self.population_growth_rate(cluster.building_density), years);
        let currently = if has_access(status) { 1.0 } else { 0.0 };
        let electrified_fraction = (currently + uplift).clamp(0.0, 1.0);
        let per_person_kwh = c.per_person_kwh * compound(c.consumption_growth_rate, years);
        let horizon_mwh = horizon_population * electrified_fraction * per_person_kwh / 1000.0;

        DemandRecord {
            cluster_id: cluster.cluster_id,
            estimated_population: population,
            electrification_status: status,
            households,
            demand_per_household_kwh: per_household,
            baseline_demand_mwh_year: baseline_mwh,
            baseline_peak_kw: self.peak_kw(baseline_mwh),
            horizon_year: c.horizon_year,
            horizon_population,
            horizon_demand_mwh_year: horizon_mwh,
            horizon_peak_kw: self.peak_kw(horizon_mwh),
        }
    }

    /// Projects every cluster, preserving input order.
    pub fn project_all(&self, clusters: &[ScoredCluster]) -> Vec<DemandRecord> {
        let uplift = self.electrification_uplift(clusters);
        debug!(uplift, clusters = clusters.len(), "projecting demand");
        clusters.iter().map(|c| self.project(c, uplift)).collect()
    }

    /// Yearly demand and peak for every record, base year to horizon.
    ///
    /// Records are emitted in input order, years ascending within a record.
    pub fn trajectories(&self, records: &[DemandRecord]) -> Vec<TrajectoryPoint> {
        records
            .iter()
            .flat_map(|r| {
                self.demand_trajectory(r)
                    .into_iter()
                    .zip(self.peak_trajectory(r))
                    .map(move |(demand, peak)| TrajectoryPoint {
                        cluster_id: r.cluster_id,
                        year: demand.year,
                        demand_mwh_year: demand.value,
                        peak_kw: peak.value,
                    })
            })
            .collect()
    }

    /// Year-by-year demand (MWh) from the base year to the horizon.
    pub fn demand_trajectory(&self, record: &DemandRecord) -> Vec<YearValue> {
        trajectory(
            record.baseline_demand_mwh_year,
            record.horizon_demand_mwh_year,
            self.config.base_year,
            record.horizon_year,
        )
    }

    /// Year-by-year peak load (kW) from the base year to the horizon.
    pub fn peak_trajectory(&self, record: &DemandRecord) -> Vec<YearValue> {
        trajectory(
            record.baseline_peak_kw,
            record.horizon_peak_kw,
            self.config.base_year,
            record.horizon_year,
        )
    }
}
