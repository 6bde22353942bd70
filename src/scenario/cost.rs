//! Capital cost model for electrification interventions.

use crate::cluster::Solution;
use crate::config::{CostConfig, DemandConfig};

/// Estimates intervention cost in USD from population and distance.
#[derive(Debug, Clone)]
pub struct CostModel {
    config: CostConfig,
    households_per_person: f64,
}

impl CostModel {
    /// `households_per_person` comes from `[demand]` so demand and cost
    /// agree on household counts.
    pub fn new(config: CostConfig, households_per_person: f64) -> Self {
        Self {
            config,
            households_per_person,
        }
    }

    /// Households served for a given population.
    pub fn households(&self, population: f64) -> f64 {
        population.max(0.0) * self.households_per_person
    }

    /// Estimated capital cost of electrifying one cluster.
    ///
    /// # Arguments
    ///
    /// * `solution` - Intervention type; every `mini_grid*` variant shares one formula
    /// * `population` - Population served
    /// * `distance_km` - Distance to power infrastructure (grid extension only)
    ///
    /// # Returns
    ///
    /// Cost in USD, always `>= 0`.
    pub fn cost(&self, solution: Solution, population: f64, distance_km: f64) -> f64 {
        let c = &self.config;
        let households = self.households(population);
        let cost = if solution == Solution::GridExtension {
            distance_km.max(0.0) * c.grid_cost_per_km + households * c.grid_cost_per_household
        } else if solution.is_mini_grid() {
            households * c.mini_grid_kw_per_household * c.mini_grid_cost_per_kw
                + households * c.mini_grid_cost_per_household
        } else {
            households * c.default_cost_per_household
        };
        cost.max(0.0)
    }

    /// Cost divided by population, or 0 when nobody is served.
    pub fn cost_per_person(cost: f64, population: f64) -> f64 {
        if population > 0.0 { cost / population } else { 0.0 }
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self::new(
            CostConfig::default(),
            DemandConfig::default().households_per_person,
        )
    }
}
