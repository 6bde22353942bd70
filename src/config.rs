//! TOML-based engine configuration and preset definitions.
//!
//! Every tunable constant of the pipeline lives here: scoring weights and
//! thresholds, recommendation rules, demand coefficients, the cost model,
//! intervention uplifts, and the scenario list. All fields have defaults, so
//! an empty TOML document yields [`EngineConfig::baseline`].

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::scenario::ScenarioConfig;

/// Tolerance used when checking that scoring weights sum to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Top-level engine configuration parsed from TOML.
///
/// Load from TOML with [`EngineConfig::from_toml_file`] or use
/// [`EngineConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Ingestion defaults for missing upstream fields.
    #[serde(default)]
    pub ingest: IngestConfig,
    /// Composite scoring and recommendation rules.
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Demand projection coefficients.
    #[serde(default)]
    pub demand: DemandConfig,
    /// Intervention cost model.
    #[serde(default)]
    pub cost: CostConfig,
    /// Demand uplifts applied by scenario interventions.
    #[serde(default)]
    pub interventions: InterventionConfig,
    /// Scenarios compared on every run.
    #[serde(default = "ScenarioConfig::predefined")]
    pub scenarios: Vec<ScenarioConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::baseline()
    }
}

/// Ingestion defaults for missing upstream fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    /// Absolute population represented by a population index of 1.0.
    pub population_scale: f64,
    /// Need score at or above which a cluster is treated as unelectrified.
    pub unelectrified_min_need: f64,
    /// Need score at or above which a cluster is treated as partially electrified.
    pub partial_min_need: f64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            population_scale: 5000.0,
            unelectrified_min_need: 60.0,
            partial_min_need: 40.0,
        }
    }
}

/// Composite scoring and recommendation rules.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    pub weights: Weights,
    pub thresholds: Thresholds,
    pub recommendation: RecommendationRules,
    pub social_fallback: SocialFallback,
}

/// Composite score weights. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Weights {
    pub population: f64,
    pub access_gap: f64,
    pub economic: f64,
    pub social_need: f64,
    pub grid_proximity: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            population: 0.30,
            access_gap: 0.25,
            economic: 0.20,
            social_need: 0.15,
            grid_proximity: 0.10,
        }
    }
}

impl Weights {
    /// Sum of all five weights.
    pub fn sum(&self) -> f64 {
        self.population + self.access_gap + self.economic + self.social_need + self.grid_proximity
    }

    /// Checks that every weight is non-negative and the total is 1.0.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` on the `scoring.weights` field otherwise.
    pub fn check(&self) -> Result<(), ConfigError> {
        let all = [
            self.population,
            self.access_gap,
            self.economic,
            self.social_need,
            self.grid_proximity,
        ];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ConfigError::new(
                "scoring.weights",
                "every weight must be finite and >= 0",
            ));
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::new(
                "scoring.weights",
                format!("must sum to 1.0, got {sum}"),
            ));
        }
        Ok(())
    }
}

/// Priority category cut-offs on the 0–10 composite scale.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Thresholds {
    pub high: f64,
    pub medium: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            high: 7.0,
            medium: 5.0,
        }
    }
}

impl Thresholds {
    /// # Errors
    ///
    /// Returns a `ConfigError` unless `medium <= high`.
    pub fn check(&self) -> Result<(), ConfigError> {
        if !(self.medium <= self.high) {
            return Err(ConfigError::new(
                "scoring.thresholds.medium",
                "must be <= scoring.thresholds.high",
            ));
        }
        Ok(())
    }
}

/// First-match recommendation rules.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecommendationRules {
    /// Grid extension within this distance (km)...
    pub grid_max_distance_km: f64,
    /// ...and at or above this population index.
    pub grid_min_population_index: f64,
    /// Hybrid mini-grid within this distance (km)...
    pub hybrid_max_distance_km: f64,
    /// ...at or above this population index...
    pub hybrid_min_population_index: f64,
    /// ...and at or above this road score.
    pub hybrid_min_road_score: f64,
    /// Standalone solar when farther than this (km)...
    pub standalone_min_distance_km: f64,
    /// ...and the population index is below this.
    pub standalone_max_population_index: f64,
}

impl Default for RecommendationRules {
    fn default() -> Self {
        Self {
            grid_max_distance_km: 5.0,
            grid_min_population_index: 0.6,
            hybrid_max_distance_km: 15.0,
            hybrid_min_population_index: 0.3,
            hybrid_min_road_score: 0.5,
            standalone_min_distance_km: 25.0,
            standalone_max_population_index: 0.2,
        }
    }
}

/// Social-need proxy used when no survey data exists.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SocialFallback {
    /// Population index at which the proxy peaks.
    pub peak_population_index: f64,
}

impl Default for SocialFallback {
    fn default() -> Self {
        Self {
            peak_population_index: 0.4,
        }
    }
}

/// Demand projection coefficients.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemandConfig {
    /// Year of the baseline figures.
    pub base_year: i32,
    /// Year of the horizon projection.
    pub horizon_year: i32,
    /// Households per person, shared by the demand and cost models.
    pub households_per_person: f64,
    /// Annual average load over peak load, in (0, 1].
    pub load_factor: f64,
    /// Annual consumption per newly electrified person at the base year (kWh).
    pub per_person_kwh: f64,
    /// Annual growth of per-person consumption.
    pub consumption_growth_rate: f64,
    /// Target electrified fraction used to derive the horizon uplift.
    pub electrification_target_rate: f64,
    pub household_demand: HouseholdDemand,
    pub population_growth: PopulationGrowth,
}

impl Default for DemandConfig {
    fn default() -> Self {
        Self {
            base_year: 2024,
            horizon_year: 2030,
            households_per_person: 0.3,
            load_factor: 0.3,
            per_person_kwh: 500.0,
            consumption_growth_rate: 0.025,
            electrification_target_rate: 0.8,
            household_demand: HouseholdDemand::default(),
            population_growth: PopulationGrowth::default(),
        }
    }
}

/// Annual household consumption by electrification status (kWh).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HouseholdDemand {
    pub electrified_base_kwh: f64,
    /// Subtracted per point of energy need score from the electrified base.
    pub electrified_need_discount_kwh: f64,
    pub partial_kwh: f64,
    pub unelectrified_kwh: f64,
}

impl Default for HouseholdDemand {
    fn default() -> Self {
        Self {
            electrified_base_kwh: 2000.0,
            electrified_need_discount_kwh: 5.0,
            partial_kwh: 800.0,
            unelectrified_kwh: 450.0,
        }
    }
}

/// Population growth rate by building-density class.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PopulationGrowth {
    /// Density above which a cluster is urban.
    pub urban_density_threshold: f64,
    /// Density above which a cluster is peri-urban.
    pub peri_urban_density_threshold: f64,
    pub urban_rate: f64,
    pub peri_urban_rate: f64,
    pub rural_rate: f64,
}

impl Default for PopulationGrowth {
    fn default() -> Self {
        Self {
            urban_density_threshold: 100.0,
            peri_urban_density_threshold: 50.0,
            urban_rate: 0.035,
            peri_urban_rate: 0.025,
            rural_rate: 0.015,
        }
    }
}

/// Intervention cost model coefficients (USD).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CostConfig {
    pub grid_cost_per_km: f64,
    pub grid_cost_per_household: f64,
    pub mini_grid_kw_per_household: f64,
    pub mini_grid_cost_per_kw: f64,
    pub mini_grid_cost_per_household: f64,
    pub default_cost_per_household: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            grid_cost_per_km: 1000.0,
            grid_cost_per_household: 200.0,
            mini_grid_kw_per_household: 0.5,
            mini_grid_cost_per_kw: 1500.0,
            mini_grid_cost_per_household: 300.0,
            default_cost_per_household: 500.0,
        }
    }
}

/// Demand multipliers applied when a cluster receives an intervention.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterventionConfig {
    pub grid_demand_uplift: f64,
    pub mini_grid_demand_uplift: f64,
}

impl Default for InterventionConfig {
    fn default() -> Self {
        Self {
            grid_demand_uplift: 1.5,
            mini_grid_demand_uplift: 1.3,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"demand.load_factor"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {} — {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl EngineConfig {
    /// Returns the baseline configuration with the predefined scenario set.
    pub fn baseline() -> Self {
        Self {
            ingest: IngestConfig::default(),
            scoring: ScoringConfig::default(),
            demand: DemandConfig::default(),
            cost: CostConfig::default(),
            interventions: InterventionConfig::default(),
            scenarios: ScenarioConfig::predefined(),
        }
    }

    /// Returns the high-growth preset: faster population and consumption
    /// growth, and every scenario grown accordingly.
    pub fn high_growth() -> Self {
        let mut cfg = Self::baseline();
        cfg.demand.consumption_growth_rate = 0.05;
        cfg.demand.population_growth = PopulationGrowth {
            urban_rate: 0.045,
            peri_urban_rate: 0.035,
            rural_rate: 0.025,
            ..PopulationGrowth::default()
        };
        for s in &mut cfg.scenarios {
            s.population_growth = s.population_growth.max(0.15);
            s.demand_growth = s.demand_growth.max(0.30);
        }
        cfg
    }

    /// Returns the accelerated-access preset: a higher electrification target
    /// and larger intervention budgets in every scenario.
    pub fn accelerated_access() -> Self {
        let mut cfg = Self::baseline();
        cfg.demand.electrification_target_rate = 0.95;
        for s in &mut cfg.scenarios {
            s.grid_count = s.grid_count.saturating_mul(2);
            s.mini_grid_count = s.mini_grid_count.saturating_mul(2);
        }
        cfg
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "high_growth", "accelerated_access"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "high_growth" => Ok(Self::high_growth()),
            "accelerated_access" => Ok(Self::accelerated_access()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] listing every violated invariant.
    pub fn load(path: &Path) -> Result<Self, Error> {
        Self::from_toml_file(path)?.into_validated()
    }

    /// Consumes the configuration, returning it only if it validates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] listing every violated invariant.
    pub fn into_validated(self) -> Result<Self, Error> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(Error::InvalidConfig(errors))
        }
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let ing = &self.ingest;
        non_negative(&mut errors, "ingest.population_scale", ing.population_scale);
        if !(ing.partial_min_need <= ing.unelectrified_min_need) {
            errors.push(ConfigError::new(
                "ingest.partial_min_need",
                "must be <= ingest.unelectrified_min_need",
            ));
        }

        if let Err(e) = self.scoring.weights.check() {
            errors.push(e);
        }
        if let Err(e) = self.scoring.thresholds.check() {
            errors.push(e);
        }
        let rec = &self.scoring.recommendation;
        if !(rec.grid_max_distance_km <= rec.hybrid_max_distance_km) {
            errors.push(ConfigError::new(
                "scoring.recommendation.grid_max_distance_km",
                "must be <= scoring.recommendation.hybrid_max_distance_km",
            ));
        }

        let d = &self.demand;
        if d.horizon_year < d.base_year {
            errors.push(ConfigError::new(
                "demand.horizon_year",
                "must be >= demand.base_year",
            ));
        }
        if !(d.load_factor > 0.0 && d.load_factor <= 1.0) {
            errors.push(ConfigError::new("demand.load_factor", "must be in (0, 1]"));
        }
        if !(d.households_per_person > 0.0) {
            errors.push(ConfigError::new(
                "demand.households_per_person",
                "must be > 0",
            ));
        }
        if !(0.0..=1.0).contains(&d.electrification_target_rate) {
            errors.push(ConfigError::new(
                "demand.electrification_target_rate",
                "must be in [0.0, 1.0]",
            ));
        }
        non_negative(&mut errors, "demand.per_person_kwh", d.per_person_kwh);
        non_negative(
            &mut errors,
            "demand.consumption_growth_rate",
            d.consumption_growth_rate,
        );
        let hd = &d.household_demand;
        non_negative(
            &mut errors,
            "demand.household_demand.electrified_base_kwh",
            hd.electrified_base_kwh,
        );
        non_negative(
            &mut errors,
            "demand.household_demand.electrified_need_discount_kwh",
            hd.electrified_need_discount_kwh,
        );
        non_negative(&mut errors, "demand.household_demand.partial_kwh", hd.partial_kwh);
        non_negative(
            &mut errors,
            "demand.household_demand.unelectrified_kwh",
            hd.unelectrified_kwh,
        );
        let pg = &d.population_growth;
        if !(pg.peri_urban_density_threshold <= pg.urban_density_threshold) {
            errors.push(ConfigError::new(
                "demand.population_growth.peri_urban_density_threshold",
                "must be <= demand.population_growth.urban_density_threshold",
            ));
        }
        non_negative(&mut errors, "demand.population_growth.urban_rate", pg.urban_rate);
        non_negative(
            &mut errors,
            "demand.population_growth.peri_urban_rate",
            pg.peri_urban_rate,
        );
        non_negative(&mut errors, "demand.population_growth.rural_rate", pg.rural_rate);

        let c = &self.cost;
        non_negative(&mut errors, "cost.grid_cost_per_km", c.grid_cost_per_km);
        non_negative(&mut errors, "cost.grid_cost_per_household", c.grid_cost_per_household);
        non_negative(
            &mut errors,
            "cost.mini_grid_kw_per_household",
            c.mini_grid_kw_per_household,
        );
        non_negative(&mut errors, "cost.mini_grid_cost_per_kw", c.mini_grid_cost_per_kw);
        non_negative(
            &mut errors,
            "cost.mini_grid_cost_per_household",
            c.mini_grid_cost_per_household,
        );
        non_negative(
            &mut errors,
            "cost.default_cost_per_household",
            c.default_cost_per_household,
        );

        let iv = &self.interventions;
        non_negative(&mut errors, "interventions.grid_demand_uplift", iv.grid_demand_uplift);
        non_negative(
            &mut errors,
            "interventions.mini_grid_demand_uplift",
            iv.mini_grid_demand_uplift,
        );

        // Scenario artifacts are named by slug, so slugs must be unique too.
        let mut names = HashSet::new();
        let mut slugs: HashMap<String, &str> = HashMap::new();
        for (i, s) in self.scenarios.iter().enumerate() {
            if s.name.trim().is_empty() {
                errors.push(ConfigError::new(
                    format!("scenarios[{i}].name"),
                    "must not be empty",
                ));
            } else if !names.insert(s.name.as_str()) {
                errors.push(ConfigError::new(
                    format!("scenarios[{i}].name"),
                    format!("duplicate scenario name \"{}\"", s.name),
                ));
            } else if let Some(other) = slugs.insert(s.slug(), s.name.as_str()) {
                errors.push(ConfigError::new(
                    format!("scenarios[{i}].name"),
                    format!(
                        "\"{}\" and \"{other}\" share the artifact name \"{}\"",
                        s.name,
                        s.slug()
                    ),
                ));
            }
            non_negative(
                &mut errors,
                &format!("scenarios[{i}].population_growth"),
                s.population_growth,
            );
            non_negative(
                &mut errors,
                &format!("scenarios[{i}].demand_growth"),
                s.demand_growth,
            );
            non_negative(
                &mut errors,
                &format!("scenarios[{i}].solar_capacity_mw"),
                s.solar_capacity_mw,
            );
        }

        errors
    }
}

fn non_negative(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !(value.is_finite() && value >= 0.0) {
        errors.push(ConfigError::new(field, "must be finite and >= 0"));
    }
}
