//! Human-readable scenario comparison table.

use std::fmt;

use crate::scenario::ScenarioResult;

/// Scenario results prepared for display.
#[derive(Debug, Clone)]
pub struct ComparisonTable {
    rows: Vec<ScenarioResult>,
}

impl ComparisonTable {
    /// Keeps `results` in the order given.
    pub fn new(results: Vec<ScenarioResult>) -> Self {
        Self { rows: results }
    }

    /// Orders rows by people electrified (descending), then by cost per
    /// person (ascending). Equal rows keep their original order.
    pub fn ranked(mut self) -> Self {
        self.rows.sort_by(|a, b| {
            b.people_electrified
                .total_cmp(&a.people_electrified)
                .then_with(|| a.cost_per_person_usd.total_cmp(&b.cost_per_person_usd))
        });
        self
    }

    pub fn rows(&self) -> &[ScenarioResult] {
        &self.rows
    }

    /// Row with the lowest cost per newly electrified person, ignoring
    /// scenarios that electrify nobody.
    pub fn most_cost_effective(&self) -> Option<&ScenarioResult> {
        self.rows
            .iter()
            .filter(|r| r.people_electrified > 0.0)
            .min_by(|a, b| a.cost_per_person_usd.total_cmp(&b.cost_per_person_usd))
    }
}

impl fmt::Display for ComparisonTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Scenario Comparison ---")?;
        writeln!(
            f,
            "{:<28} {:>12} {:>8} {:>14} {:>14} {:>10} {:>8}",
            "Scenario", "People", "Sites", "Demand +MWh", "Cost USD", "USD/pers", "Rate"
        )?;
        for r in &self.rows {
            writeln!(
                f,
                "{:<28} {:>12.0} {:>8} {:>14.2} {:>14.0} {:>10.2} {:>7.1}%",
                r.scenario_name,
                r.people_electrified,
                r.settlements_connected,
                r.demand_increase_mwh,
                r.cost_usd,
                r.cost_per_person_usd,
                r.electrification_rate * 100.0
            )?;
        }
        match self.most_cost_effective() {
            Some(best) => write!(f, "Most cost-effective:  {}", best.scenario_name),
            None => write!(f, "Most cost-effective:  n/a"),
        }
    }
}
