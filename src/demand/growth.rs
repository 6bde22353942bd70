//! Compound growth and year-by-year interpolation helpers.

use serde::Serialize;

/// Compound growth multiplier `(1 + rate)^years`.
pub fn compound(rate: f64, years: i32) -> f64 {
    (1.0 + rate).powi(years)
}

/// Interpolates between two values at `step` out of `steps`.
///
/// Uses log-space (geometric) interpolation when both endpoints are
/// positive, which matches compound growth between the two; falls back to
/// linear interpolation otherwise. `step` is clamped to `steps`, and zero
/// steps returns `end`.
pub fn interpolate(start: f64, end: f64, step: u32, steps: u32) -> f64 {
    if steps == 0 {
        return end;
    }
    let t = f64::from(step.min(steps)) / f64::from(steps);
    if start > 0.0 && end > 0.0 {
        (start.ln() + t * (end.ln() - start.ln())).exp()
    } else {
        start + t * (end - start)
    }
}

/// A value for one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearValue {
    pub year: i32,
    pub value: f64,
}

/// Yearly values from `base_year` to `horizon_year` inclusive.
///
/// The first and last entries equal `start` and `end` exactly. Returns a
/// single entry when the years coincide and nothing when `horizon_year`
/// precedes `base_year`.
pub fn trajectory(start: f64, end: f64, base_year: i32, horizon_year: i32) -> Vec<YearValue> {
    if horizon_year < base_year {
        return Vec::new();
    }
    let steps = (horizon_year - base_year).unsigned_abs();
    (0..=steps)
        .map(|step| {
            let value = if step == 0 {
                start
            } else if step == steps {
                end
            } else {
                interpolate(start, end, step, steps)
            };
            YearValue {
                year: base_year + step as i32,
                value,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometric_midpoint() {
        let v = interpolate(100.0, 200.0, 3, 6);
        assert!((v - 141.421_356).abs() < 1e-4, "got {v}");
    }

    #[test]
    fn linear_when_an_endpoint_is_zero() {
        assert!((interpolate(0.0, 60.0, 1, 6) - 10.0).abs() < 1e-12);
        assert!((interpolate(60.0, 0.0, 3, 6) - 30.0).abs() < 1e-12);
    }

    #[test]
    fn endpoints_and_degenerate_steps() {
        assert_eq!(interpolate(5.0, 9.0, 0, 4), 5.0);
        assert!((interpolate(5.0, 9.0, 4, 4) - 9.0).abs() < 1e-12);
        assert_eq!(interpolate(5.0, 9.0, 2, 0), 9.0);
    }

    #[test]
    fn trajectory_spans_inclusive_years() {
        let t = trajectory(100.0, 200.0, 2024, 2030);
        assert_eq!(t.len(), 7);
        assert_eq!(t[0], YearValue { year: 2024, value: 100.0 });
        assert_eq!(t[6], YearValue { year: 2030, value: 200.0 });
        assert!(t.windows(2).all(|w| w[1].value >= w[0].value));
    }

    #[test]
    fn trajectory_single_year() {
        let t = trajectory(3.0, 3.0, 2024, 2024);
        assert_eq!(t, vec![YearValue { year: 2024, value: 3.0 }]);
        assert!(trajectory(1.0, 2.0, 2030, 2024).is_empty());
    }

    #[test]
    fn compound_growth() {
        assert!((compound(0.10, 2) - 1.21).abs() < 1e-12);
        assert_eq!(compound(0.5, 0), 1.0);
    }
}
