//! Min-max normalization of one indicator across a cluster collection.

/// Upper bound of the normalized scale.
pub const SCALE_MAX: f64 = 10.0;

/// Value assigned to every element when the input has no spread.
pub const MIDPOINT: f64 = 5.0;

/// Spread at or below which an indicator is treated as constant.
const DEGENERATE_SPREAD: f64 = 1e-12;

/// Maps raw values onto `[0, 10]` by min-max scaling.
///
/// Non-finite inputs are replaced by `0.0` before scaling. When `invert` is
/// set, lower raw values score higher (`10 - scaled`). A collection with no
/// spread maps every element to [`MIDPOINT`]; an empty collection yields an
/// empty vector.
///
/// # Arguments
///
/// * `values` - Raw indicator values, one per cluster
/// * `invert` - Whether lower raw values should score higher
///
/// # Returns
///
/// A vector the same length as `values`, every element in `[0, 10]`.
pub fn normalize(values: &[f64], invert: bool) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }

    let clean: Vec<f64> = values
        .iter()
        .map(|&v| if v.is_finite() { v } else { 0.0 })
        .collect();

    let min = clean.iter().copied().fold(f64::INFINITY, f64::min);
    let max = clean.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let spread = max - min;

    if spread <= DEGENERATE_SPREAD {
        return vec![MIDPOINT; clean.len()];
    }

    clean
        .into_iter()
        .map(|v| {
            let unit = (v - min) / spread;
            let unit = if invert { 1.0 - unit } else { unit };
            (unit * SCALE_MAX).clamp(0.0, SCALE_MAX)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_in_empty_out() {
        assert!(normalize(&[], false).is_empty());
    }

    #[test]
    fn endpoints_map_to_scale_bounds() {
        let out = normalize(&[2.0, 4.0, 6.0], false);
        assert_eq!(out, vec![0.0, 5.0, 10.0]);
    }

    #[test]
    fn inverted_scale() {
        let out = normalize(&[2.0, 4.0, 6.0], true);
        assert_eq!(out, vec![10.0, 5.0, 0.0]);
    }

    #[test]
    fn constant_input_is_midpoint() {
        assert_eq!(normalize(&[3.3, 3.3, 3.3], false), vec![5.0; 3]);
        assert_eq!(normalize(&[7.0], true), vec![5.0]);
    }

    #[test]
    fn non_finite_treated_as_zero() {
        let out = normalize(&[f64::NAN, 10.0, f64::INFINITY], false);
        assert_eq!(out, vec![0.0, 10.0, 0.0]);
    }

    #[test]
    fn output_stays_in_range() {
        let values = [-1e9, 0.0, 1e-9, 42.0, 1e12];
        for v in normalize(&values, false)
            .into_iter()
            .chain(normalize(&values, true))
        {
            assert!((0.0..=SCALE_MAX).contains(&v), "{v} out of range");
        }
    }
}
