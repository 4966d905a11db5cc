//! Breakpoint curves with linear interpolation.
//!
//! Used for lookup tables such as SOC → open-circuit voltage. Outside the
//! table domain the curve extrapolates linearly along the first/last segment
//! slope rather than clamping, so a saturated state estimator still produces
//! a smooth, monotone voltage trend.

use crate::error::{PvError, PvResult};
use serde::{Deserialize, Serialize};

/// An ordered `(x, f(x))` breakpoint table.
///
/// Knots must be strictly increasing in x; at least two are required so the
/// endpoint segments have a defined slope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(f64, f64)>", into = "Vec<(f64, f64)>")]
pub struct Curve {
    points: Vec<(f64, f64)>,
}

impl Curve {
    pub fn new(points: Vec<(f64, f64)>) -> PvResult<Self> {
        if points.len() < 2 {
            return Err(PvError::Validation(
                "curve needs at least two breakpoints".into(),
            ));
        }
        for pair in points.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(PvError::Validation(format!(
                    "curve breakpoints must be strictly increasing in x (found {} after {})",
                    pair[1].0, pair[0].0
                )));
            }
        }
        if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(PvError::Validation("curve breakpoints must be finite".into()));
        }
        Ok(Self { points })
    }

    /// Number of breakpoints.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Domain of the table, `(first x, last x)`.
    pub fn domain(&self) -> (f64, f64) {
        (self.points[0].0, self.points[self.points.len() - 1].0)
    }

    /// Sample the curve at `x`.
    ///
    /// Within the domain this interpolates linearly between the bracketing
    /// knots and is exact at the knots. Outside the domain it extrapolates
    /// along the endpoint segment, never clamping.
    pub fn sample(&self, x: f64) -> f64 {
        let n = self.points.len();
        // Pick the segment: the last one whose left knot is <= x, with the
        // endpoint segments covering everything beyond the domain.
        let seg = match self.points.iter().position(|&(px, _)| px > x) {
            Some(0) => 0,
            Some(idx) => idx - 1,
            None => n - 2,
        };
        let (x0, y0) = self.points[seg];
        let (x1, y1) = self.points[seg + 1];
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }
}

impl TryFrom<Vec<(f64, f64)>> for Curve {
    type Error = PvError;
    fn try_from(points: Vec<(f64, f64)>) -> PvResult<Self> {
        Curve::new(points)
    }
}

impl From<Curve> for Vec<(f64, f64)> {
    fn from(curve: Curve) -> Self {
        curve.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Curve {
        Curve::new(vec![(0.0, 42.0), (0.5, 51.2), (1.0, 54.6)]).unwrap()
    }

    #[test]
    fn test_rejects_short_and_unsorted() {
        assert!(Curve::new(vec![(0.0, 1.0)]).is_err());
        assert!(Curve::new(vec![(0.0, 1.0), (0.0, 2.0)]).is_err());
        assert!(Curve::new(vec![(1.0, 1.0), (0.5, 2.0)]).is_err());
    }

    #[test]
    fn test_exact_at_knots() {
        let c = table();
        assert_eq!(c.sample(0.0), 42.0);
        assert_eq!(c.sample(0.5), 51.2);
        assert_eq!(c.sample(1.0), 54.6);
    }

    #[test]
    fn test_interpolation_between_knots() {
        let c = table();
        assert!((c.sample(0.25) - 46.6).abs() < 1e-12);
        assert!((c.sample(0.75) - 52.9).abs() < 1e-12);
    }

    #[test]
    fn test_extrapolates_below_domain() {
        let c = table();
        // First segment slope is (51.2 - 42.0) / 0.5 = 18.4 per unit x
        assert!((c.sample(-0.1) - (42.0 - 1.84)).abs() < 1e-12);
    }

    #[test]
    fn test_extrapolates_above_domain() {
        let c = table();
        // Last segment slope is (54.6 - 51.2) / 0.5 = 6.8 per unit x
        assert!((c.sample(1.1) - (54.6 + 0.68)).abs() < 1e-12);
    }

    #[test]
    fn test_serde_roundtrip() {
        let c = table();
        let json = serde_json::to_string(&c).unwrap();
        let back: Curve = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_serde_rejects_invalid() {
        let unsorted = "[[1.0, 0.0], [0.0, 1.0]]";
        assert!(serde_json::from_str::<Curve>(unsorted).is_err());
    }
}
