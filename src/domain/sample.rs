// Power-flow sample domain model
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub timestamp: i64,
    pub generation: f64,
    pub usage: f64,
    pub grid_flow: f64,
    pub self_sufficient: bool,
}

/// A sample as handed to the renderer. Aggregated points carry a bucket
/// midpoint timestamp, zero-crossing points an interpolated one.
pub type RenderedPoint = Sample;

impl Sample {
    /// Build a sample from raw display-unit values, rounding each to
    /// `precision` decimals. Non-finite inputs are stored as 0.
    pub fn aggregate(
        timestamp: i64,
        generation: f64,
        usage: f64,
        grid_flow: f64,
        precision: u32,
    ) -> Self {
        let grid_flow = round_to(grid_flow, precision);
        Self {
            timestamp,
            generation: round_to(generation, precision),
            usage: round_to(usage, precision),
            grid_flow,
            self_sufficient: grid_flow >= 0.0,
        }
    }
}

pub fn round_to(value: f64, precision: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let scale = 10f64.powi(precision as i32);
    let rounded = (value * scale).round() / scale;
    if rounded.is_finite() { rounded } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_rounds_and_flags() {
        let s = Sample::aggregate(10, 1.23456, 2.0, -0.7654, 2);
        assert_eq!(s.generation, 1.23);
        assert_eq!(s.grid_flow, -0.77);
        assert!(!s.self_sufficient);

        let s = Sample::aggregate(10, 0.0, 0.0, 0.0, 2);
        assert!(s.self_sufficient);
    }

    #[test]
    fn test_non_finite_stored_as_zero() {
        let s = Sample::aggregate(0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 3);
        assert_eq!((s.generation, s.usage, s.grid_flow), (0.0, 0.0, 0.0));
        assert!(s.self_sufficient);
    }

    #[test]
    fn test_tiny_negative_rounds_to_export() {
        let s = Sample::aggregate(0, 0.0, 0.0, -0.001, 2);
        assert!(s.self_sufficient);
    }
}
