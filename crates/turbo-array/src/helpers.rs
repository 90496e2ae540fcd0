//! Convenience wrappers over the pipeline entry points.

use crate::descriptor::Operation;
use crate::engine::Engine;
use crate::error::Result;
use crate::pipeline::Summary;

impl Engine {
    pub fn sum(&self, array: &[f64]) -> Result<f64> {
        self.reduce(array, &Operation::symbol("+"), 0.0)
    }

    /// Arithmetic mean, `0` for an empty array.
    pub fn average(&self, array: &[f64]) -> f64 {
        let summary = Summary::of(array);
        if summary.count == 0 {
            0.0
        } else {
            summary.avg()
        }
    }

    pub fn square(&self, array: &[f64]) -> Result<Vec<f64>> {
        self.map(array, &Operation::expr("x * x"))
    }

    pub fn power(&self, array: &[f64], exponent: f64) -> Result<Vec<f64>> {
        self.map(array, &Operation::op("^", exponent))
    }

    pub fn sin(&self, array: &[f64]) -> Result<Vec<f64>> {
        self.map(array, &Operation::expr("sin(x)"))
    }

    pub fn cos(&self, array: &[f64]) -> Result<Vec<f64>> {
        self.map(array, &Operation::expr("cos(x)"))
    }

    pub fn sqrt(&self, array: &[f64]) -> Result<Vec<f64>> {
        self.map(array, &Operation::symbol("sqrt"))
    }

    pub fn abs(&self, array: &[f64]) -> Result<Vec<f64>> {
        self.map(array, &Operation::symbol("abs"))
    }

    /// Min-max scaling onto `[0, 1]`. A constant array maps to NaN (`0 / 0`).
    pub fn normalize(&self, array: &[f64]) -> Vec<f64> {
        let summary = Summary::of(array);
        let span = summary.max - summary.min;
        array.iter().map(|x| (x - summary.min) / span).collect()
    }
}

/// `start, start + step, ...` with `floor((end - start) / step) + 1` values.
///
/// Empty when the count is not a positive finite number, which covers a zero
/// step and a step pointing away from `end`.
pub fn range(start: f64, end: f64, step: f64) -> Vec<f64> {
    let count = ((end - start) / step).floor() + 1.0;
    if !count.is_finite() || count < 1.0 {
        return Vec::new();
    }
    (0..count as usize).map(|i| start + i as f64 * step).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range() {
        assert_eq!(range(0.0, 4.0, 1.0), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(range(0.0, 1.0, 0.5), vec![0.0, 0.5, 1.0]);
        assert_eq!(range(5.0, 1.0, -2.0), vec![5.0, 3.0, 1.0]);
        assert_eq!(range(0.0, 3.5, 1.0), vec![0.0, 1.0, 2.0, 3.0]);
        assert!(range(0.0, 4.0, 0.0).is_empty());
        assert!(range(4.0, 0.0, 1.0).is_empty());
        assert!(range(0.0, f64::NAN, 1.0).is_empty());
    }

    #[test]
    fn test_helpers() {
        let engine = Engine::default();
        let data = [1.0, -2.0, 3.0];
        assert_eq!(engine.sum(&data).unwrap(), 2.0);
        assert_eq!(engine.average(&[1.0, 2.0, 3.0, 4.0]), 2.5);
        assert_eq!(engine.average(&[]), 0.0);
        assert_eq!(engine.square(&data).unwrap(), vec![1.0, 4.0, 9.0]);
        assert_eq!(engine.power(&data, 3.0).unwrap(), vec![1.0, -8.0, 27.0]);
        assert_eq!(engine.abs(&data).unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(engine.sqrt(&[4.0, 9.0]).unwrap(), vec![2.0, 3.0]);
        assert_eq!(engine.sin(&[0.0]).unwrap(), vec![0.0]);
        assert_eq!(engine.cos(&[0.0]).unwrap(), vec![1.0]);
    }

    #[test]
    fn test_normalize() {
        let engine = Engine::default();
        assert_eq!(
            engine.normalize(&[2.0, 4.0, 6.0]),
            vec![0.0, 0.5, 1.0]
        );
        assert!(engine.normalize(&[]).is_empty());
        assert!(engine.normalize(&[3.0, 3.0])[0].is_nan());
    }
}
