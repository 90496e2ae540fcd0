//! Pipeline executor: array entry points built on the dispatcher.
//!
//! Every entry point resolves its descriptors before touching the first
//! element, never mutates its input and returns a fresh result.

use crate::ast::{nan_max, nan_min};
use crate::descriptor::{ChainOperation, Operation, StageKind};
use crate::dispatch::{SortKey, SortOrder, UnaryFn};
use crate::engine::Engine;
use crate::error::Result;
use indexmap::IndexMap;
use log::debug;

/// Buckets produced by `group_by`, in first-seen key order.
pub type Groups = IndexMap<String, Vec<f64>>;

/// Metrics produced by `aggregate`, in request order.
pub type AggregateResult = IndexMap<String, f64>;

/// Element sentinel returned by [`Engine::find`] when nothing matches.
pub const NOT_FOUND: f64 = f64::NAN;

/// Predicate truthiness: anything but exactly zero. NaN is truthy.
pub fn is_truthy(value: f64) -> bool {
    value != 0.0
}

/// Formats a group key: integral values without a fraction (`"3"`, `-0` as
/// `"0"`), other finite values in shortest round-trip form (`"0.5"`), and
/// `"NaN"`, `"Infinity"`, `"-Infinity"`. Magnitudes of `1e21` and above are
/// written out in full rather than in exponent form.
pub fn group_key(key: f64) -> String {
    if key.is_nan() {
        "NaN".to_string()
    } else if key.is_infinite() {
        (if key > 0.0 { "Infinity" } else { "-Infinity" }).to_string()
    } else if key == 0.0 {
        "0".to_string()
    } else {
        key.to_string()
    }
}

/// Aggregate metric names understood by [`Engine::aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

impl Metric {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sum" => Some(Metric::Sum),
            "avg" => Some(Metric::Avg),
            "min" => Some(Metric::Min),
            "max" => Some(Metric::Max),
            "count" => Some(Metric::Count),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Metric::Sum => "sum",
            Metric::Avg => "avg",
            Metric::Min => "min",
            Metric::Max => "max",
            Metric::Count => "count",
        }
    }
}

/// Single-pass statistics over an array.
///
/// `min`/`max` are NaN for an empty array or when any element is NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    pub fn of(array: &[f64]) -> Self {
        let mut summary = Summary {
            count: 0,
            sum: 0.0,
            min: f64::NAN,
            max: f64::NAN,
        };
        for &x in array {
            if summary.count == 0 {
                summary.min = x;
                summary.max = x;
            } else {
                summary.min = nan_min(summary.min, x);
                summary.max = nan_max(summary.max, x);
            }
            summary.count += 1;
            summary.sum += x;
        }
        summary
    }

    /// `sum / count`; NaN when empty.
    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.sum / self.count as f64
        }
    }

    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Sum => self.sum,
            Metric::Avg => self.avg(),
            Metric::Min => self.min,
            Metric::Max => self.max,
            Metric::Count => self.count as f64,
        }
    }
}

enum Stage {
    Map(UnaryFn),
    Filter(UnaryFn),
    Sort(SortKey),
}

impl Engine {
    /// Applies `operation` to every element.
    pub fn map(&self, array: &[f64], operation: &Operation) -> Result<Vec<f64>> {
        let f = self.resolve_unary(operation)?;
        apply_map(&f, array)
    }

    /// Keeps the elements for which `condition` is truthy.
    pub fn filter(&self, array: &[f64], condition: &Operation) -> Result<Vec<f64>> {
        let f = self.resolve_unary(condition)?;
        apply_filter(&f, array)
    }

    /// First element satisfying `condition`, or `None`.
    pub fn find_first(&self, array: &[f64], condition: &Operation) -> Result<Option<f64>> {
        let f = self.resolve_unary(condition)?;
        for &x in array {
            if is_truthy(f(x)?) {
                return Ok(Some(x));
            }
        }
        Ok(None)
    }

    /// First element satisfying `condition`, or [`NOT_FOUND`] (NaN).
    pub fn find(&self, array: &[f64], condition: &Operation) -> Result<f64> {
        Ok(self.find_first(array, condition)?.unwrap_or(NOT_FOUND))
    }

    /// Left fold starting from `initial`. `acc` and `x` are bound for expressions.
    pub fn reduce(&self, array: &[f64], operation: &Operation, initial: f64) -> Result<f64> {
        let f = self.resolve_binary(operation)?;
        array.iter().try_fold(initial, |acc, &x| f(acc, x))
    }

    /// Buckets elements by the stringified numeric key `key(x)`.
    pub fn group_by(&self, array: &[f64], key: &Operation) -> Result<Groups> {
        let f = self.resolve_unary(key)?;
        let mut groups = Groups::new();
        for &x in array {
            groups.entry(group_key(f(x)?)).or_default().push(x);
        }
        Ok(groups)
    }

    /// Stable sort, by natural order for `{op: "asc" | "desc"}` or ascending
    /// by a per-element key otherwise.
    pub fn sort_by(&self, array: &[f64], comparator: &Operation) -> Result<Vec<f64>> {
        let key = self.resolve_sort(comparator)?;
        apply_sort(&key, array)
    }

    /// Runs `stages` in order, each on the previous stage's output.
    ///
    /// All stages are resolved up front, so a bad descriptor anywhere in the
    /// chain fails before any element is processed.
    pub fn chain(&self, array: &[f64], stages: &[ChainOperation]) -> Result<Vec<f64>> {
        let resolved = stages
            .iter()
            .map(|stage| -> Result<Stage> {
                let operation = stage.stage_operation()?;
                Ok(match stage.kind {
                    StageKind::Map => Stage::Map(self.resolve_unary(operation)?),
                    StageKind::Filter => Stage::Filter(self.resolve_unary(operation)?),
                    StageKind::Sort => Stage::Sort(self.resolve_sort(operation)?),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut current = array.to_vec();
        for (i, stage) in resolved.iter().enumerate() {
            let input_len = current.len();
            current = match stage {
                Stage::Map(f) => apply_map(f, &current)?,
                Stage::Filter(f) => apply_filter(f, &current)?,
                Stage::Sort(key) => apply_sort(key, &current)?,
            };
            debug!(
                "chain stage {i} ({:?}): {input_len} -> {} elements",
                stages[i].kind,
                current.len()
            );
        }
        Ok(current)
    }

    /// Computes the requested metrics in one pass. Unknown metric names are
    /// ignored; repeated names appear once.
    pub fn aggregate<I>(&self, array: &[f64], metrics: I) -> AggregateResult
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let summary = Summary::of(array);
        let mut result = AggregateResult::new();
        for name in metrics {
            let name = name.as_ref();
            match Metric::from_name(name) {
                Some(metric) => {
                    result.insert(metric.name().to_string(), summary.metric(metric));
                }
                None => debug!("ignoring unknown aggregate metric {name:?}"),
            }
        }
        result
    }
}

fn apply_map(f: &UnaryFn, array: &[f64]) -> Result<Vec<f64>> {
    array.iter().map(|&x| f(x)).collect()
}

fn apply_filter(f: &UnaryFn, array: &[f64]) -> Result<Vec<f64>> {
    let mut out = Vec::with_capacity(array.len());
    for &x in array {
        if is_truthy(f(x)?) {
            out.push(x);
        }
    }
    Ok(out)
}

fn apply_sort(key: &SortKey, array: &[f64]) -> Result<Vec<f64>> {
    match key {
        SortKey::Natural(order) => {
            let mut out = array.to_vec();
            out.sort_by(|a, b| order.compare(*a, *b));
            Ok(out)
        }
        SortKey::Key(f) => {
            let mut keyed = array
                .iter()
                .map(|&x| -> Result<(f64, f64)> { Ok((f(x)?, x)) })
                .collect::<Result<Vec<(f64, f64)>>>()?;
            keyed.sort_by(|a, b| SortOrder::Asc.compare(a.0, b.0));
            Ok(keyed.into_iter().map(|(_, x)| x).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_key_formatting() {
        assert_eq!(group_key(1.0), "1");
        assert_eq!(group_key(-0.0), "0");
        assert_eq!(group_key(2.5), "2.5");
        assert_eq!(group_key(-3.0), "-3");
        assert_eq!(group_key(f64::NAN), "NaN");
        assert_eq!(group_key(f64::INFINITY), "Infinity");
        assert_eq!(group_key(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(group_key(1e21), "1000000000000000000000");
    }

    #[test]
    fn test_summary() {
        let s = Summary::of(&[3.0, -1.0, 4.0]);
        assert_eq!(s.count, 3);
        assert_eq!(s.sum, 6.0);
        assert_eq!(s.min, -1.0);
        assert_eq!(s.max, 4.0);
        assert_eq!(s.avg(), 2.0);
    }

    #[test]
    fn test_summary_empty() {
        let s = Summary::of(&[]);
        assert_eq!(s.count, 0);
        assert_eq!(s.sum, 0.0);
        assert!(s.min.is_nan());
        assert!(s.max.is_nan());
        assert!(s.avg().is_nan());
    }

    #[test]
    fn test_summary_nan_propagates() {
        let s = Summary::of(&[1.0, f64::NAN, 3.0]);
        assert!(s.sum.is_nan());
        assert!(s.min.is_nan());
        assert!(s.max.is_nan());
        assert_eq!(s.count, 3);
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(0.0));
        assert!(!is_truthy(-0.0));
        assert!(is_truthy(1e-300));
        assert!(is_truthy(f64::NAN));
    }

    #[test]
    fn test_metric_names() {
        for m in [Metric::Sum, Metric::Avg, Metric::Min, Metric::Max, Metric::Count] {
            assert_eq!(Metric::from_name(m.name()), Some(m));
        }
        assert_eq!(Metric::from_name("median"), None);
    }
}
