//! Property tests for the pipeline invariants.

use proptest::prelude::*;
use turbo_array::{ChainOperation, Engine, Env, Expression, Operation};

fn finite() -> impl Strategy<Value = f64> {
    -1.0e6..1.0e6f64
}

proptest! {
    #[test]
    fn map_preserves_length_and_order(data in prop::collection::vec(finite(), 0..64)) {
        let engine = Engine::default();
        let out = engine.map(&data, &Operation::expr("x + 1")).unwrap();
        prop_assert_eq!(out.len(), data.len());
        for (x, y) in data.iter().zip(&out) {
            prop_assert_eq!(*y, x + 1.0);
        }
    }

    #[test]
    fn filter_keeps_subsequence(data in prop::collection::vec(finite(), 0..64)) {
        let engine = Engine::default();
        let out = engine.filter(&data, &Operation::op(">", 0.0)).unwrap();
        let expected: Vec<f64> = data.iter().copied().filter(|x| *x > 0.0).collect();
        prop_assert_eq!(out, expected);
    }

    #[test]
    fn reduce_matches_fold(data in prop::collection::vec(finite(), 0..64), initial in finite()) {
        let engine = Engine::default();
        let by_op = engine.reduce(&data, &Operation::symbol("+"), initial).unwrap();
        let by_expr = engine.reduce(&data, &Operation::expr("acc + x"), initial).unwrap();
        let expected = data.iter().fold(initial, |acc, x| acc + x);
        prop_assert_eq!(by_op.to_bits(), expected.to_bits());
        prop_assert_eq!(by_expr.to_bits(), expected.to_bits());
    }

    #[test]
    fn sort_by_key_is_stable(data in prop::collection::vec(-50i32..50, 0..64)) {
        let engine = Engine::default();
        let data: Vec<f64> = data.into_iter().map(f64::from).collect();
        let out = engine.sort_by(&data, &Operation::expr("floor(x / 10)")).unwrap();

        let mut expected: Vec<(usize, f64)> = data.iter().copied().enumerate().collect();
        expected.sort_by(|a, b| (a.1 / 10.0).floor().partial_cmp(&(b.1 / 10.0).floor()).unwrap().then(a.0.cmp(&b.0)));
        let expected: Vec<f64> = expected.into_iter().map(|(_, x)| x).collect();
        prop_assert_eq!(out, expected);
    }

    #[test]
    fn natural_sort_is_ordered(data in prop::collection::vec(finite(), 0..64)) {
        let engine = Engine::default();
        let asc = engine.sort_by(&data, &Operation::symbol("asc")).unwrap();
        let desc = engine.sort_by(&data, &Operation::symbol("desc")).unwrap();
        prop_assert!(asc.windows(2).all(|w| w[0] <= w[1]));
        prop_assert!(desc.windows(2).all(|w| w[0] >= w[1]));
        prop_assert_eq!(asc.len(), data.len());
    }

    #[test]
    fn compile_is_deterministic(a in finite(), b in finite(), x in finite()) {
        let source = format!("({a}) * x ^ 2 + ({b}) * sin(x) - max(x, {a})");
        let first = Expression::compile(&source).unwrap();
        let second = Expression::compile(&source).unwrap();
        prop_assert_eq!(&first, &second);
        let env = Env::element(x);
        prop_assert_eq!(first.eval(&env).unwrap().to_bits(), second.eval(&env).unwrap().to_bits());
    }

    #[test]
    fn chain_equals_sequential_calls(data in prop::collection::vec(finite(), 0..64)) {
        let engine = Engine::default();
        let chained = engine.chain(&data, &[
            ChainOperation::filter(Operation::expr("x > 0")),
            ChainOperation::map(Operation::expr("x * 2")),
            ChainOperation::sort(Operation::symbol("desc")),
        ]).unwrap();
        let filtered = engine.filter(&data, &Operation::expr("x > 0")).unwrap();
        let mapped = engine.map(&filtered, &Operation::expr("x * 2")).unwrap();
        let sorted = engine.sort_by(&mapped, &Operation::symbol("desc")).unwrap();
        prop_assert_eq!(chained, sorted);
    }
}
