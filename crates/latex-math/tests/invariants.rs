//! Cross-cutting properties of the pipeline.

use latex_math::{
    differentiate_parsed, evaluate, evaluate_parsed, expand, parse, simplify, to_latex,
    Environment, Expr, Value,
};
use proptest::prelude::*;

fn value_close(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Numeric(x), Value::Numeric(y)) => {
            (x.is_nan() && y.is_nan()) || (x - y).abs() < 1e-10
        }
        (Value::Complex(x), Value::Complex(y)) => {
            (x.re - y.re).abs() < 1e-10 && (x.im - y.im).abs() < 1e-10
        }
        (Value::Matrix(x), Value::Matrix(y)) => {
            x.rows() == y.rows()
                && x.cols() == y.cols()
                && x.iter().zip(y.iter()).all(|(a, b)| (a - b).abs() < 1e-10)
        }
        _ => false,
    }
}

/// The feature corpus used for round-trip checks.
fn corpus() -> Vec<(&'static str, Environment)> {
    let x3 = Environment::new().with("x", 3.0);
    let xneg = Environment::new().with("x", -4.0);
    let x2 = Environment::new().with("x", 2.0);
    vec![
        ("2 + 3 \\times 4", Environment::new()),
        ("x^{2} + 2x + 1", x3.clone()),
        ("\\frac{1}{2}", Environment::new()),
        ("\\sqrt[3]{27}", Environment::new()),
        ("\\sqrt{16}", Environment::new()),
        ("\\sin{\\pi}", Environment::new()),
        ("|x|", xneg),
        ("\\sum_{i=1}^{5} i^2", Environment::new()),
        ("\\prod_{i=1}^{4} i", Environment::new()),
        ("\\binom{5}{2}", Environment::new()),
        ("\\begin{pmatrix}1&2\\\\3&4\\end{pmatrix}", Environment::new()),
        ("\\int_{0}^{1} x \\, dx", Environment::new()),
        ("\\frac{d}{dx}(x^2)", x2.clone()),
        ("\\lim_{x \\to 0} \\frac{\\sin{x}}{x}", Environment::new()),
        ("x^2, 0 < x", x2),
        ("1 < 2 < 3", Environment::new()),
        ("\\log_{2}{8}", Environment::new()),
        ("-x + 5", x3),
    ]
}

#[test]
fn evaluate_equals_evaluate_parsed() {
    for (source, env) in corpus() {
        let direct = evaluate(source, &env);
        let via_tree = parse(source).and_then(|tree| evaluate_parsed(&tree, &env));
        match (direct, via_tree) {
            (Ok(a), Ok(b)) => assert!(value_close(&a, &b), "mismatch for {source:?}"),
            (Err(_), Err(_)) => {}
            (a, b) => panic!("divergence for {source:?}: {a:?} vs {b:?}"),
        }
    }
}

#[test]
fn latex_round_trip_preserves_values() {
    for (source, env) in corpus() {
        let tree = match parse(source) {
            Ok(tree) => tree,
            Err(err) => panic!("parse of {source:?} failed: {err}"),
        };
        let rendered = to_latex(&tree);
        let reparsed = match parse(&rendered) {
            Ok(tree) => tree,
            Err(err) => panic!("re-parse of {rendered:?} (from {source:?}) failed: {err}"),
        };
        let original = evaluate_parsed(&tree, &env);
        let round_tripped = evaluate_parsed(&reparsed, &env);
        match (original, round_tripped) {
            (Ok(a), Ok(b)) => {
                assert!(value_close(&a, &b), "round trip of {source:?} via {rendered:?} changed value");
            }
            (Err(_), Err(_)) => {}
            (a, b) => panic!("round trip of {source:?} diverged: {a:?} vs {b:?}"),
        }
    }
}

#[test]
fn simplifier_is_idempotent_over_corpus() {
    for (source, _) in corpus() {
        let tree = match parse(source) {
            Ok(tree) => tree,
            Err(err) => panic!("parse of {source:?} failed: {err}"),
        };
        let once = simplify(&tree).unwrap_or_else(|_| tree.clone());
        let twice = simplify(&once).unwrap_or_else(|_| once.clone());
        assert_eq!(once, twice, "simplify not idempotent for {source:?}");
    }
}

#[test]
fn expansion_preserves_values() {
    let sources = ["(x + 1)^{2}", "(x - 2)^{3}", "(x + 2)(x + 5)"];
    for source in sources {
        let tree = match parse(source) {
            Ok(tree) => tree,
            Err(err) => panic!("parse of {source:?} failed: {err}"),
        };
        let expanded = expand(&tree).unwrap_or_else(|err| panic!("expand failed: {err}"));
        for x in [-3.0, -1.0, 0.0, 0.5, 2.0, 7.0] {
            let env = Environment::new().with("x", x);
            let a = evaluate_parsed(&tree, &env).ok().and_then(|v| v.as_numeric());
            let b = evaluate_parsed(&expanded, &env).ok().and_then(|v| v.as_numeric());
            match (a, b) {
                (Some(a), Some(b)) => assert!(
                    (a - b).abs() < 1e-10,
                    "expansion changed {source:?} at x={x}: {a} vs {b}"
                ),
                other => panic!("expansion evaluation failed for {source:?}: {other:?}"),
            }
        }
    }
}

#[test]
fn differentiation_is_linear() {
    // d/dx (a f + b g) = a f' + b g'
    let f = match parse("\\sin{x}") {
        Ok(tree) => tree,
        Err(err) => panic!("{err}"),
    };
    let g = match parse("x^{3}") {
        Ok(tree) => tree,
        Err(err) => panic!("{err}"),
    };
    let combined = Expr::add(
        Expr::mul(Expr::Number(4.0), f.clone()),
        Expr::mul(Expr::Number(-2.0), g.clone()),
    );

    let d_combined = differentiate_parsed(&combined, "x", 1).unwrap_or_else(|e| panic!("{e}"));
    let df = differentiate_parsed(&f, "x", 1).unwrap_or_else(|e| panic!("{e}"));
    let dg = differentiate_parsed(&g, "x", 1).unwrap_or_else(|e| panic!("{e}"));

    for x in [0.25, 1.0, 2.0] {
        let env = Environment::new().with("x", x);
        let lhs = evaluate_parsed(&d_combined, &env).ok().and_then(|v| v.as_numeric());
        let df_v = evaluate_parsed(&df, &env).ok().and_then(|v| v.as_numeric());
        let dg_v = evaluate_parsed(&dg, &env).ok().and_then(|v| v.as_numeric());
        match (lhs, df_v, dg_v) {
            (Some(lhs), Some(df_v), Some(dg_v)) => {
                assert!((lhs - (4.0 * df_v - 2.0 * dg_v)).abs() < 1e-9);
            }
            other => panic!("linearity evaluation failed: {other:?}"),
        }
    }
}

#[test]
fn empty_ranges_use_identities() {
    let env = Environment::new();
    let sum = evaluate("\\sum_{i=3}^{1} i", &env).ok().and_then(|v| v.as_numeric());
    let product = evaluate("\\prod_{i=3}^{1} i", &env).ok().and_then(|v| v.as_numeric());
    assert_eq!(sum, Some(0.0));
    assert_eq!(product, Some(1.0));
}

#[test]
fn conditional_semantics() {
    let pass = Environment::new().with("x", 1.0);
    let fail = Environment::new().with("x", -1.0);
    let passed = evaluate("x + 1, x > 0", &pass).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(passed.as_numeric(), Some(2.0));
    let failed = evaluate("x + 1, x > 0", &fail).unwrap_or_else(|e| panic!("{e}"));
    assert!(failed.is_nan());
}

#[test]
fn chained_comparison_matches_pairwise_conjunction() {
    let cases = [("1 < 2 < 3", true), ("1 < 2 > 5", false), ("3 > 2 > 1", true)];
    for (source, expected) in cases {
        let chained = evaluate(source, &Environment::new()).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(!chained.is_nan(), expected, "chain {source:?}");
    }
}

proptest! {
    #[test]
    fn arithmetic_literals_evaluate_exactly(a in -50i32..50, b in -50i32..50, c in -50i32..50) {
        let source = format!("{a} + {b} \\times {c}");
        let value = evaluate(&source, &Environment::new())
            .ok()
            .and_then(|v| v.as_numeric());
        prop_assert_eq!(value, Some(f64::from(a) + f64::from(b) * f64::from(c)));
    }

    #[test]
    fn literal_round_trip(a in -50i32..50, b in 1i32..50) {
        let source = format!("\\frac{{{a}}}{{{b}}} + {b}^{{2}}");
        let tree = parse(&source).ok();
        prop_assume!(tree.is_some());
        let tree = tree.unwrap_or(Expr::Number(0.0));
        let rendered = to_latex(&tree);
        let reparsed = parse(&rendered).ok();
        prop_assert!(reparsed.is_some());
        let env = Environment::new();
        let lhs = evaluate_parsed(&tree, &env).ok().and_then(|v| v.as_numeric());
        let rhs = reparsed
            .and_then(|t| evaluate_parsed(&t, &env).ok())
            .and_then(|v| v.as_numeric());
        prop_assert_eq!(lhs, rhs);
    }
}
