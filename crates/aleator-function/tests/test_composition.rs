
use std::sync::Arc;

use approx::assert_relative_eq;

use aleator_function::{
    ClosureFormulaEngine, Config, Evaluation, FieldToPointFunction, Function, FunctionError,
    PointToFieldFunction, PointToPointEvaluation,
};
use aleator_types::{Description, Point};
use test_common::{affine, line_mesh, sample_of, scale, shift};

// ============================================================================
// Point Composition
// ============================================================================

#[test]
fn test_compose_applies_right_then_left() {
    // (2·x) after (x + 1)
    let f = Function::compose(scale(2.0), shift(1.0)).unwrap();
    let y = f.evaluate(&Point::from(vec![3.0])).unwrap();
    assert_relative_eq!(y[0], 8.0);
    assert!(f.is_linear());
}

#[test]
fn test_composition_is_associative() {
    let left = Function::compose(
        Function::compose(scale(2.0), shift(1.0)).unwrap(),
        scale(3.0),
    )
    .unwrap();
    let right = Function::compose(
        scale(2.0),
        Function::compose(shift(1.0), scale(3.0)).unwrap(),
    )
    .unwrap();

    let sample = sample_of(1, &[&[0.0], &[1.0], &[-2.5], &[10.0]]);
    let a = left.evaluate_sample(&sample).unwrap();
    let b = right.evaluate_sample(&sample).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_composed_gradient_through_differences() {
    // d/dx of 2·(x + 1) is 2 everywhere.
    let f = Function::compose(scale(2.0), shift(1.0)).unwrap();
    assert!(f.uses_default_gradient());
    let gradient = f.gradient(&Point::from(vec![5.0])).unwrap();
    assert_relative_eq!(gradient.get(0, 0), 2.0, epsilon = 1e-6);
}

#[test]
fn test_composed_marginal_keeps_the_inner_stage() {
    // outer fans one value out to (y, -y); inner shifts by 1
    let fanout = Function::linear(
        Point::zeros(1),
        Point::zeros(2),
        aleator_types::Matrix::from_vec(1, 2, vec![1.0, -1.0]).unwrap(),
    )
    .unwrap();
    let f = Function::compose(fanout, shift(1.0)).unwrap();
    let negated = f.marginal(1).unwrap();
    assert_eq!(negated.output_dimension(), 1);
    assert_eq!(negated.call_count(), 0);
    let y = negated.evaluate(&Point::from(vec![2.0])).unwrap();
    assert_relative_eq!(y[0], -3.0);
}

// ============================================================================
// Composed Parameters
// ============================================================================

fn parametric_scale(name: &str, initial: f64) -> Function {
    let engine = ClosureFormulaEngine::new().define("a*x0", |x, p| Ok(p[0].1 * x[0]));
    Function::analytic_with_parameters(
        Description::from(vec!["x0"]),
        vec![(name.to_string(), initial)],
        Description::from(vec!["y0"]),
        vec!["a*x0".to_string()],
        Arc::new(engine),
    )
    .unwrap()
}

#[test]
fn test_composed_parameter_concatenates_left_then_right() {
    let f = Function::compose(parametric_scale("a", 2.0), parametric_scale("b", 3.0)).unwrap();
    assert_eq!(f.parameter().as_slice(), &[2.0, 3.0]);
    // a·(b·x) = 6·x
    let y = f.evaluate(&Point::from(vec![1.0])).unwrap();
    assert_relative_eq!(y[0], 6.0);
}

#[test]
fn test_composed_set_parameter_splits_by_stage() {
    let mut f = Function::compose(parametric_scale("a", 2.0), parametric_scale("b", 3.0)).unwrap();
    f.set_parameter(&Point::from(vec![5.0, 10.0])).unwrap();
    assert_eq!(f.parameter().as_slice(), &[5.0, 10.0]);
    let y = f.evaluate(&Point::from(vec![1.0])).unwrap();
    assert_relative_eq!(y[0], 50.0);

    let err = f.set_parameter(&Point::from(vec![1.0])).err().unwrap();
    assert!(matches!(err, FunctionError::DimensionMismatch { .. }));
}

#[test]
fn test_parametric_beside_plain_stage() {
    // Only the outer stage is parametric; the inner contributes no
    // parameter slots.
    let mut f = Function::compose(parametric_scale("a", 2.0), shift(1.0)).unwrap();
    assert_eq!(f.parameter().dimension(), 1);
    f.set_parameter(&Point::from(vec![4.0])).unwrap();
    let y = f.evaluate(&Point::from(vec![1.0])).unwrap();
    assert_relative_eq!(y[0], 8.0);
}

// ============================================================================
// Through-Field Composition
// ============================================================================

fn round_trip(config: &Config) -> Function {
    // Broadcast to the mesh, average back: the identity on two
    // components.
    let mesh = line_mesh(4);
    let p2f = PointToFieldFunction::vertex_broadcast(mesh.clone(), 2);
    let f2p = FieldToPointFunction::vertex_mean(mesh, 2).unwrap();
    Function::new(Evaluation::composed(
        PointToPointEvaluation::through_field(f2p, p2f, config).unwrap(),
    ))
}

#[test]
fn test_through_field_round_trip() {
    let f = round_trip(&Config::default());
    let y = f.evaluate(&Point::from(vec![2.0, -7.0])).unwrap();
    assert_relative_eq!(y[0], 2.0);
    assert_relative_eq!(y[1], -7.0);
    assert!(!f.is_linear());
    assert!(!f.is_parallel());
}

#[test]
fn test_through_field_batch_keeps_row_order() {
    let config = Config {
        point_block_size: 3,
        ..Config::default()
    };
    let f = round_trip(&config);
    let sample = sample_of(
        2,
        &[
            &[0.0, 10.0],
            &[1.0, 20.0],
            &[2.0, 30.0],
            &[3.0, 40.0],
            &[4.0, 50.0],
        ],
    );
    let out = f.evaluate_sample(&sample).unwrap();
    for i in 0..5 {
        assert_relative_eq!(out.row(i)[0], i as f64);
        assert_relative_eq!(out.row(i)[1], 10.0 * (i + 1) as f64);
    }
    assert_eq!(f.call_count(), 5);
}

#[test]
fn test_affine_outer_stage_over_round_trip() {
    // A point stage composed over a field round trip still chains.
    let inner = round_trip(&Config::default());
    let outer = Function::linear(
        Point::zeros(2),
        Point::zeros(1),
        aleator_types::Matrix::from_vec(2, 1, vec![1.0, 1.0]).unwrap(),
    )
    .unwrap();
    let f = Function::compose(outer, inner).unwrap();
    let y = f.evaluate(&Point::from(vec![3.0, 4.0])).unwrap();
    assert_relative_eq!(y[0], 7.0);
}

#[test]
fn test_dimension_conflicts_are_named() {
    let err = Function::compose(affine(), scale(1.0)).err().unwrap();
    match err {
        FunctionError::InvalidArgument(message) => {
            assert!(message.contains('1') && message.contains('2'));
        }
        other => panic!("expected InvalidArgument, got {other:?}"),
    }
}
