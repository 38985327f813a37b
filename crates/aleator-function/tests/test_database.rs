
use approx::assert_relative_eq;

use aleator_function::{Config, Evaluation, Function, FunctionError};
use aleator_types::{Matrix, Point, Sample};
use test_common::sample_of;

fn reference() -> (Sample, Sample) {
    let input = sample_of(2, &[&[0.0, 0.0], &[1.0, 0.0], &[0.0, 1.0], &[1.0, 1.0]]);
    let output = sample_of(1, &[&[10.0], &[20.0], &[30.0], &[40.0]]);
    (input, output)
}

fn cached_config() -> Config {
    Config {
        database_cache: true,
        ..Config::default()
    }
}

// ============================================================================
// Database Function Contract
// ============================================================================

#[test]
fn test_training_rows_reproduce_exactly() {
    let (input, output) = reference();
    let f = Function::from_database(input.clone(), output.clone(), cached_config()).unwrap();
    for i in 0..input.size() {
        let y = f.evaluate(&input.point(i)).unwrap();
        assert_eq!(y.as_slice(), output.row(i));
    }
}

#[test]
fn test_novel_points_snap_to_the_nearest_row() {
    let (input, output) = reference();
    let f = Function::from_database(input, output, Config::default()).unwrap();
    let y = f.evaluate(&Point::from(vec![0.9, 0.9])).unwrap();
    assert_eq!(y.as_slice(), &[40.0]);
}

#[test]
fn test_distance_ties_pick_the_lowest_row() {
    // (0.5, 0) sits exactly between rows 0 and 1.
    let (input, output) = reference();
    let f = Function::from_database(input, output, Config::default()).unwrap();
    let y = f.evaluate(&Point::from(vec![0.5, 0.0])).unwrap();
    assert_eq!(y.as_slice(), &[10.0]);
}

#[test]
fn test_full_reference_batch_short_circuits() {
    let (input, output) = reference();
    let f = Function::from_database(input.clone(), output.clone(), Config::default()).unwrap();
    let batch = f.evaluate_sample(&input).unwrap();
    assert_eq!(batch, output);
    assert_eq!(f.call_count(), input.size());
}

#[test]
fn test_empty_references_are_rejected() {
    let err = Function::from_database(Sample::new(2), Sample::new(1), Config::default())
        .err()
        .unwrap();
    assert!(matches!(err, FunctionError::EmptyInput(_)));
}

#[test]
fn test_size_disagreement_is_rejected() {
    let input = sample_of(2, &[&[0.0, 0.0], &[1.0, 1.0]]);
    let output = sample_of(1, &[&[1.0]]);
    let err = Function::from_database(input, output, Config::default())
        .err()
        .unwrap();
    assert!(matches!(err, FunctionError::DimensionMismatch { .. }));
}

#[test]
fn test_query_dimension_is_checked() {
    let (input, output) = reference();
    let f = Function::from_database(input, output, Config::default()).unwrap();
    let err = f.evaluate(&Point::from(vec![1.0])).err().unwrap();
    assert!(matches!(err, FunctionError::DimensionMismatch { .. }));
}

#[test]
fn test_rearming_swaps_the_answers() {
    let (input, output) = reference();
    let mut f = Function::from_database(input.clone(), output, cached_config()).unwrap();
    let doubled = sample_of(1, &[&[100.0], &[200.0], &[300.0], &[400.0]]);
    f.evaluation_mut()
        .as_database_mut()
        .unwrap()
        .set_sample(input.clone(), doubled, true)
        .unwrap();
    let y = f.evaluate(&input.point(1)).unwrap();
    assert_eq!(y.as_slice(), &[200.0]);
}

#[test]
fn test_reference_samples_round_trip_through_serde() {
    // A database function rebuilt from persisted samples answers like
    // the original.
    let (input, output) = reference();
    let stored = serde_json::to_string(&(&input, &output)).unwrap();
    let (restored_in, restored_out): (Sample, Sample) = serde_json::from_str(&stored).unwrap();
    let f = Function::from_database(restored_in, restored_out, cached_config()).unwrap();
    for i in 0..input.size() {
        assert_eq!(f.evaluate(&input.point(i)).unwrap().as_slice(), output.row(i));
    }
}

#[test]
fn test_database_marginal_selects_output_columns() {
    let input = sample_of(1, &[&[0.0], &[1.0]]);
    let output = sample_of(2, &[&[1.0, -1.0], &[2.0, -2.0]]);
    let f = Function::from_database(input, output, cached_config()).unwrap();
    let negated = f.marginal(1).unwrap();
    assert_eq!(negated.output_dimension(), 1);
    let y = negated.evaluate(&Point::from(vec![1.0])).unwrap();
    assert_eq!(y.as_slice(), &[-2.0]);
}

// ============================================================================
// Mixture of Experts
// ============================================================================

fn sign_mixture() -> Function {
    // Experts return the sign; the classifier grades (-x, x) so the
    // winning grade selects the matching expert.
    let negative = Function::constant(Point::from(vec![-1.0]), 1);
    let positive = Function::constant(Point::from(vec![1.0]), 1);
    let classifier = Function::linear(
        Point::zeros(1),
        Point::zeros(2),
        Matrix::from_vec(1, 2, vec![-1.0, 1.0]).unwrap(),
    )
    .unwrap();
    Function::new(Evaluation::mixture(vec![negative, positive], classifier).unwrap())
}

#[test]
fn test_mixture_selects_by_best_grade() {
    let f = sign_mixture();
    assert_relative_eq!(f.evaluate(&Point::from(vec![-3.0])).unwrap()[0], -1.0);
    assert_relative_eq!(f.evaluate(&Point::from(vec![2.0])).unwrap()[0], 1.0);
}

#[test]
fn test_mixture_grade_ties_pick_the_lowest_expert() {
    let f = sign_mixture();
    assert_relative_eq!(f.evaluate(&Point::zeros(1)).unwrap()[0], -1.0);
}

#[test]
fn test_mixture_batch_scatters_rows_back() {
    let f = sign_mixture();
    let sample = sample_of(1, &[&[-2.0], &[3.0], &[-0.5], &[0.0], &[7.0]]);
    let out = f.evaluate_sample(&sample).unwrap();
    assert_eq!(out.row(0), &[-1.0]);
    assert_eq!(out.row(1), &[1.0]);
    assert_eq!(out.row(2), &[-1.0]);
    assert_eq!(out.row(3), &[-1.0]);
    assert_eq!(out.row(4), &[1.0]);
}

#[test]
fn test_mixture_marginal_maps_every_expert() {
    // Two-output experts; the classifier still grades per expert.
    let low = Function::constant(Point::from(vec![1.0, 10.0]), 1);
    let high = Function::constant(Point::from(vec![2.0, 20.0]), 1);
    let classifier = Function::linear(
        Point::zeros(1),
        Point::zeros(2),
        Matrix::from_vec(1, 2, vec![-1.0, 1.0]).unwrap(),
    )
    .unwrap();
    let f = Function::new(Evaluation::mixture(vec![low, high], classifier).unwrap());
    let second = f.marginal(1).unwrap();
    assert_eq!(second.output_dimension(), 1);
    assert_relative_eq!(second.evaluate(&Point::from(vec![5.0])).unwrap()[0], 20.0);
    assert_relative_eq!(second.evaluate(&Point::from(vec![-5.0])).unwrap()[0], 10.0);
}
