use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use aleator_function::{
    ClosureFormulaEngine, Config, Evaluation, FieldToPointFunction, Function,
    PointToFieldFunction, PointToPointEvaluation,
};
use aleator_types::{Description, Matrix, Mesh, Point, Sample};

const BATCH_SIZE: usize = 1024;

fn affine() -> Function {
    Function::linear(
        Point::zeros(2),
        Point::from(vec![3.0]),
        Matrix::from_vec(2, 1, vec![1.0, 2.0]).unwrap(),
    )
    .unwrap()
}

fn analytic() -> Function {
    let engine = ClosureFormulaEngine::new()
        .define("x0^2*x1", |x, _| Ok(x[0] * x[0] * x[1]));
    Function::analytic(
        Description::from(vec!["x0", "x1"]),
        Description::from(vec!["y0"]),
        vec!["x0^2*x1".to_string()],
        Arc::new(engine),
    )
    .unwrap()
}

fn batch(size: usize) -> Sample {
    let mut sample = Sample::new(2);
    for i in 0..size {
        let t = i as f64 * 0.01;
        sample.push_row(&[t, 1.0 - t]).unwrap();
    }
    sample
}

fn round_trip(block_size: usize) -> Function {
    let config = Config {
        point_block_size: block_size,
        ..Config::default()
    };
    let mesh = Mesh::regular_grid(0.0, 0.1, 16).unwrap();
    let p2f = PointToFieldFunction::vertex_broadcast(mesh.clone(), 2);
    let f2p = FieldToPointFunction::vertex_mean(mesh, 2).unwrap();
    Function::new(Evaluation::composed(
        PointToPointEvaluation::through_field(f2p, p2f, &config).unwrap(),
    ))
}

fn benchmark_point_batches(c: &mut Criterion) {
    let linear = affine();
    let formula = analytic();
    let sample = batch(BATCH_SIZE);

    let mut group = c.benchmark_group("point_batches");
    group.throughput(Throughput::Elements(BATCH_SIZE as u64));
    group.bench_function("linear_1024", |b| {
        b.iter(|| black_box(linear.evaluate_sample(&sample).unwrap()));
    });
    group.bench_function("analytic_1024", |b| {
        b.iter(|| black_box(formula.evaluate_sample(&sample).unwrap()));
    });
    group.finish();
}

fn benchmark_streaming(c: &mut Criterion) {
    let sample = batch(BATCH_SIZE);

    let mut group = c.benchmark_group("through_field_streaming");
    group.throughput(Throughput::Elements(BATCH_SIZE as u64));
    for block_size in [16, 256] {
        let f = round_trip(block_size);
        group.bench_function(format!("block_{block_size}"), |b| {
            b.iter(|| black_box(f.evaluate_sample(&sample).unwrap()));
        });
    }
    group.finish();
}

fn benchmark_database(c: &mut Criterion) {
    let input = batch(512);
    let mut output = Sample::new(1);
    for i in 0..512 {
        output.push_row(&[i as f64]).unwrap();
    }
    let queries = batch(512);

    let mut group = c.benchmark_group("database_lookup");
    group.throughput(Throughput::Elements(512));
    for cached in [false, true] {
        let config = Config {
            database_cache: cached,
            ..Config::default()
        };
        let f = Function::from_database(input.clone(), output.clone(), config).unwrap();
        let name = if cached { "known_cached" } else { "known_scan" };
        group.bench_function(name, |b| {
            b.iter(|| {
                for i in 0..queries.size() {
                    black_box(f.evaluate(&queries.point(i)).unwrap());
                }
            });
        });
    }
    group.finish();
}

fn benchmark_gradient(c: &mut Criterion) {
    let f = analytic();
    let x = Point::from(vec![1.0, 2.0]);

    let mut group = c.benchmark_group("derivatives");
    group.bench_function("synthesized_gradient", |b| {
        b.iter(|| black_box(f.gradient(&x).unwrap()));
    });
    group.bench_function("synthesized_hessian", |b| {
        b.iter(|| black_box(f.hessian(&x).unwrap()));
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_point_batches,
    benchmark_streaming,
    benchmark_database,
    benchmark_gradient
);
criterion_main!(benches);
