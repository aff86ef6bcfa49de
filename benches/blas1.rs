use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use faer::Mat;
use mvkernels::{Coeff, KernelOptions, MultiVector, MvOps, SerialExec};

const ROWS: usize = 100_000;

fn bench_axpby(c: &mut Criterion) {
    let par = MvOps::new(KernelOptions::from_env());
    let ser = MvOps::with_exec(SerialExec, KernelOptions::default());
    let mut group = c.benchmark_group("axpby");
    for m in [1usize, 4, 16, 17] {
        let x = MultiVector::from_fn(ROWS, m, |i, k| ((i + k) as f64).sin());
        let y = MultiVector::from_fn(ROWS, m, |i, k| ((i * k) as f64).cos());
        let mut r = MultiVector::zeros(ROWS, m);

        group.bench_with_input(BenchmarkId::new("default", m), &m, |ben, _| {
            ben.iter(|| {
                par.axpby(r.view_mut(), Coeff::Scalar(2.0), black_box(x.view()), Coeff::Scalar(-1.0), black_box(y.view()), None)
                    .unwrap()
            })
        });
        group.bench_with_input(BenchmarkId::new("serial", m), &m, |ben, _| {
            ben.iter(|| {
                ser.axpby(r.view_mut(), Coeff::Scalar(2.0), black_box(x.view()), Coeff::Scalar(-1.0), black_box(y.view()), None)
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_dot_vs_faer(c: &mut Criterion) {
    let ops = MvOps::new(KernelOptions::from_env());
    let m = 8;
    let x = MultiVector::from_fn(ROWS, m, |i, k| ((i + 3 * k) as f64).sin());
    let y = MultiVector::from_fn(ROWS, m, |i, k| ((2 * i + k) as f64).cos());
    let (xm, ym): (Mat<f64>, Mat<f64>) = (x.to_mat(), y.to_mat());
    let mut out = vec![0.0; m];

    c.bench_function("mvkernels dot 8 columns", |ben| {
        ben.iter(|| ops.dot(black_box(&mut out), x.view(), y.view(), None).unwrap())
    });

    c.bench_function("column loop over faer::Mat", |ben| {
        ben.iter(|| {
            for (k, slot) in out.iter_mut().enumerate() {
                *slot = (0..ROWS).map(|i| xm[(i, k)] * ym[(i, k)]).sum();
            }
            black_box(&out);
        })
    });
}

criterion_group!(benches, bench_axpby, bench_dot_vs_faer);
criterion_main!(benches);
