use std::hint::black_box;

use criterion::criterion_group;
use criterion::criterion_main;
use criterion::BenchmarkId;
use criterion::Criterion;
use frontier_rs::quant::portfolio::PortfolioSampler;
use ndarray::Array1;
use ndarray::Array2;

fn inputs(k: usize) -> (Array1<f64>, Array2<f64>) {
  let mu = Array1::from_shape_fn(k, |i| 0.05 + 0.01 * i as f64);
  let cov = Array2::from_shape_fn((k, k), |(i, j)| {
    if i == j {
      0.04 + 0.005 * i as f64
    } else {
      0.01
    }
  });
  (mu, cov)
}

fn bench_sampler(c: &mut Criterion) {
  let mut group = c.benchmark_group("PortfolioSampler");

  for k in [2usize, 10, 50] {
    let (mu, cov) = inputs(k);

    group.bench_with_input(BenchmarkId::new("sequential", k), &k, |b, _| {
      let sampler = PortfolioSampler::new(10_000, 0.02, false, false);
      b.iter(|| black_box(sampler.sample(&mu, &cov, Some(7))))
    });

    group.bench_with_input(BenchmarkId::new("parallel", k), &k, |b, _| {
      let sampler = PortfolioSampler::new(10_000, 0.02, false, true);
      b.iter(|| black_box(sampler.sample(&mu, &cov, Some(7))))
    });
  }

  group.finish();
}

criterion_group!(benches, bench_sampler);
criterion_main!(benches);
