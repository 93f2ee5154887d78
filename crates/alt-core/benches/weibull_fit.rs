//! Criterion benchmarks for the censored Weibull fitter and the generator.
//!
//! Inputs are generated from fixed seeds so runs are comparable.

use alt_config::{Catalog, FitOptions, GeneratorConfig};
use alt_core::inference::{fit_censored_weibull, fit_records, MleSettings};
use alt_core::model::synthesize;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn quantile_sample(n: usize, shape: f64, scale: f64) -> Vec<f64> {
    (1..=n)
        .map(|i| alt_math::weibull_quantile((i as f64 - 0.5) / n as f64, shape, scale))
        .collect()
}

fn bench_single_cell(c: &mut Criterion) {
    let mut group = c.benchmark_group("weibull_mle");
    let settings = MleSettings::default();

    for n in [20usize, 80, 500] {
        let all = quantile_sample(n, 2.0, 1000.0);
        // censor the top quarter at a common end time
        let cut = n - n / 4;
        let end = all[cut];
        let failures = all[..cut].to_vec();
        let censored = vec![end; n - cut];

        group.bench_with_input(
            BenchmarkId::new("censored", n),
            &(failures, censored),
            |b, (f, s)| {
                b.iter(|| {
                    let fit = fit_censored_weibull(black_box(f), black_box(s), &settings)
                        .expect("fit should converge");
                    black_box(fit.shape);
                })
            },
        );
    }
    group.finish();
}

fn bench_study(c: &mut Criterion) {
    let generator = GeneratorConfig {
        n_per_group: 200,
        ..GeneratorConfig::default()
    };
    let records = synthesize(&generator, &Catalog::default()).expect("default study is valid");

    let mut group = c.benchmark_group("study");
    group.bench_function("generate_default_catalog", |b| {
        b.iter(|| black_box(synthesize(black_box(&generator), &Catalog::default())))
    });
    for parallel in [false, true] {
        let options = FitOptions {
            parallel,
            ..FitOptions::default()
        };
        group.bench_with_input(
            BenchmarkId::new("fit_records", if parallel { "rayon" } else { "sequential" }),
            &options,
            |b, opts| b.iter(|| black_box(fit_records(black_box(&records), opts))),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_single_cell, bench_study);
criterion_main!(benches);
