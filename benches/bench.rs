use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::{DMatrix, DVector, Matrix2, OMatrix, Vector2, U2, U3};
use nalgebra_mvn_sampler::MultivariateNormal;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::Distribution;

fn bench_sampler(c: &mut Criterion) {
    // specify mean and covariance of our multi-variate normal
    let mu = Vector2::from_row_slice(&[9.0, 1.0]);
    let covariance = Matrix2::from_row_slice(&[2.0, 1.0, 1.0, 2.0]);

    c.bench_function("create_from_covariance", move |b| {
        b.iter(|| {
            MultivariateNormal::from_mean_and_covariance(&mu, &covariance).unwrap();
        })
    });

    {
        let precision = Matrix2::from_row_slice(&[1.0, 0.0, 0.0, 1.0]);

        c.bench_function("create_from_precision", move |b| {
            b.iter(|| {
                MultivariateNormal::from_mean_and_precision(&mu, &precision).unwrap();
            })
        });
    }

    {
        // singular, goes through the semi-definite path
        let covariance = DMatrix::from_fn(50, 50, |_, _| 1.0);
        let mu = DVector::zeros(50);

        c.bench_function("create_semidefinite_50", move |b| {
            b.iter(|| {
                MultivariateNormal::from_mean_and_covariance(&mu, &covariance).unwrap();
            })
        });
    }

    let mvn = MultivariateNormal::from_mean_and_covariance(&mu, &covariance).unwrap();

    {
        let mvn = mvn.clone();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        c.bench_function("sample_single", move |b| {
            b.iter(|| -> Vector2<f64> { mvn.sample(&mut rng) })
        });
    }

    {
        let mvn = mvn.clone();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        c.bench_function("sample_batch_100000", move |b| {
            b.iter(|| mvn.sample_batch(&mut rng, 100000))
        });
    }

    {
        let mvn = mvn.clone();
        // input samples are row vectors vertically stacked
        let xs = OMatrix::<_, U3, U2>::new(8.9, 1.0, 9.0, 1.0, 9.1, 1.0);

        c.bench_function("pdf_3x2", move |b| b.iter(|| mvn.pdf(&xs).unwrap()));
    }
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = bench_sampler,
}
criterion_main!(benches);
