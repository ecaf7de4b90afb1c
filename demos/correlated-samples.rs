use nalgebra::{Matrix2, Vector2};
use nalgebra_mvn_sampler::{stats, MultivariateNormal};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // specify mean and covariance of our multi-variate normal
    let mu = Vector2::new(5.0, -3.0);
    let sigma = Matrix2::new(
        2.0, 1.0,
        1.0, 2.0,
    );

    let mvn = MultivariateNormal::from_mean_and_covariance(&mu, &sigma)?;
    println!("cholesky factor L:{}", mvn.cholesky_factor());

    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let xs = mvn.sample_batch(&mut rng, 10_000);

    println!("first samples:");
    for row in xs.row_iter().take(5) {
        println!("  {:8.4} {:8.4}", row[0], row[1]);
    }

    if let (Some(mean), Some(cov)) = (stats::sample_mean(&xs), stats::sample_covariance(&xs)) {
        println!("empirical mean:{}", mean);
        println!("empirical covariance:{}", cov);
    }
    Ok(())
}
