//! Sampling a noisy distribution with retries, jitter and a disk cache
//!
//! Run with: cargo run --example gauss_cache
//!
//! Run it twice: the second run finds the stored samples and skips drawing.

use rand_distr::{Distribution, Normal};
use std::error::Error;
use std::time::Duration;
use steadfast::cache::Binary;
use steadfast::{from_fn, Cache, CacheConfig, JitterArgs, JitterError, Operation, Retry, RetryPolicy, Table};

#[derive(Debug)]
enum SampleError {
    Jitter(JitterError),
    Distribution(rand_distr::NormalError),
}

impl std::fmt::Display for SampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleError::Jitter(e) => write!(f, "jitter: {}", e),
            SampleError::Distribution(e) => write!(f, "distribution: {}", e),
        }
    }
}

impl Error for SampleError {}

impl From<JitterError> for SampleError {
    fn from(e: JitterError) -> Self {
        SampleError::Jitter(e)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let dir = std::env::temp_dir().join("steadfast-gauss-demo");
    tracing::info!(dir = %dir.display(), "using cache directory");

    // One positive draw from N(mean, sd); the arguments are jittered by 10%
    // and 50% before every attempt.
    let gauss = from_fn("gauss", |args: &Vec<f64>| {
        let normal = Normal::new(args[0], args[1].abs()).map_err(SampleError::Distribution)?;
        Ok::<_, SampleError>(normal.sample(&mut rand::rng()))
    });
    let policy = RetryPolicy::new()
        .with_max_attempts(10)
        .with_delay(Duration::from_millis(20))
        .with_jitter(0.5)
        .with_backoff(2.0)
        .with_random_exponent(true);
    let positive = Retry::new(JitterArgs::new(gauss, vec![0.1, 0.5]), |x: &f64| *x > 0.0, policy)?;

    let config = CacheConfig::new()
        .with_dir(&dir)
        .with_reachback("1 hour");
    let mut sample = Cache::new::<Vec<f64>>(positive, config.clone())?;

    for (mean, sd) in [(1.0, 2.0), (5.0, 1.0), (1.0, 2.0)] {
        match sample.call(&vec![mean, sd]) {
            Ok(x) => tracing::info!(mean, sd, x, "sample"),
            Err(e) => tracing::error!(mean, sd, error = %e, "sampling failed"),
        }
    }

    // A tabular summary goes to CSV, kept alongside older versions.
    let summarize = from_fn("summary", |(n,): &(usize,)| {
        let normal = Normal::new(0.0, 1.0).map_err(SampleError::Distribution)?;
        let mut table = Table::new(["i", "draw"]);
        for (i, draw) in normal.sample_iter(rand::rng()).take(*n).enumerate() {
            table.push_row([i.to_string(), format!("{:.4}", draw)]);
        }
        Ok::<_, SampleError>(table)
    });
    let mut summary = Cache::new(summarize, config.clone().with_hoard(true))?;
    let table = summary.call(&(5,))?;
    tracing::info!(rows = table.len(), stored = summary.inventory().len(), "summary ready");

    // Arbitrary serde types are stored as bincode.
    let moments = from_fn("moments", |(n,): &(usize,)| {
        let normal = Normal::new(3.0, 0.5).map_err(SampleError::Distribution)?;
        let draws: Vec<f64> = normal.sample_iter(rand::rng()).take(*n).collect();
        let mean = draws.iter().sum::<f64>() / *n as f64;
        let var = draws.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / *n as f64;
        Ok::<_, SampleError>(Binary((mean, var)))
    });
    let mut moments = Cache::new(moments, config)?;
    let Binary((mean, var)) = moments.call(&(1000,))?;
    tracing::info!(mean, var, "moments of N(3, 0.5)");

    Ok(())
}
