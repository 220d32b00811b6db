//! Seeded train/test partitioning
//!
//! Row indices are shuffled with a `StdRng` seeded from the model seed. The
//! first `ceil(test_fraction * n)` shuffled indices form the test partition
//! and the remainder the training partition, so the split depends only on the
//! row count and the seed.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Index partition of a dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Number of test rows for `n` rows; the train partition gets the rest
pub fn test_size(n: usize, test_fraction: f64) -> usize {
    // Round before ceil so 0.3 * 10 stays 3 rather than 4
    let raw = (test_fraction * n as f64 * 1e9).round() / 1e9;
    (raw.ceil() as usize).min(n)
}

/// Smallest row count whose split leaves both partitions non-empty
pub fn min_rows_for_split(test_fraction: f64) -> usize {
    (2..=usize::MAX)
        .find(|&n| {
            let t = test_size(n, test_fraction);
            t > 0 && t < n
        })
        .unwrap_or(usize::MAX)
}

/// Shuffle-split `n` rows. Returns `None` when either partition would be empty.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> Option<TrainTestSplit> {
    let n_test = test_size(n, test_fraction);
    if n_test == 0 || n_test >= n {
        return None;
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Some(TrainTestSplit {
        train,
        test: indices,
    })
}
