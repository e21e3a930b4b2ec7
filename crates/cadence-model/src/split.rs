//! Seeded train/validation and k-fold index splits.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::error::ModelError;

/// Sample indices assigned to training and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainValidationSplit {
    /// Indices used for fitting, in shuffled order.
    pub train: Vec<usize>,
    /// Held-out indices, in shuffled order.
    pub validation: Vec<usize>,
}

/// Randomly split `0..n` into training and validation indices.
///
/// Shuffles with `ChaCha8Rng` seeded from `seed`; the first
/// `ceil(fraction * n)` shuffled indices are held out. Not stratified.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ModelError::InvalidConfig`] | `fraction` not strictly between 0 and 1 |
/// | [`ModelError::TooFewWindows`] | either side of the split would be empty |
pub fn train_validation_split(
    n: usize,
    fraction: f64,
    seed: u64,
) -> Result<TrainValidationSplit, ModelError> {
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(ModelError::InvalidConfig {
            reason: format!("validation fraction must be in (0, 1), got {fraction}"),
        });
    }
    let n_validation = (fraction * n as f64).ceil() as usize;
    let n_train = n.saturating_sub(n_validation);
    if n_validation == 0 || n_train == 0 {
        return Err(ModelError::TooFewWindows {
            n_windows: n,
            n_train,
            n_validation,
        });
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    let train = indices.split_off(n_validation);

    debug!(n_train, n_validation, seed, "train/validation split");
    Ok(TrainValidationSplit {
        train,
        validation: indices,
    })
}

/// Assign each of `n` samples to one of `n_folds` folds.
///
/// Indices are shuffled with `seed` and dealt round-robin, so fold sizes
/// differ by at most one. Returns one fold number per sample.
///
/// # Errors
///
/// Returns [`ModelError::InvalidConfig`] if `n_folds < 2` or `n_folds > n`.
pub fn k_fold_assignments(n: usize, n_folds: usize, seed: u64) -> Result<Vec<usize>, ModelError> {
    if n_folds < 2 || n_folds > n {
        return Err(ModelError::InvalidConfig {
            reason: format!("cannot build {n_folds} folds from {n} samples"),
        });
    }
    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let mut folds = vec![0; n];
    for (position, &sample) in order.iter().enumerate() {
        folds[sample] = position % n_folds;
    }
    Ok(folds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_size_is_ceiling() {
        let s = train_validation_split(11, 0.2, 42).unwrap();
        assert_eq!(s.validation.len(), 3);
        assert_eq!(s.train.len(), 8);
    }

    #[test]
    fn split_is_a_partition() {
        let s = train_validation_split(50, 0.2, 7).unwrap();
        let mut all: Vec<usize> = s.train.iter().chain(&s.validation).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn same_seed_same_split() {
        assert_eq!(
            train_validation_split(40, 0.2, 42).unwrap(),
            train_validation_split(40, 0.2, 42).unwrap()
        );
    }

    #[test]
    fn single_window_cannot_split() {
        let err = train_validation_split(1, 0.2, 42).unwrap_err();
        assert!(matches!(
            err,
            ModelError::TooFewWindows { n_windows: 1, n_train: 0, n_validation: 1 }
        ));
    }

    #[test]
    fn zero_windows_cannot_split() {
        assert!(matches!(
            train_validation_split(0, 0.2, 42).unwrap_err(),
            ModelError::TooFewWindows { .. }
        ));
    }

    #[test]
    fn fraction_out_of_range() {
        for f in [0.0, 1.0, -0.5, f64::NAN] {
            assert!(matches!(
                train_validation_split(10, f, 42).unwrap_err(),
                ModelError::InvalidConfig { .. }
            ));
        }
    }

    #[test]
    fn folds_are_balanced() {
        let folds = k_fold_assignments(23, 5, 3).unwrap();
        let mut sizes = [0usize; 5];
        for f in folds {
            sizes[f] += 1;
        }
        assert!(sizes.iter().all(|&s| s == 4 || s == 5));
        assert_eq!(sizes.iter().sum::<usize>(), 23);
    }

    #[test]
    fn invalid_fold_counts() {
        assert!(k_fold_assignments(10, 1, 0).is_err());
        assert!(k_fold_assignments(3, 4, 0).is_err());
    }
}
