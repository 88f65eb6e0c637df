use num_traits::Float;

use crate::error::{KnnError, Result};

/// Returns the **squared** Euclidean distance between two feature vectors.
///
/// Squared distance ranks neighbors exactly like true Euclidean distance, so
/// the square root is skipped. Both slices hold features only; a length
/// difference is reported as [`KnnError::DimensionMismatch`] with `a` taken
/// as the expected dimension.
///
/// # Example
///
/// ```
/// use knn_vote::squared_euclidean;
///
/// let d = squared_euclidean(&[0.0, 0.0], &[1.0, 1.0]).unwrap();
/// assert_eq!(d, 2.0);
/// ```
pub fn squared_euclidean<T: Float>(a: &[T], b: &[T]) -> Result<T> {
    if a.len() != b.len() {
        return Err(KnnError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x - y) * (x - y))
        .fold(T::zero(), |acc, d| acc + d))
}
