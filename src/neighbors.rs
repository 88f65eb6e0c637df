use log::debug;

use crate::dataset::{Dataset, LabeledRow};
use crate::distance::squared_euclidean;
use crate::error::{KnnError, Result};

/// A training row together with its squared distance to a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor<'a, L> {
    /// Position of the row in the training dataset.
    pub index: usize,
    pub distance: f64,
    pub row: &'a LabeledRow<L>,
}

impl<'a, L> Neighbor<'a, L> {
    pub fn label(&self) -> &'a L {
        self.row.label()
    }
}

/// Find the `k` rows of `dataset` closest to `query`.
///
/// The result is sorted by ascending squared Euclidean distance. The sort is
/// stable, so rows at equal distance keep their dataset order. When `k`
/// exceeds the dataset size every row is returned.
///
/// # Errors
///
/// - [`KnnError::InvalidK`] if `k == 0`.
/// - [`KnnError::EmptyDataset`] if `dataset` has no rows.
/// - [`KnnError::DimensionMismatch`] if `query` has the wrong length.
pub fn get_neighbors<'a, L>(
    dataset: &'a Dataset<L>,
    query: &[f64],
    k: usize,
) -> Result<Vec<Neighbor<'a, L>>> {
    if k == 0 {
        return Err(KnnError::InvalidK(k));
    }
    if dataset.is_empty() {
        return Err(KnnError::EmptyDataset);
    }

    let mut neighbors = dataset
        .iter()
        .enumerate()
        .map(|(index, row)| {
            Ok(Neighbor {
                index,
                distance: squared_euclidean(row.features(), query)?,
                row,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    // Stable sort: rows at equal distance keep dataset order.
    neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    if k < neighbors.len() {
        neighbors.truncate(k);
    } else {
        debug!("k = {} covers all {} rows", k, neighbors.len());
    }
    Ok(neighbors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Dataset<&'static str> {
        Dataset::from_rows(vec![
            LabeledRow::new(vec![0.0, 0.0], "a"),
            LabeledRow::new(vec![5.0, 5.0], "b"),
            LabeledRow::new(vec![1.0, 0.0], "c"),
            LabeledRow::new(vec![0.0, 1.0], "d"),
            LabeledRow::new(vec![9.0, 9.0], "e"),
        ])
        .unwrap()
    }

    #[test]
    fn test_sorted_by_distance() {
        let data = grid();
        let found = get_neighbors(&data, &[4.0, 4.0], 5).unwrap();
        for pair in found.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
        assert_eq!(*found[0].label(), "b");
        assert_eq!(found[0].distance, 2.0);
        assert_eq!(found[0].index, 1);
    }

    #[test]
    fn test_size_is_min_of_k_and_len() {
        let data = grid();
        for k in 1..=8 {
            let found = get_neighbors(&data, &[0.5, 0.5], k).unwrap();
            assert_eq!(found.len(), k.min(data.len()));
        }
    }

    #[test]
    fn test_ties_keep_dataset_order() {
        let data = grid();
        // "c" and "d" are both at distance 1 from the origin.
        let found = get_neighbors(&data, &[0.0, 0.0], 3).unwrap();
        let labels: Vec<&str> = found.iter().map(|n| *n.label()).collect();
        assert_eq!(labels, vec!["a", "c", "d"]);

        let found = get_neighbors(&data, &[0.0, 0.0], 2).unwrap();
        assert_eq!(*found[1].label(), "c");
    }

    #[test]
    fn test_empty_dataset() {
        let data: Dataset<&str> = Dataset::new();
        assert!(matches!(
            get_neighbors(&data, &[1.0, 2.0], 1),
            Err(KnnError::EmptyDataset)
        ));
    }

    #[test]
    fn test_zero_k() {
        assert!(matches!(
            get_neighbors(&grid(), &[1.0, 2.0], 0),
            Err(KnnError::InvalidK(0))
        ));
    }

    #[test]
    fn test_query_dimension_mismatch() {
        assert!(matches!(
            get_neighbors(&grid(), &[1.0, 2.0, 3.0], 1),
            Err(KnnError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }
}
