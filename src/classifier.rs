use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use log::{debug, info, warn};

use crate::dataset::Dataset;
use crate::error::{KnnError, Result};
use crate::neighbors::{get_neighbors, Neighbor};

/// Configuration options for k-NN classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnnConfig {
    /// Number of neighbors consulted per prediction.
    pub k: usize,
    /// When set, asking for more neighbors than there are training rows is
    /// an [`KnnError::InsufficientData`] error instead of a silent truncation.
    pub strict: bool,
}

impl KnnConfig {
    /// Create a new config with `strict` disabled.
    pub fn new(k: usize) -> Self {
        Self { k, strict: false }
    }

    /// Customize strict handling of `k > len(dataset)`.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(KnnError::InvalidK(self.k));
        }
        Ok(())
    }
}

/// A k-NN classifier that owns its training data and predicts by majority vote.
///
/// # Type Parameters
/// - `L`: The label type. Must be `Eq + Hash` so votes can be tallied in a `HashMap`.
///
/// The training dataset is never modified by predictions, so a classifier can
/// be shared by reference across threads when `L: Sync`.
#[derive(Debug, Clone)]
pub struct KnnClassifier<L> {
    dataset: Dataset<L>,
    config: KnnConfig,
}

impl<L: Eq + Hash + Clone> KnnClassifier<L> {
    /// Constructs a new `KnnClassifier`.
    ///
    /// An empty dataset is accepted here; every prediction against it fails
    /// with [`KnnError::EmptyDataset`].
    ///
    /// # Errors
    ///
    /// - [`KnnError::InvalidK`] if `config.k == 0`.
    pub fn new(dataset: Dataset<L>, config: KnnConfig) -> Result<Self> {
        config.validate()?;
        let classifier = Self { dataset, config };
        classifier.warn_if_truncating();
        Ok(classifier)
    }

    pub fn k(&self) -> usize {
        self.config.k
    }

    /// Change the number of neighbors used by later predictions.
    pub fn set_k(&mut self, k: usize) -> Result<()> {
        let config = KnnConfig { k, ..self.config };
        config.validate()?;
        self.config = config;
        self.warn_if_truncating();
        Ok(())
    }

    pub fn config(&self) -> &KnnConfig {
        &self.config
    }

    pub fn dataset(&self) -> &Dataset<L> {
        &self.dataset
    }

    /// The `k` nearest training rows to `query`, honoring `strict`.
    pub fn neighbors(&self, query: &[f64]) -> Result<Vec<Neighbor<'_, L>>> {
        neighbors_with(&self.dataset, query, &self.config)
    }

    /// Predict the label for a single query point using majority vote among its `k` nearest neighbors.
    ///
    /// # Example
    ///
    /// ```
    /// use knn_vote::{Dataset, KnnClassifier, KnnConfig, LabeledRow};
    ///
    /// let dataset = Dataset::from_rows(vec![
    ///     LabeledRow::new(vec![1.0, 2.0], "A"),
    ///     LabeledRow::new(vec![2.0, 3.0], "A"),
    ///     LabeledRow::new(vec![3.0, 3.0], "B"),
    ///     LabeledRow::new(vec![6.0, 7.0], "B"),
    /// ])
    /// .unwrap();
    ///
    /// let knn = KnnClassifier::new(dataset, KnnConfig::new(3)).unwrap();
    /// assert_eq!(knn.predict(&[2.1, 2.9]).unwrap(), "A");
    /// ```
    pub fn predict(&self, query: &[f64]) -> Result<L> {
        let neighbors = self.neighbors(query)?;
        majority_vote(&neighbors)
    }

    /// Predict labels for multiple query points at once.
    pub fn predict_batch(&self, queries: &[Vec<f64>]) -> Result<Vec<L>> {
        queries.iter().map(|q| self.predict(q)).collect()
    }

    /// Classify every row of `test_set` and compare with its own label.
    pub fn evaluate(&self, test_set: &Dataset<L>) -> Result<Evaluation<L>> {
        evaluate_with(&self.dataset, test_set, &self.config)
    }

    fn warn_if_truncating(&self) {
        if !self.config.strict && self.config.k > self.dataset.len() {
            warn!(
                "k = {} exceeds the {} training rows; predictions will use all rows",
                self.config.k,
                self.dataset.len()
            );
        }
    }
}

/// Predict the label of `query` by majority vote among its `k` nearest rows.
///
/// When several labels share the top vote count, the label whose first
/// occurrence is nearest to the query wins.
///
/// # Errors
///
/// - [`KnnError::EmptyDataset`] if `dataset` is empty.
/// - [`KnnError::InvalidK`] if `k == 0`.
/// - [`KnnError::DimensionMismatch`] if `query` has the wrong length.
pub fn predict<L: Eq + Hash + Clone>(dataset: &Dataset<L>, query: &[f64], k: usize) -> Result<L> {
    let neighbors = get_neighbors(dataset, query, k)?;
    majority_vote(&neighbors)
}

/// Classify each row of `test_set` against `dataset` and report accuracy.
///
/// # Errors
///
/// - [`KnnError::EmptyDataset`] if either dataset is empty.
/// - Any error [`predict`] raises for an individual row.
pub fn evaluate<L: Eq + Hash + Clone>(
    dataset: &Dataset<L>,
    test_set: &Dataset<L>,
    k: usize,
) -> Result<Evaluation<L>> {
    evaluate_with(dataset, test_set, &KnnConfig::new(k))
}

fn neighbors_with<'a, L>(
    dataset: &'a Dataset<L>,
    query: &[f64],
    config: &KnnConfig,
) -> Result<Vec<Neighbor<'a, L>>> {
    if config.strict && !dataset.is_empty() && config.k > dataset.len() {
        return Err(KnnError::InsufficientData {
            k: config.k,
            available: dataset.len(),
        });
    }
    get_neighbors(dataset, query, config.k)
}

fn evaluate_with<L: Eq + Hash + Clone>(
    dataset: &Dataset<L>,
    test_set: &Dataset<L>,
    config: &KnnConfig,
) -> Result<Evaluation<L>> {
    if test_set.is_empty() {
        return Err(KnnError::EmptyDataset);
    }

    let mut outcomes = Vec::with_capacity(test_set.len());
    for row in test_set {
        let neighbors = neighbors_with(dataset, row.features(), config)?;
        outcomes.push(Outcome {
            expected: row.label().clone(),
            predicted: majority_vote(&neighbors)?,
        });
    }

    let correct = outcomes.iter().filter(|o| o.is_correct()).count();
    let accuracy = correct as f64 / outcomes.len() as f64;
    info!(
        "evaluated {} rows with k = {}: {} correct, accuracy {:.4}",
        outcomes.len(),
        config.k,
        correct,
        accuracy
    );
    Ok(Evaluation { outcomes, accuracy })
}

/// Majority vote over the labels of `neighbors`, which must be sorted nearest
/// first. Equal counts go to the label seen first in that order.
fn majority_vote<L: Eq + Hash + Clone>(neighbors: &[Neighbor<'_, L>]) -> Result<L> {
    // label -> (votes, position of first occurrence)
    let mut tally: HashMap<&L, (usize, usize)> = HashMap::new();
    for (position, neighbor) in neighbors.iter().enumerate() {
        tally.entry(neighbor.label()).or_insert((0, position)).0 += 1;
    }

    let (label, (votes, _)) = tally
        .into_iter()
        .max_by(|(_, (votes_a, first_a)), (_, (votes_b, first_b))| {
            votes_a.cmp(votes_b).then(first_b.cmp(first_a))
        })
        .ok_or(KnnError::EmptyDataset)?;
    debug!("{} of {} neighbors voted for the winner", votes, neighbors.len());
    Ok(label.clone())
}

/// Expected and predicted label of one test row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<L> {
    pub expected: L,
    pub predicted: L,
}

impl<L: PartialEq> Outcome<L> {
    pub fn is_correct(&self) -> bool {
        self.expected == self.predicted
    }
}

/// Result of classifying a labeled test set.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation<L> {
    /// One entry per test row, in test set order.
    pub outcomes: Vec<Outcome<L>>,
    /// Fraction of correct predictions, in `[0, 1]`.
    pub accuracy: f64,
}

impl<L: PartialEq> Evaluation<L> {
    pub fn correct(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_correct()).count()
    }
}

impl<L: fmt::Display> fmt::Display for Evaluation<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            writeln!(
                f,
                "Expected={}, Predicted={}",
                outcome.expected, outcome.predicted
            )?;
        }
        write!(f, "Accuracy: {}", self.accuracy)
    }
}
