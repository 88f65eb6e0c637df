//! k-nearest-neighbors classification over labeled, comma-separated data.

pub mod classifier;
pub mod dataset;
pub mod distance;
pub mod error;
pub mod neighbors;

pub use classifier::{evaluate, predict, Evaluation, KnnClassifier, KnnConfig, Outcome};
pub use dataset::{parse_features, Dataset, LabeledRow};
pub use distance::squared_euclidean;
pub use error::{KnnError, Result};
pub use neighbors::{get_neighbors, Neighbor};
