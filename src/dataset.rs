use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use log::{debug, info};

use crate::error::{KnnError, Result};

/// One observation: its features and the class it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRow<L> {
    features: Vec<f64>,
    label: L,
}

impl<L> LabeledRow<L> {
    pub fn new(features: Vec<f64>, label: L) -> Self {
        Self { features, label }
    }

    pub fn features(&self) -> &[f64] {
        &self.features
    }

    pub fn label(&self) -> &L {
        &self.label
    }

    pub fn dimension(&self) -> usize {
        self.features.len()
    }
}

/// An ordered, append-only collection of labeled rows sharing one dimension.
///
/// The dimension is fixed by the first row; every later row must match it.
/// Row order is preserved because neighbor search breaks distance ties by
/// insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset<L> {
    rows: Vec<LabeledRow<L>>,
}

impl<L> Default for Dataset<L> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<L> Dataset<L> {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dataset from rows, checking that they all share one dimension.
    pub fn from_rows(rows: impl IntoIterator<Item = LabeledRow<L>>) -> Result<Self> {
        let mut dataset = Self::new();
        for row in rows {
            dataset.push(row)?;
        }
        Ok(dataset)
    }

    /// Append a row.
    ///
    /// # Errors
    ///
    /// - [`KnnError::DimensionMismatch`] if the row's length differs from the
    ///   rows already stored.
    pub fn push(&mut self, row: LabeledRow<L>) -> Result<()> {
        if let Some(expected) = self.dimension() {
            if row.dimension() != expected {
                return Err(KnnError::DimensionMismatch {
                    expected,
                    actual: row.dimension(),
                });
            }
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of features per row, or `None` while the dataset is empty.
    pub fn dimension(&self) -> Option<usize> {
        self.rows.first().map(LabeledRow::dimension)
    }

    pub fn rows(&self) -> &[LabeledRow<L>] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LabeledRow<L>> {
        self.rows.iter()
    }
}

impl<'a, L> IntoIterator for &'a Dataset<L> {
    type Item = &'a LabeledRow<L>;
    type IntoIter = std::slice::Iter<'a, LabeledRow<L>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl<L> Dataset<L>
where
    L: FromStr,
    L::Err: Display,
{
    /// Parse comma-separated records, one per line.
    ///
    /// Every field but the last is a feature value; the last field is the
    /// label, parsed with `L::from_str` so a `String` label keeps the raw
    /// token. Blank lines are skipped and fields are trimmed.
    ///
    /// # Errors
    ///
    /// - [`KnnError::Parse`] for a non-numeric or non-finite feature, a line
    ///   without any feature, or a label `L` rejects.
    /// - [`KnnError::DimensionMismatch`] if rows disagree in length.
    /// - [`KnnError::Io`] if the reader fails.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut dataset = Self::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            dataset.push(parse_record(idx + 1, &line)?)?;
        }
        debug!(
            "parsed {} rows of dimension {:?}",
            dataset.len(),
            dataset.dimension()
        );
        Ok(dataset)
    }

    /// Open `path` and parse it with [`Dataset::from_reader`].
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let dataset = Self::from_reader(BufReader::new(file))?;
        info!(
            "loaded {} rows ({} features) from {}",
            dataset.len(),
            dataset.dimension().unwrap_or(0),
            path.display()
        );
        Ok(dataset)
    }
}

/// Parse a query observation: comma-separated feature values, no label.
pub fn parse_features(input: &str) -> Result<Vec<f64>> {
    input
        .split(',')
        .enumerate()
        .map(|(idx, token)| parse_feature(1, idx + 1, token))
        .collect()
}

fn parse_record<L>(line: usize, text: &str) -> Result<LabeledRow<L>>
where
    L: FromStr,
    L::Err: Display,
{
    let fields: Vec<&str> = text.split(',').map(str::trim).collect();
    let (label_token, feature_tokens) = match fields.split_last() {
        Some((last, rest)) if !rest.is_empty() => (*last, rest),
        _ => {
            return Err(KnnError::Parse {
                line,
                field: 1,
                token: text.to_string(),
                reason: "expected at least one feature before the label".to_string(),
            })
        }
    };

    let features = feature_tokens
        .iter()
        .enumerate()
        .map(|(idx, token)| parse_feature(line, idx + 1, token))
        .collect::<Result<Vec<_>>>()?;

    let label_field = fields.len();
    if label_token.is_empty() {
        return Err(KnnError::Parse {
            line,
            field: label_field,
            token: String::new(),
            reason: "empty label".to_string(),
        });
    }
    let label = label_token.parse::<L>().map_err(|e| KnnError::Parse {
        line,
        field: label_field,
        token: label_token.to_string(),
        reason: e.to_string(),
    })?;

    Ok(LabeledRow::new(features, label))
}

fn parse_feature(line: usize, field: usize, token: &str) -> Result<f64> {
    let token = token.trim();
    let value = token.parse::<f64>().map_err(|e| KnnError::Parse {
        line,
        field,
        token: token.to_string(),
        reason: e.to_string(),
    })?;
    if !value.is_finite() {
        return Err(KnnError::Parse {
            line,
            field,
            token: token.to_string(),
            reason: "not a finite number".to_string(),
        });
    }
    Ok(value)
}
