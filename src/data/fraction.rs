use serde::{Deserialize, Serialize};

use super::model::Table;
use crate::error::AbundanceError;

// ---------------------------------------------------------------------------
// FractionVector – external replicate weights
// ---------------------------------------------------------------------------

/// Ordered replicate weights, one per intensity column of the
/// identification table, paired by position.
///
/// Weights are not range-checked: negative or zero values are structurally
/// permitted (they zero out or invert a replicate's contribution), matching
/// how manually entered fractions behave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FractionVector(pub Vec<f64>);

impl FractionVector {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse manually entered relative-fraction text: one value per line,
    /// blank lines dropped.  Any other unparseable line fails with
    /// [`AbundanceError::InputFormat`] naming the 1-based line number.
    pub fn from_text(text: &str) -> Result<Self, AbundanceError> {
        let mut weights = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let value = line
                .parse::<f64>()
                .map_err(|_| AbundanceError::InputFormat {
                    line: i + 1,
                    value: line.to_string(),
                })?;
            weights.push(value);
        }
        Ok(FractionVector(weights))
    }

    /// Build weights from an uploaded weight table (the HPLC peak-area
    /// variant).  Row `i` supplies the weight for intensity column `i`;
    /// every column of the table is a separate factor and the per-row
    /// weight is their product (peak area × fold factor in the two-column
    /// case).  Non-numeric cells fail with [`AbundanceError::InputFormat`].
    pub fn from_table(table: &Table) -> Result<Self, AbundanceError> {
        let mut weights = Vec::with_capacity(table.len());
        for (row_no, row) in table.rows.iter().enumerate() {
            let mut product = 1.0;
            for cell in row {
                let factor = cell.as_f64().ok_or_else(|| AbundanceError::InputFormat {
                    line: row_no + 1,
                    value: cell.to_string(),
                })?;
                product *= factor;
            }
            weights.push(product);
        }
        Ok(FractionVector(weights))
    }
}
