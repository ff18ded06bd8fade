use std::collections::{HashMap, HashSet};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::data::fraction::FractionVector;
use crate::data::model::{CellValue, Table, INTENSITY_MARKER};
use crate::error::AbundanceError;

/// Confidence-score column emitted by PEAKS exports, the default dedup key.
pub const DEFAULT_SCORE_COLUMN: &str = "-10lgP";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Which key collapses redundant peptide-level hits into one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupKey {
    /// Keep the first row per distinct confidence-score value.  Faithful to
    /// the historical behavior; note that two unrelated proteins sharing an
    /// identical score collapse into one row.
    Score { column: String },
    /// Keep the first row per accession (one row per protein).
    Accession,
}

impl Default for DedupKey {
    fn default() -> Self {
        DedupKey::Score {
            column: DEFAULT_SCORE_COLUMN.to_string(),
        }
    }
}

/// What to do when an intensity column sums to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroSumPolicy {
    /// Fail with [`AbundanceError::DivisionByZero`] naming the column.
    #[default]
    Fail,
    /// Emit 0 for every normalized cell of that column.
    ZeroFill,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub dedup: DedupKey,
    pub zero_sum: ZeroSumPolicy,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Aggregated abundance of one toxin family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyAbundance {
    pub toxin_family: String,
    pub total_sum: f64,
}

/// Per-family aggregated abundance, in first-seen order of the joined
/// table.  The terminal artifact: consumed by the pie chart and by CSV
/// export.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AbundanceResult {
    pub families: Vec<FamilyAbundance>,
}

impl AbundanceResult {
    /// Grand total across all families.
    pub fn total(&self) -> f64 {
        self.families.iter().map(|f| f.total_sum).sum()
    }

    pub fn get(&self, family: &str) -> Option<f64> {
        self.families
            .iter()
            .find(|f| f.toxin_family == family)
            .map(|f| f.total_sum)
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FamilyAbundance> {
        self.families.iter()
    }
}

/// Full pipeline output: the augmented per-protein table (selected columns
/// plus `_N`, `_P` and `total_sum`) alongside the per-family aggregation.
#[derive(Debug, Clone)]
pub struct DetailedAnalysis {
    pub table: Table,
    pub abundance: AbundanceResult,
}

// ---------------------------------------------------------------------------
// The pipeline
// ---------------------------------------------------------------------------

/// Compute per-family relative abundance.  Pure and deterministic for fixed
/// inputs; floating-point accumulation runs in column order.
pub fn compute(
    identification: &Table,
    annotation: &Table,
    fractions: &FractionVector,
    options: &PipelineOptions,
) -> Result<AbundanceResult, AbundanceError> {
    compute_detailed(identification, annotation, fractions, options).map(|d| d.abundance)
}

/// Like [`compute`], but also returns the intermediate analysis table for
/// researchers who want the per-protein breakdown.
pub fn compute_detailed(
    identification: &Table,
    annotation: &Table,
    fractions: &FractionVector,
    options: &PipelineOptions,
) -> Result<DetailedAnalysis, AbundanceError> {
    // -- Schema validation ---------------------------------------------------
    let id_acc = require_column(identification, "identification", "Accession")?;
    let intensity = identification.intensity_columns();
    if intensity.is_empty() {
        return Err(AbundanceError::Schema {
            table: "identification",
            column: INTENSITY_MARKER.to_string(),
        });
    }
    let dedup_col = match &options.dedup {
        DedupKey::Score { column } => Some(require_column(identification, "identification", column)?),
        DedupKey::Accession => None,
    };
    let ann_acc = require_column(annotation, "annotation", "Accession")?;
    let ann_desc = require_column(annotation, "annotation", "Description")?;
    let ann_family = require_column(annotation, "annotation", "toxin_family")?;

    // Weights pair with intensity columns by position; validate up front
    // instead of indexing out of range halfway through.
    if fractions.len() != intensity.len() {
        return Err(AbundanceError::InputAlignment {
            expected: intensity.len(),
            actual: fractions.len(),
        });
    }

    // -- 1. Deduplicate ------------------------------------------------------
    let mut seen: HashSet<&CellValue> = HashSet::new();
    let kept: Vec<usize> = identification
        .rows
        .iter()
        .enumerate()
        .filter(|(r, _)| {
            let key = identification.cell(*r, dedup_col.unwrap_or(id_acc));
            seen.insert(key)
        })
        .map(|(r, _)| r)
        .collect();
    debug!(
        "dedup: {} of {} identification rows kept",
        kept.len(),
        identification.len()
    );

    // -- 2. Inner join on Accession -----------------------------------------
    let mut by_accession: HashMap<String, Vec<usize>> = HashMap::new();
    for r in 0..annotation.len() {
        let acc = annotation.cell(r, ann_acc).to_string();
        by_accession.entry(acc).or_default().push(r);
    }

    // (identification row, annotation row) pairs, identification order first.
    let mut joined: Vec<(usize, usize)> = Vec::new();
    for &id_row in &kept {
        let acc = identification.cell(id_row, id_acc).to_string();
        if let Some(matches) = by_accession.get(&acc) {
            for &ann_row in matches {
                joined.push((id_row, ann_row));
            }
        }
    }
    if joined.is_empty() {
        return Err(AbundanceError::EmptyResult);
    }
    debug!("join: {} toxin rows", joined.len());

    // -- 3. Select columns, missing intensities become 0 ---------------------
    let area_names: Vec<&str> = intensity
        .iter()
        .map(|&c| identification.columns[c].as_str())
        .collect();
    let mut columns: Vec<String> = vec![
        "Accession".to_string(),
        "Description".to_string(),
        "toxin_family".to_string(),
    ];
    columns.extend(area_names.iter().map(|n| n.to_string()));

    // Raw intensity matrix, rows × intensity columns.
    let raw: Vec<Vec<f64>> = joined
        .iter()
        .map(|&(id_row, _)| {
            intensity
                .iter()
                .map(|&c| identification.cell(id_row, c).as_f64_or_zero())
                .collect()
        })
        .collect();

    // -- 4. Normalize each intensity column to its total ---------------------
    let mut normalized: Vec<Vec<f64>> = vec![vec![0.0; raw.len()]; intensity.len()];
    for (j, name) in area_names.iter().enumerate() {
        let sum: f64 = raw.iter().map(|row| row[j]).sum();
        if sum == 0.0 {
            match options.zero_sum {
                ZeroSumPolicy::Fail => {
                    return Err(AbundanceError::DivisionByZero {
                        column: name.to_string(),
                    })
                }
                ZeroSumPolicy::ZeroFill => continue,
            }
        }
        for (i, row) in raw.iter().enumerate() {
            normalized[j][i] = row[j] / sum;
        }
    }
    columns.extend(area_names.iter().map(|n| format!("{n}_N")));

    // -- 5. Re-weight by position-matched fractions --------------------------
    let weighted: Vec<Vec<f64>> = normalized
        .iter()
        .enumerate()
        .map(|(j, col)| col.iter().map(|v| v * fractions.0[j]).collect())
        .collect();
    columns.extend(area_names.iter().map(|n| format!("{n}_N_P")));

    // -- 6. Row totals, accumulated in column order --------------------------
    let totals: Vec<f64> = (0..joined.len())
        .map(|i| weighted.iter().map(|col| col[i]).sum())
        .collect();
    columns.push("total_sum".to_string());

    // -- Assemble the detailed table -----------------------------------------
    let mut table = Table::new(columns);
    for (i, &(id_row, ann_row)) in joined.iter().enumerate() {
        let mut cells = vec![
            identification.cell(id_row, id_acc).clone(),
            annotation.cell(ann_row, ann_desc).clone(),
            annotation.cell(ann_row, ann_family).clone(),
        ];
        cells.extend(raw[i].iter().map(|&v| CellValue::Float(v)));
        cells.extend((0..intensity.len()).map(|j| CellValue::Float(normalized[j][i])));
        cells.extend((0..intensity.len()).map(|j| CellValue::Float(weighted[j][i])));
        cells.push(CellValue::Float(totals[i]));
        table.push_row(cells);
    }

    // -- 7. Aggregate by toxin family, first-seen order ----------------------
    let mut order: HashMap<String, usize> = HashMap::new();
    let mut families: Vec<FamilyAbundance> = Vec::new();
    for (i, &(_, ann_row)) in joined.iter().enumerate() {
        let family = annotation.cell(ann_row, ann_family).to_string();
        let slot = *order.entry(family.clone()).or_insert_with(|| {
            families.push(FamilyAbundance {
                toxin_family: family,
                total_sum: 0.0,
            });
            families.len() - 1
        });
        families[slot].total_sum += totals[i];
    }

    Ok(DetailedAnalysis {
        table,
        abundance: AbundanceResult { families },
    })
}

fn require_column(
    table: &Table,
    table_name: &'static str,
    column: &str,
) -> Result<usize, AbundanceError> {
    table
        .column_index(column)
        .ok_or_else(|| AbundanceError::Schema {
            table: table_name,
            column: column.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identification(rows: &[(f64, &str, &[f64])]) -> Table {
        let n = rows.first().map(|(_, _, a)| a.len()).unwrap_or(0);
        let mut columns = vec![DEFAULT_SCORE_COLUMN.to_string(), "Accession".to_string()];
        columns.extend((1..=n).map(|i| format!("Area Sample {i}")));
        let mut t = Table::new(columns);
        for (score, acc, areas) in rows {
            let mut cells = vec![
                CellValue::Float(*score),
                CellValue::String(acc.to_string()),
            ];
            cells.extend(areas.iter().map(|&a| CellValue::Float(a)));
            t.push_row(cells);
        }
        t
    }

    fn annotation(rows: &[(&str, &str, &str)]) -> Table {
        let mut t = Table::new(vec![
            "Accession".into(),
            "Description".into(),
            "toxin_family".into(),
        ]);
        for (acc, desc, family) in rows {
            t.push_row(vec![
                CellValue::String(acc.to_string()),
                CellValue::String(desc.to_string()),
                CellValue::String(family.to_string()),
            ]);
        }
        t
    }

    fn fractions(w: &[f64]) -> FractionVector {
        FractionVector(w.to_vec())
    }

    #[test]
    fn worked_two_row_example() {
        // Two rows with an identical score collapse to one; each intensity
        // column then has a single row, so it normalizes to 1.0.
        let id = identification(&[
            (10.0, "P1", &[100.0, 300.0]),
            (10.0, "P1", &[999.0, 999.0]),
        ]);
        let ann = annotation(&[("P1", "desc", "Family X")]);
        let out = compute_detailed(&id, &ann, &fractions(&[0.5, 0.5]), &Default::default())
            .unwrap();

        assert_eq!(out.table.len(), 1);
        let n1 = out.table.column_index("Area Sample 1_N").unwrap();
        let n2 = out.table.column_index("Area Sample 2_N").unwrap();
        let p1 = out.table.column_index("Area Sample 1_N_P").unwrap();
        let total = out.table.column_index("total_sum").unwrap();
        assert_eq!(out.table.cell(0, n1).as_f64(), Some(1.0));
        assert_eq!(out.table.cell(0, n2).as_f64(), Some(1.0));
        assert_eq!(out.table.cell(0, p1).as_f64(), Some(0.5));
        assert_eq!(out.table.cell(0, total).as_f64(), Some(1.0));

        assert_eq!(out.abundance.families.len(), 1);
        assert_eq!(out.abundance.get("Family X"), Some(1.0));
    }

    #[test]
    fn distinct_scores_with_same_accession_are_not_merged() {
        let id = identification(&[
            (10.0, "P1", &[100.0]),
            (20.0, "P1", &[300.0]),
        ]);
        let ann = annotation(&[("P1", "desc", "Family X")]);
        let out = compute_detailed(&id, &ann, &fractions(&[1.0]), &Default::default()).unwrap();
        assert_eq!(out.table.len(), 2);

        let n = out.table.column_index("Area Sample 1_N").unwrap();
        assert_eq!(out.table.cell(0, n).as_f64(), Some(0.25));
        assert_eq!(out.table.cell(1, n).as_f64(), Some(0.75));
    }

    #[test]
    fn accession_dedup_strategy_collapses_proteins() {
        let id = identification(&[
            (10.0, "P1", &[100.0]),
            (20.0, "P1", &[300.0]),
            (30.0, "P2", &[100.0]),
        ]);
        let ann = annotation(&[("P1", "d", "A"), ("P2", "d", "B")]);
        let options = PipelineOptions {
            dedup: DedupKey::Accession,
            ..Default::default()
        };
        let out = compute_detailed(&id, &ann, &fractions(&[1.0]), &options).unwrap();
        // First P1 row survives, second is dropped.
        assert_eq!(out.table.len(), 2);
        assert_eq!(out.abundance.get("A"), Some(0.5));
        assert_eq!(out.abundance.get("B"), Some(0.5));
    }

    #[test]
    fn join_is_inner() {
        let id = identification(&[
            (10.0, "P1", &[100.0]),
            (20.0, "NOT_A_TOXIN", &[900.0]),
        ]);
        // P9 exists only in the annotation table and is ignored.
        let ann = annotation(&[("P1", "d", "A"), ("P9", "d", "Z")]);
        let out = compute(&id, &ann, &fractions(&[1.0]), &Default::default()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.get("A"), Some(1.0));
        assert_eq!(out.get("Z"), None);
    }

    #[test]
    fn zero_overlap_fails() {
        let id = identification(&[(10.0, "P1", &[100.0])]);
        let ann = annotation(&[("P9", "d", "Z")]);
        let err = compute(&id, &ann, &fractions(&[1.0]), &Default::default()).unwrap_err();
        assert_eq!(err, AbundanceError::EmptyResult);
    }

    #[test]
    fn misaligned_fractions_fail_short_and_long() {
        let id = identification(&[(10.0, "P1", &[100.0, 200.0])]);
        let ann = annotation(&[("P1", "d", "A")]);
        for bad in [&[0.5][..], &[0.3, 0.3, 0.4][..]] {
            let err = compute(&id, &ann, &fractions(bad), &Default::default()).unwrap_err();
            assert_eq!(
                err,
                AbundanceError::InputAlignment {
                    expected: 2,
                    actual: bad.len()
                }
            );
        }
    }

    #[test]
    fn normalized_columns_sum_to_one() {
        let id = identification(&[
            (10.0, "P1", &[100.0, 50.0]),
            (20.0, "P2", &[300.0, 150.0]),
            (30.0, "P3", &[600.0, 800.0]),
        ]);
        let ann = annotation(&[("P1", "d", "A"), ("P2", "d", "B"), ("P3", "d", "A")]);
        let out =
            compute_detailed(&id, &ann, &fractions(&[0.6, 0.4]), &Default::default()).unwrap();

        for name in ["Area Sample 1_N", "Area Sample 2_N"] {
            let col = out.table.column_index(name).unwrap();
            let sum: f64 = (0..out.table.len())
                .map(|r| out.table.cell(r, col).as_f64_or_zero())
                .sum();
            assert!((sum - 1.0).abs() < 1e-12, "{name} sums to {sum}");
        }
    }

    #[test]
    fn aggregation_preserves_mass() {
        let id = identification(&[
            (10.0, "P1", &[100.0, 50.0]),
            (20.0, "P2", &[300.0, 150.0]),
            (30.0, "P3", &[600.0, 800.0]),
        ]);
        let ann = annotation(&[("P1", "d", "A"), ("P2", "d", "B"), ("P3", "d", "A")]);
        let out =
            compute_detailed(&id, &ann, &fractions(&[0.6, 0.4]), &Default::default()).unwrap();

        // Grand total of all weighted cells equals the aggregated total.
        let mut grand = 0.0;
        for name in ["Area Sample 1_N_P", "Area Sample 2_N_P"] {
            let col = out.table.column_index(name).unwrap();
            grand += (0..out.table.len())
                .map(|r| out.table.cell(r, col).as_f64_or_zero())
                .sum::<f64>();
        }
        assert!((out.abundance.total() - grand).abs() < 1e-12);
        // Fractions sum to 1.0, so the grand total does too.
        assert!((grand - 1.0).abs() < 1e-12);
    }

    #[test]
    fn family_order_is_first_seen() {
        let id = identification(&[
            (10.0, "P1", &[100.0]),
            (20.0, "P2", &[300.0]),
            (30.0, "P3", &[600.0]),
        ]);
        let ann = annotation(&[("P1", "d", "Zeta"), ("P2", "d", "Alpha"), ("P3", "d", "Zeta")]);
        let out = compute(&id, &ann, &fractions(&[1.0]), &Default::default()).unwrap();
        let names: Vec<&str> = out.iter().map(|f| f.toxin_family.as_str()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn zero_sum_column_fails_by_default() {
        let id = identification(&[(10.0, "P1", &[0.0, 100.0])]);
        let ann = annotation(&[("P1", "d", "A")]);
        let err = compute(&id, &ann, &fractions(&[0.5, 0.5]), &Default::default()).unwrap_err();
        assert_eq!(
            err,
            AbundanceError::DivisionByZero {
                column: "Area Sample 1".into()
            }
        );
    }

    #[test]
    fn zero_sum_column_can_zero_fill() {
        let id = identification(&[(10.0, "P1", &[0.0, 100.0])]);
        let ann = annotation(&[("P1", "d", "A")]);
        let options = PipelineOptions {
            zero_sum: ZeroSumPolicy::ZeroFill,
            ..Default::default()
        };
        let out = compute_detailed(&id, &ann, &fractions(&[0.5, 0.5]), &options).unwrap();
        let n1 = out.table.column_index("Area Sample 1_N").unwrap();
        assert_eq!(out.table.cell(0, n1).as_f64(), Some(0.0));
        // Only the nonzero column contributes.
        assert_eq!(out.abundance.get("A"), Some(0.5));
    }

    #[test]
    fn missing_columns_are_schema_errors() {
        let ann = annotation(&[("P1", "d", "A")]);
        let fv = fractions(&[1.0]);

        let no_acc = Table::new(vec![DEFAULT_SCORE_COLUMN.into(), "Area 1".into()]);
        assert!(matches!(
            compute(&no_acc, &ann, &fv, &Default::default()),
            Err(AbundanceError::Schema { table: "identification", column }) if column == "Accession"
        ));

        let no_area = Table::new(vec![DEFAULT_SCORE_COLUMN.into(), "Accession".into()]);
        assert!(matches!(
            compute(&no_area, &ann, &fv, &Default::default()),
            Err(AbundanceError::Schema { column, .. }) if column == "Area"
        ));

        let id = identification(&[(10.0, "P1", &[100.0])]);
        let no_family = Table::new(vec!["Accession".into(), "Description".into()]);
        assert!(matches!(
            compute(&id, &no_family, &fv, &Default::default()),
            Err(AbundanceError::Schema { table: "annotation", column }) if column == "toxin_family"
        ));
    }

    #[test]
    fn missing_intensity_cells_count_as_zero() {
        let mut id = Table::new(vec![
            DEFAULT_SCORE_COLUMN.into(),
            "Accession".into(),
            "Area 1".into(),
        ]);
        id.push_row(vec![CellValue::Float(10.0), CellValue::String("P1".into())]);
        id.push_row(vec![
            CellValue::Float(20.0),
            CellValue::String("P2".into()),
            CellValue::Float(100.0),
        ]);
        let ann = annotation(&[("P1", "d", "A"), ("P2", "d", "B")]);
        let out = compute(&id, &ann, &fractions(&[1.0]), &Default::default()).unwrap();
        assert_eq!(out.get("A"), Some(0.0));
        assert_eq!(out.get("B"), Some(1.0));
    }
}
