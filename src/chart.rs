use crate::color::{FamilyColors, Rgb};
use crate::pipeline::AbundanceResult;

// ---------------------------------------------------------------------------
// Pie-chart series
// ---------------------------------------------------------------------------

/// Slices whose share of the total is at or below this threshold stay in
/// the chart but are rendered unlabeled.
pub const LABEL_THRESHOLD: f64 = 0.01;

/// One pie slice.  `share` is `value / total`; `label` is `None` for
/// slices at or below [`LABEL_THRESHOLD`].
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub family: String,
    pub value: f64,
    pub share: f64,
    pub label: Option<String>,
    pub color: Rgb,
}

/// Turn an [`AbundanceResult`] into a pie-chart series, one slice per
/// family in result order.
pub fn pie_series(result: &AbundanceResult) -> Vec<PieSlice> {
    let total = result.total();
    let colors = FamilyColors::new(result.iter().map(|f| f.toxin_family.as_str()));

    result
        .iter()
        .map(|f| {
            let share = if total == 0.0 {
                0.0
            } else {
                f.total_sum / total
            };
            let label = if share > LABEL_THRESHOLD {
                Some(format!("{}: {:.2}%", f.toxin_family, share * 100.0))
            } else {
                None
            };
            PieSlice {
                family: f.toxin_family.clone(),
                value: f.total_sum,
                share,
                label,
                color: colors.color_for(&f.toxin_family),
            }
        })
        .collect()
}
