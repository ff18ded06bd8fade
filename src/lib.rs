//! Relative abundance of toxin protein families from proteomics exports.
//!
//! Venom researchers feed in (a) a peptide/protein identification table
//! exported from proteomics software (PEAKS and friends) and (b) external
//! replicate weights — manually entered relative fractions or HPLC peak
//! areas.  The pipeline deduplicates the export, inner-joins it against a
//! toxin-family annotation table, normalizes each intensity column,
//! re-weights by the measured fractions and aggregates into per-family
//! abundance:
//!
//! ```rust,ignore
//! use toxquant::data::{fraction::FractionVector, loader};
//! use toxquant::pipeline::{self, PipelineOptions};
//!
//! let peaks = loader::load_table("peaks_export.csv".as_ref())?;
//! let annotation = loader::builtin_annotation()?;
//! let fractions = FractionVector::from_text("0.4\n0.35\n0.25")?;
//!
//! let result = pipeline::compute(&peaks, &annotation, &fractions,
//!                                &PipelineOptions::default())?;
//! let csv = toxquant::export::to_csv_string(&result)?;
//! let slices = toxquant::chart::pie_series(&result);
//! ```
//!
//! The computation is a pure, stateless transform: no caching, no shared
//! state across requests.  Front ends hold the last successful result in a
//! per-request [`session::Session`].

pub mod chart;
pub mod color;
pub mod data;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod session;

pub use data::fraction::FractionVector;
pub use data::model::{CellValue, Table};
pub use error::AbundanceError;
pub use pipeline::{
    compute, compute_detailed, AbundanceResult, DedupKey, FamilyAbundance, PipelineOptions,
    ZeroSumPolicy,
};
