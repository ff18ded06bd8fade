/// Data layer: core table types, loading, and fraction weights.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐      ┌────────────────┐
///   │   Table   │      │ FractionVector  │  text / weight-table input
///   └──────────┘      └────────────────┘
///        │                     │
///        └──────────┬──────────┘
///                   ▼
///             pipeline::compute
/// ```
pub mod fraction;
pub mod loader;
pub mod model;
