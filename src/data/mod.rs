/// Data layer: core table types, loading, and row filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet / http(s) URL
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse source → Table (types inferred per column)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  named, equal-length typed columns
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  row predicates → kept indices
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
