/// Data layer: roster types, loading, classification and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Roster
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  schema   │  identifier / subject / metadata columns
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  Total + Average → EnrichedRoster, low/lagging views
///   └───────────┘
///        │
///        ├──▶ filter   select a student by identifier
///        └──▶ summary  histogram, spread and chart series
/// ```

pub mod aggregate;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod schema;
pub mod summary;
