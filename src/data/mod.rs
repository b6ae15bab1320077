/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  day.csv / hour.csv  (URL or local file)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  fetch + parse + label → BikeDataset (memoized)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterCriteria → filtered RentalTable
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  group means / sums, pivot → GroupedTable, Matrix
///   └───────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ dashboard  │  every chart table for one criteria value
///   └───────────┘
/// ```

pub mod aggregate;
pub mod category;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
