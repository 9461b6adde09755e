/// Data layer: loading, cleaning, filtering and aggregating listings.
///
/// Architecture:
/// ```text
///  .csv / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse file → RawTable (cached once per process)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ process  │  fill nulls, normalise, derive price/m² → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter  │  apply FilterCriteria → FilteredView
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate │  summary stats, district rankings, buy/rent ratio
///   └───────────┘
/// ```

pub mod aggregate;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod process;
