// Cost rollup engine for the manufacturing reporting dashboard.
//
// Three pure transformations over in-memory snapshots:
// - `pivot`: flat cost records -> zone / cell type / month / week rollup,
//   column-aligned across zones.
// - `merge_detail`: zone-scoped detail rows -> per-cell overlay.
// - `normalize_kpi`: either upstream KPI payload shape -> canonical indicators.
//
// `session` tracks expand/collapse drill-downs and discards stale fetches.

pub mod config;
pub mod detail;
pub mod error;
pub mod kpi;
pub mod loader;
pub mod months;
pub mod output;
pub mod pivot;
pub mod session;
pub mod types;
pub mod util;

pub use detail::{merge_detail, merge_detail_json, merge_zone_detail, DetailInput};
pub use error::{Result, RollupError};
pub use kpi::{normalize_kpi, KpiPayload};
pub use pivot::{build_week_index, pivot, pivot_json, pivot_scoped};
pub use session::{DetailSource, DrilldownState, ExpandOutcome, FileDetailSource, RequestToken};
pub use types::*;
pub use util::to_number;
