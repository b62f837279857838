mod columns;
pub mod curve;
pub mod engine;
pub mod ranking;
pub mod report;

pub use columns::ColumnFilter;
pub use curve::{average_precision, roc_auc, CurveError};
pub use engine::{evaluate, DegradedReason, Evaluation, ShapeError};
pub use ranking::{label_ranking_average_precision, rmse};
pub use report::MetricReport;

/// Ground truth cells at or above this value count as positive.
pub const POSITIVE_THRESHOLD: f32 = 0.5;

#[inline]
pub(crate) fn is_positive(value: f32) -> bool {
    value >= POSITIVE_THRESHOLD
}
