pub mod aggregator;
pub mod reporter;
pub mod summary;
pub mod template;
pub mod types;

pub use reporter::{ReportOptions, Reporter};
pub use types::{EmailReport, HistoricalData, RepoReport, SummaryEmailReport, TrendMetrics};
