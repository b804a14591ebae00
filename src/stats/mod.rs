//! Stats module - aggregation and results export

mod aggregator;
mod export;

pub use aggregator::{Aggregator, GroupKey, GroupStatistics, GroupSummary, PropertyStats};
pub use export::{
    read_result_series, write_group_averages, write_individual_results, write_summary_report,
    ExportError, SampleResult, INDIVIDUAL_RESULTS_FILE, MULTI_RUN_AVERAGES_FILE,
    SUMMARY_REPORT_FILE,
};
