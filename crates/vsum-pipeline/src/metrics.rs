//! Pipeline metrics collection.
//!
//! - Runs by outcome and total duration
//! - Per-stage durations
//! - Coordinator admissions and active jobs
//! - LLM requests, retries and summary repairs
//! - Caption blob write failures

use metrics::{counter, gauge, histogram};

// =============================================================================
// Metric Names
// =============================================================================

/// Metric name constants for consistency.
pub mod names {
    /// Pipeline runs by outcome.
    pub const PIPELINE_RUNS_TOTAL: &str = "vsum_pipeline_runs_total";

    /// Pipeline run duration in seconds by outcome.
    pub const PIPELINE_DURATION_SECONDS: &str = "vsum_pipeline_duration_seconds";

    /// Stage duration in seconds by stage.
    pub const STAGE_DURATION_SECONDS: &str = "vsum_pipeline_stage_duration_seconds";

    /// Coordinator admissions by result.
    pub const ADMISSIONS_TOTAL: &str = "vsum_coordinator_admissions_total";

    /// Live coordinator entries.
    pub const ACTIVE_JOBS: &str = "vsum_coordinator_active_jobs";

    /// LLM requests by provider and status.
    pub const LLM_REQUESTS_TOTAL: &str = "vsum_llm_requests_total";

    /// LLM request latency in seconds by provider.
    pub const LLM_LATENCY_SECONDS: &str = "vsum_llm_latency_seconds";

    /// Summaries that needed a repair round.
    pub const SUMMARY_REPAIRS_TOTAL: &str = "vsum_summary_repairs_total";

    /// Failed caption blob writes.
    pub const BLOB_WRITE_FAILURES_TOTAL: &str = "vsum_blob_write_failures_total";
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record a finished pipeline run.
pub fn record_run(outcome: &'static str, duration_secs: f64) {
    counter!(names::PIPELINE_RUNS_TOTAL, "outcome" => outcome).increment(1);
    histogram!(names::PIPELINE_DURATION_SECONDS, "outcome" => outcome).record(duration_secs);
}

/// Record the duration of one pipeline stage.
pub fn record_stage(stage: &'static str, duration_secs: f64) {
    histogram!(names::STAGE_DURATION_SECONDS, "stage" => stage).record(duration_secs);
}

/// Record an admission decision.
pub fn record_admission(admitted: bool) {
    let result = if admitted { "admitted" } else { "already_in_flight" };
    counter!(names::ADMISSIONS_TOTAL, "result" => result).increment(1);
}

/// Set the number of live coordinator entries.
pub fn set_active_jobs(count: usize) {
    gauge!(names::ACTIVE_JOBS).set(count as f64);
}

/// Record one LLM HTTP attempt.
pub fn record_llm_request(provider: &'static str, status: &'static str, latency_secs: f64) {
    counter!(names::LLM_REQUESTS_TOTAL, "provider" => provider, "status" => status).increment(1);
    histogram!(names::LLM_LATENCY_SECONDS, "provider" => provider).record(latency_secs);
}

pub fn record_summary_repair() {
    counter!(names::SUMMARY_REPAIRS_TOTAL).increment(1);
}

pub fn record_blob_write_failure() {
    counter!(names::BLOB_WRITE_FAILURES_TOTAL).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_prefixed() {
        for name in [
            names::PIPELINE_RUNS_TOTAL,
            names::STAGE_DURATION_SECONDS,
            names::ADMISSIONS_TOTAL,
            names::ACTIVE_JOBS,
            names::LLM_REQUESTS_TOTAL,
            names::BLOB_WRITE_FAILURES_TOTAL,
        ] {
            assert!(name.starts_with("vsum_"), "{name}");
        }
    }
}
