// AnalysisConfig
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use chrono::Duration;
use super::RetryPolicy;

/// Settings for one analysis run.
///
/// Everything the pipeline needs to know is in here. Nothing is read from
/// the environment once a run has started.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisConfig {
    /// Maximum number of objects the sampler examines per bucket.
    pub sample_limit: usize,

    /// How far back usage metrics are searched for a datapoint.
    ///
    /// S3 publishes storage metrics once a day, so this should be at least
    /// two days.
    pub lookback: Duration,

    /// Number of buckets collected at the same time.
    pub concurrency: usize,

    /// Retry policy applied to every backend call.
    pub retry: RetryPolicy,

    /// A bucket whose newest sampled object is younger than this is
    /// reported as active.
    pub activity_window: Duration,

    /// Label for the account or profile, carried onto the report.
    pub account: Option<String>,
}

impl Default for AnalysisConfig {
    /// Returns a default `AnalysisConfig`.
    ///
    /// ```text
    /// AnalysisConfig {
    ///     sample_limit:    1000,
    ///     lookback:        Duration::days(3),
    ///     concurrency:     8,
    ///     retry:           RetryPolicy::default(),
    ///     activity_window: Duration::days(30),
    ///     account:         None,
    /// }
    /// ```
    fn default() -> Self {
        Self {
            sample_limit:    1000,
            lookback:        Duration::days(3),
            concurrency:     8,
            retry:           RetryPolicy::default(),
            activity_window: Duration::days(30),
            account:         None,
        }
    }
}

impl AnalysisConfig {
    /// The concurrency bound, never less than one.
    pub fn concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}
