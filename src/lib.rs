// s3report: Inventory, usage, cost and content sampling for AWS S3 buckets.
#![forbid(unsafe_code)]
#![deny(missing_docs)]
//! Builds a point-in-time report of every S3 bucket in an account.
//!
//! Buckets are listed by [`BucketInventory`], then each one has its storage
//! metrics, cost estimate and an object sample collected concurrently. The
//! [`Aggregator`] merges the results into an [`AnalysisReport`] grouped by
//! region. Failures of a single collector only mark that bucket as partial;
//! an authorization failure cancels the whole run.
//!
//! Backends are reached through the traits in [`common`], so any of the AWS
//! clients can be swapped for another implementation.

/// Concurrent per-bucket collection and report assembly.
pub mod aggregator;

/// CloudWatch storage metrics backend.
pub mod cloudwatch;

/// Types shared by the collectors and backends.
pub mod common;

/// Bucket cost estimates.
pub mod cost;

/// Cost Explorer billing backend.
pub mod cost_explorer;

/// Bucket listing and static metadata.
pub mod inventory;

/// The report model.
pub mod model;

/// S3 storage backend.
pub mod s3;

/// Object listing samples.
pub mod sampler;

/// Plain text rendering of a report.
pub mod summary;

/// Bucket storage usage from metrics.
pub mod usage;

#[cfg(test)]
mod test_support;

pub use aggregator::{
    build_report,
    Aggregator,
};
pub use common::{
    AnalysisConfig,
    Backends,
    CollectError,
    ReportError,
};
pub use cost::CostEstimator;
pub use inventory::{
    BucketInventory,
    Inventory,
};
pub use model::AnalysisReport;
pub use sampler::ObjectSampler;
pub use summary::Summary;
pub use usage::UsageMetricsCollector;
