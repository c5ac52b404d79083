// Aggregator: fans the collectors out per bucket and folds the results into
// an AnalysisReport
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use chrono::{
    DateTime,
    Utc,
};
use crate::common::{
    AnalysisConfig,
    Backends,
    CollectError,
    MetricWindow,
    ReportError,
};
use crate::cost::CostEstimator;
use crate::inventory::{
    BucketInventory,
    Inventory,
};
use crate::model::{
    AnalysisReport,
    BillingPeriod,
    Bucket,
    BucketRecord,
    CollectionFailure,
    Collector,
    RegionGroup,
};
use crate::sampler::ObjectSampler;
use crate::usage::UsageMetricsCollector;
use futures::stream::{
    self,
    StreamExt,
};
use std::future::Future;
use std::pin::pin;
use tracing::{
    debug,
    info,
    warn,
};

/// List every bucket in the account and build a report on them.
///
/// This is the whole pipeline: `BucketInventory` followed by
/// `Aggregator::report_for`.
pub async fn build_report(
    backends: &Backends,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, ReportError> {
    let inventory = BucketInventory::new(backends.buckets.as_ref(), config)
        .list_buckets()
        .await
        .map_err(|err| fatal(err, 0))?;

    Aggregator::new(backends, config)
        .report_for(inventory)
        .await
}

/// Runs the per-bucket collectors and groups their results by region.
pub struct Aggregator<'a> {
    backends: &'a Backends,
    config:   &'a AnalysisConfig,
}

impl<'a> Aggregator<'a> {
    /// Return a new `Aggregator` using `backends`.
    pub fn new(backends: &'a Backends, config: &'a AnalysisConfig) -> Self {
        Self {
            backends,
            config,
        }
    }

    /// Collect usage, cost and an object sample for every bucket in
    /// `inventory` and build the report.
    ///
    /// Up to `concurrency` buckets are collected at once. A collector
    /// failing for one bucket is recorded on that bucket's record. An
    /// authorization failure stops the run: buckets still in flight are
    /// abandoned, queued ones are never started, and the error reports how
    /// many records had been merged.
    pub async fn report_for(
        &self,
        inventory: Inventory,
    ) -> Result<AnalysisReport, ReportError> {
        let generated_at = Utc::now();
        let window = MetricWindow::ending(generated_at, self.config.lookback);
        let period = BillingPeriod::containing(generated_at.date_naive());

        info!(
            buckets = inventory.buckets.len(),
            concurrency = self.config.concurrency(),
            %period,
            "collecting bucket data"
        );

        let mut records: Vec<Option<BucketRecord>> = Vec::new();
        records.resize_with(inventory.buckets.len(), || None);

        let mut completed = 0;

        // Tag each bucket with its inventory position so the records can be
        // put back in order, whatever order they finish in.
        let mut collected = pin!(
            stream::iter(inventory.buckets.into_iter().enumerate())
                .map(|(index, bucket)| async move {
                    let record = self.collect(bucket, window, period, generated_at)
                        .await;

                    (index, record)
                })
                .buffer_unordered(self.config.concurrency())
        );

        while let Some((index, record)) = collected.next().await {
            match record {
                Ok(record) => {
                    records[index] = Some(record);
                    completed += 1;
                },
                Err(err) => {
                    warn!(completed, error = %err, "authorization failed, cancelling run");

                    return Err(fatal(err, completed));
                },
            }
        }

        let regions = group_by_region(records.into_iter().flatten());

        let report = AnalysisReport::new(
            self.config.account.clone(),
            generated_at,
            regions,
            inventory.dropped,
            inventory.listing_complete,
        );

        info!(
            buckets = report.totals().buckets,
            regions = report.regions().len(),
            partial = report.partial().len(),
            "report built"
        );

        Ok(report)
    }

    // Run the three collectors for one bucket at the same time and merge
    // their results. Only an authorization failure is an error here.
    async fn collect(
        &self,
        bucket: Bucket,
        window: MetricWindow,
        period: BillingPeriod,
        now: DateTime<Utc>,
    ) -> Result<BucketRecord, CollectError> {
        let retry = &self.config.retry;
        let name = bucket.name.as_str();

        debug!("collect: Starting '{}'", name);

        let usage = UsageMetricsCollector::new(self.backends.usage.as_ref(), retry);
        let cost = CostEstimator::new(self.backends.cost.as_ref(), retry);
        let sampler = ObjectSampler::new(self.backends.objects.as_ref(), retry);

        let (usage, cost, sample) = futures::try_join!(
            fatal_only(usage.get_usage(&bucket, &window)),
            fatal_only(cost.get_cost(name, period)),
            fatal_only(sampler.sample_objects(&bucket, self.config.sample_limit)),
        )?;

        let mut failures = Vec::new();

        let usage = keep(name, Collector::Usage, usage, &mut failures);
        let cost = keep(name, Collector::Cost, cost, &mut failures);
        let sample = keep(name, Collector::Sample, sample, &mut failures);

        let active = sample
            .as_ref()
            .and_then(|s| s.is_active(now, self.config.activity_window));

        debug!("collect: Finished '{}' with {} failures", name, failures.len());

        Ok(BucketRecord {
            bucket,
            usage,
            cost,
            sample,
            failures,
            active,
        })
    }
}

// Lift authorization failures out so they abort the bucket, leaving every
// other failure for the record.
async fn fatal_only<T, F>(
    collector: F,
) -> Result<Result<T, CollectError>, CollectError>
where
    F: Future<Output = Result<T, CollectError>>,
{
    match collector.await {
        Err(err) if err.is_authorization() => Err(err),
        result                             => Ok(result),
    }
}

// Keep a collector's result, or note why it's missing.
fn keep<T>(
    bucket: &str,
    collector: Collector,
    result: Result<T, CollectError>,
    failures: &mut Vec<CollectionFailure>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err)  => {
            warn!(bucket, %collector, error = %err, "collector failed");

            failures.push(CollectionFailure {
                collector,
                reason: err.to_string(),
            });

            None
        },
    }
}

fn fatal(err: CollectError, completed: usize) -> ReportError {
    ReportError::Authorization {
        message: err.to_string(),
        completed,
    }
}

/// Group records by region. Regions appear in the order their first bucket
/// does, and records keep their relative order within a region.
pub fn group_by_region<I>(records: I) -> Vec<RegionGroup>
where
    I: IntoIterator<Item = BucketRecord>,
{
    let mut groups: Vec<RegionGroup> = Vec::new();

    for record in records {
        let region = record.bucket.region_name();

        match groups.iter().position(|g| g.region() == region) {
            Some(i) => groups[i].push(record),
            None    => {
                let mut group = RegionGroup::new(region);
                group.push(record);
                groups.push(group);
            },
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Availability,
        Cost,
    };
    use crate::test_support::{
        backends,
        quick_config,
        timestamp,
        FakeAccount,
        FakeBucket,
        Fault,
    };
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn record_names(group: &RegionGroup) -> Vec<&str> {
        group.records()
            .iter()
            .map(|r| r.bucket.name.as_str())
            .collect()
    }

    #[tokio::test]
    async fn test_build_report_three_buckets() {
        let account = Arc::new(FakeAccount::new(vec![
            FakeBucket::new("a", "us-east-1")
                .usage("StandardStorage", 0.0)
                .cost(0.0),
            FakeBucket::new("b", "us-east-1")
                .usage("StandardStorage", 2_048.0)
                .cost_state(Cost::Disabled),
            FakeBucket::new("c", "eu-west-1")
                .usage("StandardStorage", 1_000_000.0)
                .cost(4.25),
        ])
        .fail("storage_types", "c", Fault::Throttled));

        let config = quick_config();
        let report = build_report(&backends(&account), &config).await.unwrap();

        let regions: Vec<&str> = report.regions()
            .iter()
            .map(|g| g.region())
            .collect();

        assert_eq!(regions, vec!["us-east-1", "eu-west-1"]);

        let us_east = report.region("us-east-1").unwrap();
        assert_eq!(record_names(us_east), vec!["a", "b"]);

        let a = &us_east.records()[0];
        assert!(!a.is_partial());

        let a_sample = a.sample.as_ref().unwrap();
        assert_eq!(a_sample.examined, 0);
        assert_eq!(a_sample.latest_modified, None);
        assert!(a_sample.prefixes.is_empty());
        assert!(a_sample.types.is_empty());
        assert_eq!(a.active, None);

        let b = &us_east.records()[1];
        assert!(!b.is_partial());
        assert_eq!(
            b.cost.as_ref().unwrap().cost.availability(),
            Availability::Disabled,
        );

        let eu_west = report.region("eu-west-1").unwrap();
        assert_eq!(record_names(eu_west), vec!["c"]);

        let c = &eu_west.records()[0];
        assert!(c.usage.is_none());
        assert_eq!(c.failed_collectors(), vec![Collector::Usage]);
        assert!(c.cost.is_some());
        assert!(c.sample.is_some());

        let totals = report.totals();
        assert_eq!(totals.buckets, 3);
        assert_eq!(totals.bytes, 2_048);
        assert_eq!(totals.bytes_missing, 1);
        assert_eq!(totals.cost.get("USD"), Some(&4.25));
        assert_eq!(totals.cost_missing, 1);

        assert_eq!(report.partial().len(), 1);
        assert_eq!(report.partial()[0].bucket, "c");
        assert_eq!(report.partial()[0].region, "eu-west-1");
        assert!(report.listing_complete());
    }

    #[tokio::test]
    async fn test_throttling_marks_only_one_pair() {
        let buckets: Vec<FakeBucket> = (0..6)
            .map(|i| {
                FakeBucket::new(&format!("bucket-{}", i), "eu-west-1")
                    .usage("StandardStorage", 10.0)
                    .cost(1.0)
                    .objects(&["x/y.txt"], timestamp(2024, 1, 1))
            })
            .collect();

        let account = Arc::new(
            FakeAccount::new(buckets)
                .fail("list_objects", "bucket-3", Fault::Throttled),
        );

        let config = quick_config();
        let report = build_report(&backends(&account), &config).await.unwrap();

        for record in report.records() {
            if record.bucket.name == "bucket-3" {
                assert_eq!(record.failed_collectors(), vec![Collector::Sample]);
                assert!(record.usage.is_some());
                assert!(record.cost.is_some());
            }
            else {
                assert!(!record.is_partial(), "{} is partial", record.bucket.name);
            }
        }

        assert_eq!(account.calls("list_objects"), 5 + 3);
    }

    #[tokio::test]
    async fn test_every_bucket_appears_once() {
        let regions = ["us-east-1", "eu-west-1", "ap-south-1"];

        let buckets: Vec<FakeBucket> = (0..20)
            .map(|i| FakeBucket::new(&format!("bucket-{:02}", i), regions[i % 3]))
            .collect();

        let account = Arc::new(
            FakeAccount::new(buckets)
                .fail("bucket_region", "bucket-07", Fault::Service),
        );

        let config = quick_config();
        let report = build_report(&backends(&account), &config).await.unwrap();

        let names: Vec<&str> = report.records()
            .map(|r| r.bucket.name.as_str())
            .collect();

        let unique: BTreeSet<&str> = names.iter().copied().collect();

        assert_eq!(names.len(), 20);
        assert_eq!(unique.len(), 20);
        assert_eq!(report.regions().len(), 4);
        assert_eq!(record_names(report.region("unknown").unwrap()), vec!["bucket-07"]);

        // Inventory order holds within each region.
        for group in report.regions() {
            let names = record_names(group);
            let mut sorted = names.clone();
            sorted.sort();

            assert_eq!(names, sorted);
            assert_eq!(group.totals().buckets, names.len());
        }
    }

    #[tokio::test]
    async fn test_authorization_cancels_run() {
        let buckets: Vec<FakeBucket> = (0..5)
            .map(|i| FakeBucket::new(&format!("bucket-{}", i), "eu-west-1"))
            .collect();

        let account = Arc::new(
            FakeAccount::new(buckets)
                .fail("cost", "bucket-2", Fault::Authorization),
        );

        let config = AnalysisConfig {
            concurrency: 1,
            ..quick_config()
        };

        let err = build_report(&backends(&account), &config)
            .await
            .unwrap_err();

        match err {
            ReportError::Authorization { completed, .. } => {
                assert_eq!(completed, 2);
            },
        }

        // bucket-3 and bucket-4 were never started.
        assert_eq!(account.calls("cost"), 3);
    }

    #[tokio::test]
    async fn test_authorization_cancels_concurrent_run() {
        let buckets: Vec<FakeBucket> = (0..10)
            .map(|i| FakeBucket::new(&format!("bucket-{}", i), "eu-west-1"))
            .collect();

        let account = Arc::new(
            FakeAccount::new(buckets)
                .fail("list_objects", "bucket-4", Fault::Authorization),
        );

        let config = AnalysisConfig {
            concurrency: 3,
            ..quick_config()
        };

        let err = build_report(&backends(&account), &config)
            .await
            .unwrap_err();

        match err {
            ReportError::Authorization { completed, .. } => {
                assert_eq!(completed, 4);
            },
        }

        // Buckets after bucket-4 were never started.
        assert_eq!(account.calls("cost"), 5);
    }

    #[tokio::test]
    async fn test_authorization_during_inventory() {
        let account = Arc::new(
            FakeAccount::new(vec![FakeBucket::new("a", "eu-west-1")])
                .fail("list_buckets", "0", Fault::Authorization),
        );

        let config = quick_config();
        let ret = build_report(&backends(&account), &config).await;

        assert!(matches!(
            ret,
            Err(ReportError::Authorization { completed: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_active_flag_and_account_label() {
        let recent = Utc::now() - chrono::Duration::days(2);
        let stale = Utc::now() - chrono::Duration::days(90);

        let account = Arc::new(FakeAccount::new(vec![
            FakeBucket::new("busy", "eu-west-1").objects(&["a.txt"], recent),
            FakeBucket::new("idle", "eu-west-1").objects(&["b.txt"], stale),
        ]));

        let config = AnalysisConfig {
            account: Some("prod".into()),
            ..quick_config()
        };

        let report = build_report(&backends(&account), &config).await.unwrap();
        let group = report.region("eu-west-1").unwrap();

        assert_eq!(report.account(), Some("prod"));
        assert_eq!(group.records()[0].active, Some(true));
        assert_eq!(group.records()[1].active, Some(false));
        assert_eq!(report.totals().active_buckets, 1);
        assert_eq!(report.totals().objects_sampled, 2);
    }

    #[tokio::test]
    async fn test_report_for_keeps_dropped_buckets() {
        let account = Arc::new(FakeAccount::new(vec![
            FakeBucket::new("a", "eu-west-1"),
        ]));

        let mut bucket = Bucket::new("a", None);
        bucket.region = Some("eu-west-1".into());

        let inventory = Inventory {
            buckets:          vec![bucket],
            dropped:          vec![crate::model::DroppedBucket {
                bucket: "gone".into(),
                reason: "not found".into(),
            }],
            listing_complete: false,
        };

        let config = quick_config();
        let backends = backends(&account);
        let report = Aggregator::new(&backends, &config)
            .report_for(inventory)
            .await
            .unwrap();

        assert_eq!(report.bucket_count(), 1);
        assert_eq!(report.dropped()[0].bucket, "gone");
        assert!(!report.listing_complete());
    }
}
