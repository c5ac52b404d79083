// Implement the CloudWatch Client
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use aws_config::SdkConfig;
use aws_sdk_cloudwatch::client::Client as CloudWatchClient;
use aws_sdk_cloudwatch::config::{
    Builder as CloudWatchConfig,
    Region,
};
use aws_sdk_cloudwatch::primitives::DateTime;
use aws_sdk_cloudwatch::types::{
    Datapoint,
    Dimension,
    DimensionFilter,
    Metric,
    StandardUnit,
    Statistic,
};
use aws_smithy_types_convert::date_time::DateTimeExt;
use crate::common::{
    CollectError,
    MetricWindow,
    SizeDatapoint,
    DEFAULT_REGION,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;
use super::bucket_metrics::BucketMetrics;

const ONE_DAY: Duration = Duration::from_secs(86_400);

/// A `CloudWatch` `Client`
pub struct Client {
    /// The AWS SDK `CloudWatchClient`.
    pub client: CloudWatchClient,

    // Clients re-targeted at bucket regions, built on first use.
    regional: Mutex<HashMap<String, CloudWatchClient>>,
}

impl Client {
    /// Return a new `Client` with the given `SdkConfig`.
    ///
    /// Falls back to `us-east-1` if the config has no region.
    pub fn new(config: &SdkConfig) -> Self {
        debug!(
            "new: Creating CloudWatchClient in region '{:?}'",
            config.region(),
        );

        let mut builder = CloudWatchConfig::from(config);

        if config.region().is_none() {
            builder = builder.region(Region::new(DEFAULT_REGION));
        }

        Self::from_client(CloudWatchClient::from_conf(builder.build()))
    }

    /// Wrap an already configured `CloudWatchClient`.
    pub fn from_client(client: CloudWatchClient) -> Self {
        Self {
            client,
            regional: Mutex::new(HashMap::new()),
        }
    }

    /// Return a client that sends requests to `region`.
    ///
    /// S3 storage metrics are published in the bucket's own region.
    pub fn regional(&self, region: Option<&str>) -> CloudWatchClient {
        let region = match region {
            Some(region) => region,
            None         => return self.client.clone(),
        };

        let base = self.client.config().region().map(|r| r.as_ref());

        if base == Some(region) {
            return self.client.clone();
        }

        let mut regional = match self.regional.lock() {
            Ok(guard)     => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        regional
            .entry(region.to_string())
            .or_insert_with(|| {
                debug!("regional: Creating CloudWatchClient in region '{}'", region);

                let config = self.client.config()
                    .to_builder()
                    .region(Region::new(region.to_string()))
                    .build();

                CloudWatchClient::from_conf(config)
            })
            .clone()
    }

    /// Get the `BucketSizeBytes` metrics published for `bucket`.
    ///
    /// An individual metric resembles the following:
    /// ```text
    /// Metric {
    ///   metric_name: Some("BucketSizeBytes"),
    ///   namespace:   Some("AWS/S3")
    ///   dimensions:  Some([
    ///     Dimension {
    ///       name:  "StorageType",
    ///       value: "StandardStorage"
    ///     },
    ///     Dimension {
    ///       name:  "BucketName",
    ///       value: "some-bucket-name"
    ///     }
    ///   ]),
    /// }
    /// ```
    pub async fn list_metrics(
        &self,
        bucket: &str,
        region: Option<&str>,
    ) -> Result<Vec<Metric>, CollectError> {
        debug!("list_metrics: Listing for '{}'", bucket);

        let client = self.regional(region);
        let mut metrics = Vec::new();
        let mut next_token = None;

        let filter = DimensionFilter::builder()
            .name("BucketName")
            .value(bucket)
            .build();

        // We loop until we've processed everything.
        loop {
            let output = client.list_metrics()
                .namespace("AWS/S3")
                .metric_name("BucketSizeBytes")
                .dimensions(filter.clone())
                .set_next_token(next_token)
                .send()
                .await?;

            metrics.extend_from_slice(output.metrics());

            // If there was a next token, use it, otherwise the loop is done.
            match output.next_token() {
                Some(t) if !t.is_empty() => next_token = Some(t.to_string()),
                _                        => break,
            }
        }

        debug!("list_metrics: '{}' has {} metrics", bucket, metrics.len());

        Ok(metrics)
    }

    /// Return the storage types publishing size metrics for `bucket`.
    pub async fn storage_types(
        &self,
        bucket: &str,
        region: Option<&str>,
    ) -> Result<Vec<String>, CollectError> {
        let metrics = self.list_metrics(bucket, region).await?;
        let metrics = BucketMetrics::from(metrics.as_slice());

        Ok(metrics.storage_types(bucket))
    }

    /// Returns the daily `BucketSizeBytes` datapoints for one storage type of
    /// `bucket` inside `window`.
    pub async fn get_metric_statistics(
        &self,
        bucket: &str,
        region: Option<&str>,
        storage_type: &str,
        window: &MetricWindow,
    ) -> Result<Vec<SizeDatapoint>, CollectError> {
        debug!(
            "get_metric_statistics: '{}' {} from {} to {}",
            bucket,
            storage_type,
            window.start,
            window.end,
        );

        let period = i32::try_from(ONE_DAY.as_secs())
            .map_err(|e| CollectError::Service(e.to_string()))?;

        let dimensions = vec![
            Dimension::builder()
                .name("BucketName")
                .value(bucket)
                .build(),
            Dimension::builder()
                .name("StorageType")
                .value(storage_type)
                .build(),
        ];

        let output = self.regional(region)
            .get_metric_statistics()
            .end_time(DateTime::from_chrono_utc(window.end))
            .metric_name("BucketSizeBytes")
            .namespace("AWS/S3")
            .period(period)
            .set_dimensions(Some(dimensions))
            .start_time(DateTime::from_chrono_utc(window.start))
            .statistics(Statistic::Average)
            .unit(StandardUnit::Bytes)
            .send()
            .await?;

        Ok(size_datapoints(output.datapoints()))
    }
}

/// Convert datapoints returned by AWS, skipping any without a timestamp or
/// an average.
pub fn size_datapoints(datapoints: &[Datapoint]) -> Vec<SizeDatapoint> {
    datapoints
        .iter()
        .filter_map(|d| {
            let timestamp = d.timestamp()?.to_chrono_utc().ok()?;

            Some(SizeDatapoint {
                timestamp,
                average: d.average()?,
            })
        })
        .collect()
}
