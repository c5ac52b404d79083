// Implements UsageSource for the CloudWatch Client
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use async_trait::async_trait;
use crate::common::{
    CollectError,
    MetricWindow,
    SizeDatapoint,
    UsageSource,
};
use super::client::Client;

#[async_trait]
impl UsageSource for Client {
    async fn storage_types(
        &self,
        bucket: &str,
        region: Option<&str>,
    ) -> Result<Vec<String>, CollectError> {
        Client::storage_types(self, bucket, region).await
    }

    async fn datapoints(
        &self,
        bucket: &str,
        region: Option<&str>,
        storage_type: &str,
        window: &MetricWindow,
    ) -> Result<Vec<SizeDatapoint>, CollectError> {
        self.get_metric_statistics(bucket, region, storage_type, window).await
    }
}
