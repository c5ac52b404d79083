// CostEstimator: estimated cost per bucket from billing data
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use crate::common::{
    CollectError,
    CostSource,
    RetryPolicy,
};
use crate::model::{
    BillingPeriod,
    CostEstimate,
};
use tracing::debug;

/// Collects `CostEstimate`s through a `CostSource`.
pub struct CostEstimator<'a> {
    source: &'a dyn CostSource,
    retry:  &'a RetryPolicy,
}

impl<'a> CostEstimator<'a> {
    /// Return a new estimator reading from `source`.
    pub fn new(source: &'a dyn CostSource, retry: &'a RetryPolicy) -> Self {
        Self {
            source,
            retry,
        }
    }

    /// Return the estimated cost of `bucket` over `period`.
    ///
    /// Cost data that is disabled for the account, or not yet available,
    /// comes back as a value on the estimate rather than an error.
    pub async fn get_cost(
        &self,
        bucket: &str,
        period: BillingPeriod,
    ) -> Result<CostEstimate, CollectError> {
        debug!("get_cost: '{}' for {}", bucket, period);

        let cost = self.retry
            .run("GetCostAndUsage", bucket, || {
                self.source.bucket_cost(bucket, &period)
            })
            .await?;

        debug!("get_cost: '{}' -> {:?}", bucket, cost);

        Ok(CostEstimate {
            bucket: bucket.to_string(),
            period,
            cost,
        })
    }
}
