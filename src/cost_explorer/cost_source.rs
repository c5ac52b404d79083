// Implements CostSource for the Cost Explorer Client
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use async_trait::async_trait;
use crate::common::{
    CollectError,
    CostSource,
};
use crate::model::{
    BillingPeriod,
    Cost,
};
use super::client::Client;

#[async_trait]
impl CostSource for Client {
    async fn bucket_cost(
        &self,
        bucket: &str,
        period: &BillingPeriod,
    ) -> Result<Cost, CollectError> {
        self.get_cost_and_usage(bucket, period).await
    }
}
