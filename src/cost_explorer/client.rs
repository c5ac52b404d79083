// Implement the Cost Explorer Client
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use aws_config::SdkConfig;
use aws_sdk_costexplorer::client::Client as CostExplorerClient;
use aws_sdk_costexplorer::config::{
    Builder as CostExplorerConfig,
    Region,
};
use aws_sdk_costexplorer::types::{
    DateInterval,
    Dimension,
    DimensionValues,
    Expression,
    Granularity,
    ResultByTime,
};
use crate::common::{
    service_code,
    CollectError,
    DEFAULT_REGION,
};
use crate::model::{
    BillingPeriod,
    Cost,
};
use tracing::debug;

/// Cost metric requested for every bucket.
const COST_METRIC: &str = "BlendedCost";

/// Days of resource level cost history Cost Explorer keeps.
const RESOURCE_HISTORY_DAYS: u64 = 14;

/// `SERVICE` dimension value for S3.
const S3_SERVICE: &str = "Amazon Simple Storage Service";

/// A Cost Explorer `Client`.
pub struct Client {
    /// The AWS SDK `CostExplorerClient`.
    pub client: CostExplorerClient,
}

impl Client {
    /// Return a new `Client` with the given `SdkConfig`.
    ///
    /// Cost Explorer is only served from `us-east-1`, whatever region the
    /// rest of the run uses.
    pub fn new(config: &SdkConfig) -> Self {
        debug!("new: Creating CostExplorerClient in region '{}'", DEFAULT_REGION);

        let config = CostExplorerConfig::from(config)
            .region(Region::new(DEFAULT_REGION))
            .build();

        Self::from_client(CostExplorerClient::from_conf(config))
    }

    /// Wrap an already configured `CostExplorerClient`.
    pub fn from_client(client: CostExplorerClient) -> Self {
        Self {
            client,
        }
    }

    /// Return the cost of `bucket` over `period`.
    ///
    /// Costs filtered on `RESOURCE_ID` are only served by
    /// `GetCostAndUsageWithResources`, which covers the last 14 days. The
    /// query window is the end of `period` trimmed to that.
    ///
    /// `ValidationException` means resource level cost data hasn't been
    /// enabled in the billing preferences, and `DataUnavailableException`
    /// means it hasn't arrived yet. Neither is an error.
    pub async fn get_cost_and_usage(
        &self,
        bucket: &str,
        period: &BillingPeriod,
    ) -> Result<Cost, CollectError> {
        let period = period.last_days(RESOURCE_HISTORY_DAYS);

        debug!("get_cost_and_usage: '{}' for {}", bucket, period);

        let interval = DateInterval::builder()
            .start(period.start.format("%Y-%m-%d").to_string())
            .end(period.end.format("%Y-%m-%d").to_string())
            .build()
            .map_err(|e| CollectError::Service(e.to_string()))?;

        let output = self.client.get_cost_and_usage_with_resources()
            .time_period(interval)
            .granularity(Granularity::Monthly)
            .metrics(COST_METRIC)
            .filter(bucket_filter(bucket))
            .send()
            .await;

        match output {
            Ok(output) => Ok(cost_from_results(output.results_by_time())),
            Err(err) if service_code(&err) == Some("ValidationException") => {
                debug!("get_cost_and_usage: resource level data is disabled");

                Ok(Cost::Disabled)
            },
            Err(err) if service_code(&err) == Some("DataUnavailableException") => {
                Ok(Cost::Pending)
            },
            Err(err) => Err(err.into()),
        }
    }
}

// Restrict costs to S3 and the one bucket.
fn bucket_filter(bucket: &str) -> Expression {
    let service = DimensionValues::builder()
        .key(Dimension::Service)
        .values(S3_SERVICE)
        .build();

    let resource = DimensionValues::builder()
        .key(Dimension::ResourceId)
        .values(bucket)
        .build();

    Expression::builder()
        .and(Expression::builder().dimensions(service).build())
        .and(Expression::builder().dimensions(resource).build())
        .build()
}

/// Sum the `BlendedCost` totals of `results`.
///
/// No results, or results without a total yet, mean the data is still
/// pending.
pub fn cost_from_results(results: &[ResultByTime]) -> Cost {
    let mut amount = 0.0;
    let mut currency = None;

    for result in results {
        let metric = match result.total().and_then(|t| t.get(COST_METRIC)) {
            Some(metric) => metric,
            None         => continue,
        };

        let value = match metric.amount().and_then(|a| a.parse::<f64>().ok()) {
            Some(value) => value,
            None        => continue,
        };

        amount += value;

        if currency.is_none() {
            currency = metric.unit().map(String::from);
        }
    }

    match currency {
        Some(currency) => Cost::Available { amount, currency },
        None           => Cost::Pending,
    }
}
