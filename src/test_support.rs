// In-memory backends for exercising the pipeline without AWS
use async_trait::async_trait;
use chrono::{
    DateTime,
    Duration,
    TimeZone,
    Utc,
};
use crate::common::paging::Page;
use crate::common::{
    AnalysisConfig,
    Backends,
    BucketSource,
    CollectError,
    CostSource,
    MetricWindow,
    ObjectEntry,
    ObjectSource,
    RetryPolicy,
    SizeDatapoint,
    UsageSource,
    VersioningStatus,
};
use crate::model::{
    BillingPeriod,
    Bucket,
    Cost,
    Versioning,
};
use std::collections::HashMap;
use std::sync::{
    Arc,
    Mutex,
};

/// An error the fake backend can be told to return.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Fault {
    Authorization,
    NotFound,
    Service,
    Throttled,
}

impl Fault {
    fn error(&self, operation: &str, bucket: &str) -> CollectError {
        let message = format!("{} on {}", operation, bucket);

        match self {
            Self::Authorization => CollectError::Authorization(message),
            Self::NotFound      => CollectError::NotFound(message),
            Self::Service       => CollectError::Service(message),
            Self::Throttled     => CollectError::Throttled(message),
        }
    }
}

/// A bucket held by the fake backend.
#[derive(Clone, Debug)]
pub(crate) struct FakeBucket {
    pub name:        String,
    pub region:      String,
    pub created:     DateTime<Utc>,
    pub versioning:  VersioningStatus,
    pub lifecycle:   bool,
    pub object_lock: bool,
    pub objects:     Vec<ObjectEntry>,
    pub usage:       Vec<(String, Vec<SizeDatapoint>)>,
    pub cost:        Cost,
}

impl FakeBucket {
    pub(crate) fn new(name: &str, region: &str) -> Self {
        Self {
            name:        name.into(),
            region:      region.into(),
            created:     timestamp(2020, 1, 1),
            versioning:  VersioningStatus {
                state:      Versioning::Disabled,
                mfa_delete: false,
            },
            lifecycle:   false,
            object_lock: false,
            objects:     Vec::new(),
            usage:       Vec::new(),
            cost:        Cost::Pending,
        }
    }

    pub(crate) fn objects(mut self, keys: &[&str], modified: DateTime<Utc>) -> Self {
        self.objects = keys.iter()
            .map(|key| ObjectEntry {
                key:           key.to_string(),
                last_modified: Some(modified),
            })
            .collect();

        self
    }

    pub(crate) fn numbered_objects(mut self, count: usize, modified: DateTime<Utc>) -> Self {
        self.objects = (0..count)
            .map(|i| ObjectEntry {
                key:           format!("data/{:06}.csv", i),
                last_modified: Some(modified),
            })
            .collect();

        self
    }

    pub(crate) fn usage(mut self, storage_type: &str, bytes: f64) -> Self {
        let datapoint = SizeDatapoint {
            timestamp: timestamp(2024, 6, 1),
            average:   bytes,
        };

        self.usage.push((storage_type.into(), vec![datapoint]));
        self
    }

    pub(crate) fn cost(mut self, amount: f64) -> Self {
        self.cost = Cost::Available {
            amount,
            currency: "USD".into(),
        };

        self
    }

    pub(crate) fn cost_state(mut self, cost: Cost) -> Self {
        self.cost = cost;
        self
    }
}

// (operation, bucket) -> (fault, remaining count, None for always)
type Rules = HashMap<(String, String), (Fault, Option<usize>)>;

/// An in-memory account implementing every backend trait.
#[derive(Default)]
pub(crate) struct FakeAccount {
    buckets:   Vec<FakeBucket>,
    page_size: usize,
    rules:     Mutex<Rules>,
    calls:     Mutex<Vec<(String, String)>>,
    max_keys:  Mutex<Vec<i32>>,
}

impl FakeAccount {
    pub(crate) fn new(buckets: Vec<FakeBucket>) -> Self {
        Self {
            buckets,
            page_size: 2,
            ..Default::default()
        }
    }

    /// Fail every call of `operation` on `bucket`.
    pub(crate) fn fail(self, operation: &str, bucket: &str, fault: Fault) -> Self {
        self.rule(operation, bucket, fault, None)
    }

    /// Fail the first `times` calls of `operation` on `bucket`.
    pub(crate) fn fail_times(
        self,
        operation: &str,
        bucket: &str,
        fault: Fault,
        times: usize,
    ) -> Self {
        self.rule(operation, bucket, fault, Some(times))
    }

    fn rule(
        self,
        operation: &str,
        bucket: &str,
        fault: Fault,
        times: Option<usize>,
    ) -> Self {
        self.rules
            .lock()
            .unwrap()
            .insert((operation.into(), bucket.into()), (fault, times));

        self
    }

    /// Number of calls made of `operation`, across all buckets.
    pub(crate) fn calls(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(op, _)| op == operation)
            .count()
    }

    /// Every `max_keys` value object listings were called with.
    pub(crate) fn max_keys(&self) -> Vec<i32> {
        self.max_keys.lock().unwrap().clone()
    }

    fn check(&self, operation: &str, bucket: &str) -> Result<(), CollectError> {
        self.calls
            .lock()
            .unwrap()
            .push((operation.into(), bucket.into()));

        let mut rules = self.rules.lock().unwrap();
        let key = (operation.to_string(), bucket.to_string());

        match rules.get_mut(&key) {
            Some((fault, None)) => Err(fault.error(operation, bucket)),
            Some((fault, Some(remaining))) if *remaining > 0 => {
                *remaining -= 1;

                Err(fault.error(operation, bucket))
            },
            _ => Ok(()),
        }
    }

    fn bucket(&self, name: &str) -> Result<&FakeBucket, CollectError> {
        self.buckets
            .iter()
            .find(|b| b.name == name)
            .ok_or_else(|| CollectError::NotFound(name.into()))
    }
}

#[async_trait]
impl BucketSource for FakeAccount {
    async fn list_buckets_page(
        &self,
        token: Option<String>,
    ) -> Result<Page<Bucket>, CollectError> {
        let start: usize = token
            .as_deref()
            .unwrap_or("0")
            .parse()
            .map_err(|_| CollectError::Service("bad token".into()))?;

        self.check("list_buckets", &start.to_string())?;

        let end = (start + self.page_size.max(1)).min(self.buckets.len());

        let items = self.buckets[start..end]
            .iter()
            .map(|b| Bucket::new(b.name.clone(), Some(b.created)))
            .collect();

        Ok(Page {
            items,
            next_token: (end < self.buckets.len()).then(|| end.to_string()),
        })
    }

    async fn bucket_region(&self, bucket: &str) -> Result<String, CollectError> {
        self.check("bucket_region", bucket)?;

        Ok(self.bucket(bucket)?.region.clone())
    }

    async fn head_bucket(
        &self,
        bucket: &str,
        _region: Option<&str>,
    ) -> Result<(), CollectError> {
        self.check("head_bucket", bucket)?;
        self.bucket(bucket)?;

        Ok(())
    }

    async fn versioning(
        &self,
        bucket: &str,
        _region: Option<&str>,
    ) -> Result<VersioningStatus, CollectError> {
        self.check("versioning", bucket)?;

        Ok(self.bucket(bucket)?.versioning)
    }

    async fn lifecycle_rules(
        &self,
        bucket: &str,
        _region: Option<&str>,
    ) -> Result<bool, CollectError> {
        self.check("lifecycle", bucket)?;

        Ok(self.bucket(bucket)?.lifecycle)
    }

    async fn object_lock(
        &self,
        bucket: &str,
        _region: Option<&str>,
    ) -> Result<bool, CollectError> {
        self.check("object_lock", bucket)?;

        Ok(self.bucket(bucket)?.object_lock)
    }
}

#[async_trait]
impl ObjectSource for FakeAccount {
    async fn list_objects_page(
        &self,
        bucket: &str,
        _region: Option<&str>,
        token: Option<String>,
        max_keys: i32,
    ) -> Result<Page<ObjectEntry>, CollectError> {
        self.check("list_objects", bucket)?;
        self.max_keys.lock().unwrap().push(max_keys);

        let objects = &self.bucket(bucket)?.objects;

        let start: usize = token
            .as_deref()
            .unwrap_or("0")
            .parse()
            .map_err(|_| CollectError::Service("bad token".into()))?;

        let end = (start + max_keys.max(0) as usize).min(objects.len());

        Ok(Page {
            items:      objects[start..end].to_vec(),
            next_token: (end < objects.len()).then(|| end.to_string()),
        })
    }
}

#[async_trait]
impl UsageSource for FakeAccount {
    async fn storage_types(
        &self,
        bucket: &str,
        _region: Option<&str>,
    ) -> Result<Vec<String>, CollectError> {
        self.check("storage_types", bucket)?;

        let types = self.bucket(bucket)?
            .usage
            .iter()
            .map(|(storage_type, _)| storage_type.clone())
            .collect();

        Ok(types)
    }

    async fn datapoints(
        &self,
        bucket: &str,
        _region: Option<&str>,
        storage_type: &str,
        _window: &MetricWindow,
    ) -> Result<Vec<SizeDatapoint>, CollectError> {
        self.check("datapoints", bucket)?;

        let datapoints = self.bucket(bucket)?
            .usage
            .iter()
            .find(|(st, _)| st == storage_type)
            .map(|(_, datapoints)| datapoints.clone())
            .unwrap_or_default();

        Ok(datapoints)
    }
}

#[async_trait]
impl CostSource for FakeAccount {
    async fn bucket_cost(
        &self,
        bucket: &str,
        _period: &BillingPeriod,
    ) -> Result<Cost, CollectError> {
        self.check("cost", bucket)?;

        Ok(self.bucket(bucket)?.cost.clone())
    }
}

/// Wire one fake account up as every backend.
pub(crate) fn backends(account: &Arc<FakeAccount>) -> Backends {
    Backends {
        buckets: account.clone(),
        objects: account.clone(),
        usage:   account.clone(),
        cost:    account.clone(),
    }
}

pub(crate) fn timestamp(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// A config that retries without sleeping.
pub(crate) fn quick_config() -> AnalysisConfig {
    AnalysisConfig {
        sample_limit: 10,
        lookback:     Duration::days(3),
        concurrency:  4,
        retry:        RetryPolicy {
            max_attempts: 3,
            base_delay:   std::time::Duration::ZERO,
            max_delay:    std::time::Duration::ZERO,
            call_timeout: None,
        },
        ..Default::default()
    }
}
