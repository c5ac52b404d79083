// Implements the S3 Client
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use aws_config::SdkConfig;
use aws_sdk_s3::client::Client as S3Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::types::{
    MfaDeleteStatus,
    ObjectLockEnabled,
};
use aws_smithy_types_convert::date_time::DateTimeExt;
use crate::common::paging::Page;
use crate::common::{
    location_to_region,
    service_code,
    CollectError,
    ObjectEntry,
    VersioningStatus,
};
use crate::model::{
    Bucket,
    Versioning,
};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// Number of buckets requested per `ListBuckets` page.
const BUCKET_PAGE_SIZE: i32 = 1000;

/// The S3 `Client`.
pub struct Client {
    /// The AWS SDK `S3Client`.
    pub client: S3Client,

    // Clients re-targeted at bucket regions, built on first use.
    regional: Mutex<HashMap<String, S3Client>>,
}

impl Client {
    /// Return a new S3 `Client` with the given `SdkConfig`.
    pub fn new(config: &SdkConfig) -> Self {
        debug!(
            "new: Creating S3Client in region '{:?}'",
            config.region(),
        );

        Self::from_client(S3Client::new(config))
    }

    /// Wrap an already configured `S3Client`.
    pub fn from_client(client: S3Client) -> Self {
        Self {
            client,
            regional: Mutex::new(HashMap::new()),
        }
    }

    /// Return a client that sends requests to `region`.
    ///
    /// Most bucket level calls have to be made against the bucket's own
    /// region. The base client is used when the region is unknown or is
    /// the one it was created in.
    pub fn regional(&self, region: Option<&str>) -> S3Client {
        let region = match region {
            Some(region) => region,
            None         => return self.client.clone(),
        };

        let base = self.client.config().region().map(|r| r.as_ref());

        if base == Some(region) {
            return self.client.clone();
        }

        // A poisoned lock only means another task panicked while inserting,
        // the map itself is still usable.
        let mut regional = match self.regional.lock() {
            Ok(guard)     => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        regional
            .entry(region.to_string())
            .or_insert_with(|| {
                debug!("regional: Creating S3Client in region '{}'", region);

                let config = self.client.config()
                    .to_builder()
                    .region(Region::new(region.to_string()))
                    .build();

                S3Client::from_conf(config)
            })
            .clone()
    }

    /// Returns one page of buckets.
    pub async fn list_buckets(
        &self,
        token: Option<String>,
    ) -> Result<Page<Bucket>, CollectError> {
        debug!("list_buckets: Listing with token {:?}", token);

        let output = self.client.list_buckets()
            .max_buckets(BUCKET_PAGE_SIZE)
            .set_continuation_token(token)
            .send()
            .await?;

        let items = output.buckets()
            .iter()
            .filter_map(|b| {
                let name = b.name()?;

                let created = b.creation_date()
                    .and_then(|d| d.to_chrono_utc().ok());

                Some(Bucket::new(name, created))
            })
            .collect();

        Ok(Page {
            items,
            next_token: output.continuation_token().map(String::from),
        })
    }

    /// Return the region for the given `bucket`.
    ///
    /// This method will properly handle the case of the `null` (empty) and
    /// `EU` location constraints, by replacing them with `us-east-1` and
    /// `eu-west-1` respectively.
    pub async fn get_bucket_location(
        &self,
        bucket: &str,
    ) -> Result<String, CollectError> {
        debug!("get_bucket_location for '{}'", bucket);

        let output = self.client.get_bucket_location()
            .bucket(bucket)
            .send()
            .await?;

        let location = output.location_constraint()
            .map(|l| l.as_str());

        debug!("GetBucketLocation API returned '{:?}'", location);

        Ok(location_to_region(location))
    }

    /// Checks that we can reach the given `bucket`.
    pub async fn head_bucket(
        &self,
        bucket: &str,
        region: Option<&str>,
    ) -> Result<(), CollectError> {
        debug!("head_bucket for '{}'", bucket);

        let output = self.regional(region)
            .head_bucket()
            .bucket(bucket)
            .send()
            .await;

        debug!("head_bucket output for '{}' -> '{:?}'", bucket, output);

        output?;

        Ok(())
    }

    /// Return the versioning state and MFA delete setting of `bucket`.
    pub async fn get_bucket_versioning(
        &self,
        bucket: &str,
        region: Option<&str>,
    ) -> Result<VersioningStatus, CollectError> {
        let output = self.regional(region)
            .get_bucket_versioning()
            .bucket(bucket)
            .send()
            .await?;

        let state = Versioning::from_status(
            output.status().map(|s| s.as_str()),
        );

        let mfa_delete = matches!(
            output.mfa_delete(),
            Some(MfaDeleteStatus::Enabled),
        );

        Ok(VersioningStatus {
            state,
            mfa_delete,
        })
    }

    /// Returns `true` if `bucket` has at least one lifecycle rule.
    pub async fn has_lifecycle_rules(
        &self,
        bucket: &str,
        region: Option<&str>,
    ) -> Result<bool, CollectError> {
        let output = self.regional(region)
            .get_bucket_lifecycle_configuration()
            .bucket(bucket)
            .send()
            .await;

        match output {
            Ok(output) => Ok(!output.rules().is_empty()),
            Err(err) if service_code(&err) == Some("NoSuchLifecycleConfiguration") => {
                Ok(false)
            },
            Err(err) => Err(err.into()),
        }
    }

    /// Returns `true` if object lock is enabled on `bucket`.
    pub async fn object_lock_enabled(
        &self,
        bucket: &str,
        region: Option<&str>,
    ) -> Result<bool, CollectError> {
        let output = self.regional(region)
            .get_object_lock_configuration()
            .bucket(bucket)
            .send()
            .await;

        match output {
            Ok(output) => {
                let enabled = output.object_lock_configuration()
                    .and_then(|c| c.object_lock_enabled());

                Ok(matches!(enabled, Some(ObjectLockEnabled::Enabled)))
            },
            Err(err) if service_code(&err) == Some("ObjectLockConfigurationNotFoundError") => {
                Ok(false)
            },
            Err(err) => Err(err.into()),
        }
    }

    /// Return one page of at most `max_keys` objects from `bucket`.
    pub async fn list_objects(
        &self,
        bucket: &str,
        region: Option<&str>,
        token: Option<String>,
        max_keys: i32,
    ) -> Result<Page<ObjectEntry>, CollectError> {
        debug!("list_objects: '{}' with token {:?}", bucket, token);

        let output = self.regional(region)
            .list_objects_v2()
            .bucket(bucket)
            .max_keys(max_keys)
            .set_continuation_token(token)
            .send()
            .await?;

        let items = output.contents()
            .iter()
            .filter_map(|o| {
                let last_modified = o.last_modified()
                    .and_then(|d| d.to_chrono_utc().ok());

                Some(ObjectEntry {
                    key: o.key()?.to_string(),
                    last_modified,
                })
            })
            .collect();

        // If the output was truncated, we should have a
        // next_continuation_token. If it wasn't, we're done.
        let next_token = match output.is_truncated() {
            Some(true) => output.next_continuation_token().map(String::from),
            _          => None,
        };

        Ok(Page {
            items,
            next_token,
        })
    }
}
