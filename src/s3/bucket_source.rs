// Implement BucketSource and ObjectSource for the s3::Client
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use async_trait::async_trait;
use crate::common::paging::Page;
use crate::common::{
    BucketSource,
    CollectError,
    ObjectEntry,
    ObjectSource,
    VersioningStatus,
};
use crate::model::Bucket;
use super::client::Client;

#[async_trait]
impl BucketSource for Client {
    async fn list_buckets_page(
        &self,
        token: Option<String>,
    ) -> Result<Page<Bucket>, CollectError> {
        self.list_buckets(token).await
    }

    async fn bucket_region(&self, bucket: &str) -> Result<String, CollectError> {
        self.get_bucket_location(bucket).await
    }

    async fn head_bucket(
        &self,
        bucket: &str,
        region: Option<&str>,
    ) -> Result<(), CollectError> {
        Client::head_bucket(self, bucket, region).await
    }

    async fn versioning(
        &self,
        bucket: &str,
        region: Option<&str>,
    ) -> Result<VersioningStatus, CollectError> {
        self.get_bucket_versioning(bucket, region).await
    }

    async fn lifecycle_rules(
        &self,
        bucket: &str,
        region: Option<&str>,
    ) -> Result<bool, CollectError> {
        self.has_lifecycle_rules(bucket, region).await
    }

    async fn object_lock(
        &self,
        bucket: &str,
        region: Option<&str>,
    ) -> Result<bool, CollectError> {
        self.object_lock_enabled(bucket, region).await
    }
}

#[async_trait]
impl ObjectSource for Client {
    async fn list_objects_page(
        &self,
        bucket: &str,
        region: Option<&str>,
        token: Option<String>,
        max_keys: i32,
    ) -> Result<Page<ObjectEntry>, CollectError> {
        self.list_objects(bucket, region, token, max_keys).await
    }
}
