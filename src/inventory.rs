// BucketInventory: lists every bucket and its static metadata
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use crate::common::paging;
use crate::common::{
    AnalysisConfig,
    BucketSource,
    CollectError,
    RetryPolicy,
};
use crate::model::{
    Bucket,
    Buckets,
    DroppedBucket,
};
use futures::stream::{
    self,
    StreamExt,
    TryStreamExt,
};
use std::pin::pin;
use tracing::{
    debug,
    info,
    warn,
};

/// The result of listing an account's buckets.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Inventory {
    /// Buckets that exist, in listing order.
    pub buckets: Buckets,

    /// Buckets that were listed but vanished before they could be described.
    pub dropped: Vec<DroppedBucket>,

    /// `false` if the bucket listing failed part way through.
    pub listing_complete: bool,
}

// What describing a single listed bucket produced.
enum Described {
    Kept(Bucket),
    Dropped(DroppedBucket),
}

/// Lists buckets through a `BucketSource`.
pub struct BucketInventory<'a> {
    source:      &'a dyn BucketSource,
    retry:       &'a RetryPolicy,
    concurrency: usize,
}

impl<'a> BucketInventory<'a> {
    /// Return a new `BucketInventory` reading from `source`.
    pub fn new(source: &'a dyn BucketSource, config: &'a AnalysisConfig) -> Self {
        Self {
            source,
            retry:       &config.retry,
            concurrency: config.concurrency(),
        }
    }

    /// List every bucket in the account along with its metadata.
    ///
    /// Only an authorization failure is returned as an error. Buckets that
    /// disappear between listing and description are dropped with a
    /// warning, attributes that can't be read are left unknown, and a
    /// listing that fails part way keeps what it has.
    pub async fn list_buckets(&self) -> Result<Inventory, CollectError> {
        debug!("list_buckets: Listing...");

        let (listed, listing_complete) = self.list_names().await?;

        info!(
            buckets = listed.len(),
            listing_complete,
            "listed buckets",
        );

        let mut inventory = Inventory {
            listing_complete,
            ..Default::default()
        };

        let mut described = pin!(
            stream::iter(listed)
                .map(|bucket| self.describe(bucket))
                .buffered(self.concurrency)
        );

        while let Some(outcome) = described.next().await {
            match outcome? {
                Described::Kept(bucket)     => inventory.buckets.push(bucket),
                Described::Dropped(dropped) => inventory.dropped.push(dropped),
            }
        }

        Ok(inventory)
    }

    // Walk the bucket listing, returning what was listed and whether the
    // listing finished.
    async fn list_names(&self) -> Result<(Buckets, bool), CollectError> {
        let source = self.source;
        let retry = self.retry;

        let mut pages = pin!(paging::items(move |token: Option<String>| {
            retry.run("ListBuckets", "-", move || {
                source.list_buckets_page(token.clone())
            })
        }));

        let mut listed = Buckets::new();

        loop {
            match pages.try_next().await {
                Ok(Some(bucket)) => listed.push(bucket),
                Ok(None)         => return Ok((listed, true)),
                Err(err) if err.is_authorization() => return Err(err),
                Err(err) => {
                    warn!(
                        listed = listed.len(),
                        error = %err,
                        "bucket listing failed, reporting on the buckets listed so far",
                    );

                    return Ok((listed, false));
                },
            }
        }
    }

    // Fill in the region and attributes of one listed bucket.
    async fn describe(&self, mut bucket: Bucket) -> Result<Described, CollectError> {
        let name = bucket.name.clone();
        let name = name.as_str();

        debug!("describe: Retrieving location for '{}'", name);

        let region = self.retry
            .run("GetBucketLocation", name, || self.source.bucket_region(name))
            .await;

        bucket.region = match region {
            Ok(region) => Some(region),
            Err(err) if err.is_not_found() => return Ok(dropped(name, err)),
            Err(err) => unknown(name, "region", err)?,
        };

        let region = bucket.region.as_deref();

        let exists = self.retry
            .run("HeadBucket", name, || self.source.head_bucket(name, region))
            .await;

        if let Err(err) = exists {
            if err.is_not_found() {
                return Ok(dropped(name, err));
            }

            unknown::<()>(name, "existence", err)?;
        }

        let (versioning, lifecycle, object_lock) = futures::join!(
            self.retry.run("GetBucketVersioning", name, || {
                self.source.versioning(name, region)
            }),
            self.retry.run("GetBucketLifecycleConfiguration", name, || {
                self.source.lifecycle_rules(name, region)
            }),
            self.retry.run("GetObjectLockConfiguration", name, || {
                self.source.object_lock(name, region)
            }),
        );

        let versioning = attribute(name, "versioning", versioning)?;

        bucket.versioning = versioning.map(|v| v.state);
        bucket.deletion.mfa_delete = versioning.map(|v| v.mfa_delete);
        bucket.deletion.lifecycle_rules = attribute(name, "lifecycle", lifecycle)?;
        bucket.deletion.object_lock = attribute(name, "object lock", object_lock)?;

        debug!("describe: '{}' -> {:?}", name, bucket);

        Ok(Described::Kept(bucket))
    }
}

// Record a bucket that no longer exists.
fn dropped(bucket: &str, err: CollectError) -> Described {
    warn!(bucket, error = %err, "bucket vanished, dropping it from the inventory");

    Described::Dropped(DroppedBucket {
        bucket: bucket.to_string(),
        reason: err.to_string(),
    })
}

// An attribute lookup failed: fatal if it was authorization, otherwise the
// attribute becomes unknown.
fn unknown<T>(
    bucket: &str,
    attribute: &str,
    err: CollectError,
) -> Result<Option<T>, CollectError> {
    if err.is_authorization() {
        return Err(err);
    }

    warn!(bucket, attribute, error = %err, "bucket attribute unavailable");

    Ok(None)
}

fn attribute<T>(
    bucket: &str,
    name: &str,
    result: Result<T, CollectError>,
) -> Result<Option<T>, CollectError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err)  => unknown(bucket, name, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Versioning;
    use crate::test_support::{
        quick_config,
        FakeAccount,
        FakeBucket,
        Fault,
    };
    use pretty_assertions::assert_eq;

    fn names(inventory: &Inventory) -> Vec<&str> {
        inventory.buckets
            .iter()
            .map(|b| b.name.as_str())
            .collect()
    }

    #[tokio::test]
    async fn test_list_buckets_keeps_listing_order() {
        let mut versioned = FakeBucket::new("b", "us-east-1");
        versioned.versioning.state = Versioning::Enabled;
        versioned.versioning.mfa_delete = true;
        versioned.lifecycle = true;

        let account = FakeAccount::new(vec![
            FakeBucket::new("a", "eu-west-1"),
            versioned,
            FakeBucket::new("c", "eu-west-1"),
            FakeBucket::new("d", "ap-south-1"),
            FakeBucket::new("e", "us-east-1"),
        ]);

        let config = quick_config();
        let inventory = BucketInventory::new(&account, &config)
            .list_buckets()
            .await
            .unwrap();

        assert_eq!(names(&inventory), vec!["a", "b", "c", "d", "e"]);
        assert!(inventory.listing_complete);
        assert!(inventory.dropped.is_empty());

        // Five buckets at two per page.
        assert_eq!(account.calls("list_buckets"), 3);

        let b = &inventory.buckets[1];
        assert_eq!(b.region.as_deref(), Some("us-east-1"));
        assert_eq!(b.versioning, Some(Versioning::Enabled));
        assert_eq!(b.deletion.mfa_delete, Some(true));
        assert_eq!(b.deletion.lifecycle_rules, Some(true));
        assert_eq!(b.deletion.object_lock, Some(false));
    }

    #[tokio::test]
    async fn test_list_buckets_drops_vanished_buckets() {
        let account = FakeAccount::new(vec![
            FakeBucket::new("a", "eu-west-1"),
            FakeBucket::new("gone", "eu-west-1"),
            FakeBucket::new("c", "eu-west-1"),
        ])
        .fail("head_bucket", "gone", Fault::NotFound);

        let config = quick_config();
        let inventory = BucketInventory::new(&account, &config)
            .list_buckets()
            .await
            .unwrap();

        assert_eq!(names(&inventory), vec!["a", "c"]);
        assert_eq!(inventory.dropped.len(), 1);
        assert_eq!(inventory.dropped[0].bucket, "gone");
    }

    #[tokio::test]
    async fn test_list_buckets_unknown_attributes() {
        let account = FakeAccount::new(vec![
            FakeBucket::new("a", "eu-west-1"),
        ])
        .fail("bucket_region", "a", Fault::Service)
        .fail("object_lock", "a", Fault::Service)
        .fail_times("lifecycle", "a", Fault::Throttled, 2);

        let config = quick_config();
        let inventory = BucketInventory::new(&account, &config)
            .list_buckets()
            .await
            .unwrap();

        let a = &inventory.buckets[0];
        assert_eq!(a.region, None);
        assert_eq!(a.region_name(), "unknown");
        assert_eq!(a.deletion.object_lock, None);
        assert_eq!(a.deletion.lifecycle_rules, Some(false));
        assert_eq!(a.versioning, Some(Versioning::Disabled));
        assert_eq!(account.calls("lifecycle"), 3);
    }

    #[tokio::test]
    async fn test_list_buckets_partial_listing() {
        let account = FakeAccount::new(vec![
            FakeBucket::new("a", "eu-west-1"),
            FakeBucket::new("b", "eu-west-1"),
            FakeBucket::new("c", "eu-west-1"),
        ])
        .fail("list_buckets", "2", Fault::Service);

        let config = quick_config();
        let inventory = BucketInventory::new(&account, &config)
            .list_buckets()
            .await
            .unwrap();

        assert_eq!(names(&inventory), vec!["a", "b"]);
        assert!(!inventory.listing_complete);
    }

    #[tokio::test]
    async fn test_list_buckets_authorization_is_fatal() {
        let account = FakeAccount::new(vec![
            FakeBucket::new("a", "eu-west-1"),
            FakeBucket::new("b", "eu-west-1"),
        ])
        .fail("versioning", "b", Fault::Authorization);

        let config = quick_config();
        let ret = BucketInventory::new(&account, &config)
            .list_buckets()
            .await;

        assert!(ret.unwrap_err().is_authorization());
    }
}
