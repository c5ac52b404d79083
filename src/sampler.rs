// ObjectSampler: a bounded walk over a bucket's objects
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use crate::common::paging;
use crate::common::{
    CollectError,
    ObjectEntry,
    ObjectSource,
    RetryPolicy,
};
use crate::model::{
    Bucket,
    ObjectSampleSummary,
};
use futures::TryStreamExt;
use std::pin::pin;
use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};
use tracing::debug;

/// Largest page S3 will return from a single listing call.
const MAX_PAGE_SIZE: usize = 1000;

/// Type key for objects without a file extension.
pub const NO_EXTENSION: &str = "none";

/// Samples objects through an `ObjectSource`.
pub struct ObjectSampler<'a> {
    source: &'a dyn ObjectSource,
    retry:  &'a RetryPolicy,
}

impl<'a> ObjectSampler<'a> {
    /// Return a new sampler reading from `source`.
    pub fn new(source: &'a dyn ObjectSource, retry: &'a RetryPolicy) -> Self {
        Self {
            source,
            retry,
        }
    }

    /// Examine at most `limit` objects of `bucket`, in listing order.
    ///
    /// No page asks for more objects than are left in the budget, and no
    /// listing call is made at all for a `limit` of zero.
    pub async fn sample_objects(
        &self,
        bucket: &Bucket,
        limit: usize,
    ) -> Result<ObjectSampleSummary, CollectError> {
        let name = bucket.name.as_str();
        let region = bucket.region.as_deref();

        let mut summary = ObjectSampleSummary::empty(name, limit);

        if limit == 0 {
            return Ok(summary);
        }

        // Pages are only fetched once the previous one has been consumed,
        // so this is up to date whenever the next page size is worked out.
        let examined = AtomicUsize::new(0);
        let counter = &examined;

        let mut pages = pin!(paging::pages(move |token: Option<String>| {
            let remaining = limit.saturating_sub(counter.load(Ordering::SeqCst));
            let max_keys = remaining.min(MAX_PAGE_SIZE) as i32;

            debug!("sample_objects: '{}' requesting {} keys", name, max_keys);

            self.retry.run("ListObjectsV2", name, move || {
                self.source.list_objects_page(name, region, token.clone(), max_keys)
            })
        }));

        while let Some(page) = pages.try_next().await? {
            let more = page.next_token.as_deref().is_some_and(|t| !t.is_empty());
            let mut items = page.items.into_iter();

            for object in items.by_ref().take(limit - summary.examined) {
                record(&mut summary, &object);
            }

            counter.store(summary.examined, Ordering::SeqCst);

            if summary.examined >= limit {
                summary.exhausted = !more && items.next().is_none();

                return Ok(summary);
            }
        }

        summary.exhausted = true;

        Ok(summary)
    }
}

/// The first path segment of `key`, if the key has more than one.
pub fn top_level_prefix(key: &str) -> Option<&str> {
    match key.split_once('/') {
        Some((prefix, _)) if !prefix.is_empty() => Some(prefix),
        _                                       => None,
    }
}

/// The lower-cased extension of the last path segment of `key`.
///
/// Keys without one (no `.`, a dot file such as `.env`, a trailing `.` or a
/// directory marker ending in `/`) map to `none`.
pub fn type_key(key: &str) -> String {
    let basename = match key.rsplit_once('/') {
        Some((_, basename)) => basename,
        None                => key,
    };

    match basename.rfind('.') {
        Some(0) | None                         => NO_EXTENSION.to_string(),
        Some(i) if i + 1 == basename.len()     => NO_EXTENSION.to_string(),
        Some(i)                                => basename[i + 1..].to_lowercase(),
    }
}

// Fold one object into the summary.
fn record(summary: &mut ObjectSampleSummary, object: &ObjectEntry) {
    summary.examined += 1;

    if let Some(prefix) = top_level_prefix(&object.key) {
        if !summary.prefixes.contains(prefix) {
            summary.prefixes.insert(prefix.to_string());
        }
    }

    *summary.types.entry(type_key(&object.key)).or_insert(0) += 1;

    if let Some(modified) = object.last_modified {
        summary.earliest_modified = Some(match summary.earliest_modified {
            Some(earliest) => earliest.min(modified),
            None           => modified,
        });

        summary.latest_modified = Some(match summary.latest_modified {
            Some(latest) => latest.max(modified),
            None         => modified,
        });
    }
}
