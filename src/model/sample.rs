// ObjectSampleSummary
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use chrono::{
    DateTime,
    Duration,
    Utc,
};
use serde::Serialize;
use std::collections::{
    BTreeMap,
    BTreeSet,
};

/// What a bounded walk over a bucket's objects found.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ObjectSampleSummary {
    /// Bucket the sample was taken from.
    pub bucket: String,

    /// Number of objects examined. Never more than `limit`.
    pub examined: usize,

    /// The sample limit in force.
    pub limit: usize,

    /// `true` if the listing ended and every object it returned was
    /// examined, including when that happened exactly at the limit.
    pub exhausted: bool,

    /// Oldest last-modified time seen.
    pub earliest_modified: Option<DateTime<Utc>>,

    /// Newest last-modified time seen.
    pub latest_modified: Option<DateTime<Utc>>,

    /// First path segments of keys containing a `/`.
    pub prefixes: BTreeSet<String>,

    /// Object count per lower-cased file extension, `none` for keys
    /// without one.
    pub types: BTreeMap<String, usize>,
}

impl ObjectSampleSummary {
    /// A summary of nothing.
    pub fn empty(bucket: impl Into<String>, limit: usize) -> Self {
        Self {
            bucket:            bucket.into(),
            examined:          0,
            limit,
            exhausted:         false,
            earliest_modified: None,
            latest_modified:   None,
            prefixes:          BTreeSet::new(),
            types:             BTreeMap::new(),
        }
    }

    /// Whether the newest object seen was modified within `window` of
    /// `now`. `None` if no modification time was observed.
    pub fn is_active(&self, now: DateTime<Utc>, window: Duration) -> Option<bool> {
        self.latest_modified.map(|latest| now - latest < window)
    }
}
