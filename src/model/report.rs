// Region groups and the finished AnalysisReport
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use chrono::{
    DateTime,
    Utc,
};
use serde::Serialize;
use std::collections::BTreeMap;
use super::{
    BucketRecord,
    Collector,
};

/// Sums over a set of bucket records.
///
/// Only values that are present are summed. Buckets whose usage or cost is
/// missing are counted separately instead of contributing zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Totals {
    /// Number of buckets.
    pub buckets: usize,

    /// Sum of known stored bytes.
    pub bytes: u64,

    /// Buckets whose usage is unknown or whose usage collector failed.
    pub bytes_missing: usize,

    /// Sum of available cost amounts, per currency.
    pub cost: BTreeMap<String, f64>,

    /// Buckets with no numeric cost, whatever the reason.
    pub cost_missing: usize,

    /// Objects examined by the sampler.
    pub objects_sampled: usize,

    /// Buckets judged active from their object sample.
    pub active_buckets: usize,
}

impl Totals {
    /// Add one record to the totals.
    pub fn add(&mut self, record: &BucketRecord) {
        self.buckets += 1;

        match record.known_bytes() {
            Some(bytes) => self.bytes = self.bytes.saturating_add(bytes),
            None        => self.bytes_missing += 1,
        }

        match record.known_cost() {
            Some((amount, currency)) => {
                *self.cost.entry(currency.to_string()).or_insert(0.0) += amount;
            },
            None => self.cost_missing += 1,
        }

        if let Some(sample) = &record.sample {
            self.objects_sampled += sample.examined;
        }

        if record.active == Some(true) {
            self.active_buckets += 1;
        }
    }

    /// Fold another set of totals into this one.
    pub fn merge(&mut self, other: &Totals) {
        self.buckets         += other.buckets;
        self.bytes            = self.bytes.saturating_add(other.bytes);
        self.bytes_missing   += other.bytes_missing;
        self.cost_missing    += other.cost_missing;
        self.objects_sampled += other.objects_sampled;
        self.active_buckets  += other.active_buckets;

        for (currency, amount) in &other.cost {
            *self.cost.entry(currency.clone()).or_insert(0.0) += amount;
        }
    }
}

/// All records for one region, in inventory order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RegionGroup {
    region:  String,
    records: Vec<BucketRecord>,
    totals:  Totals,
}

impl RegionGroup {
    /// An empty group for `region`.
    pub(crate) fn new(region: impl Into<String>) -> Self {
        Self {
            region:  region.into(),
            records: Vec::new(),
            totals:  Totals::default(),
        }
    }

    /// Append a record, updating the totals.
    pub(crate) fn push(&mut self, record: BucketRecord) {
        self.totals.add(&record);
        self.records.push(record);
    }

    /// Region name.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Records in inventory order.
    pub fn records(&self) -> &[BucketRecord] {
        &self.records
    }

    /// Totals for this region.
    pub fn totals(&self) -> &Totals {
        &self.totals
    }
}

/// A bucket with at least one failed collector.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PartialBucket {
    /// Bucket name.
    pub bucket: String,

    /// Region the bucket was grouped under.
    pub region: String,

    /// The collectors that failed.
    pub failed: Vec<Collector>,
}

/// A bucket that was listed but left out of the report.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DroppedBucket {
    /// Bucket name.
    pub bucket: String,

    /// Warning recorded when it was dropped.
    pub reason: String,
}

/// The finished report. Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalysisReport {
    account:          Option<String>,
    generated_at:     DateTime<Utc>,
    regions:          Vec<RegionGroup>,
    totals:           Totals,
    partial:          Vec<PartialBucket>,
    dropped:          Vec<DroppedBucket>,
    listing_complete: bool,
}

impl AnalysisReport {
    /// Assemble a report from already grouped regions.
    pub(crate) fn new(
        account: Option<String>,
        generated_at: DateTime<Utc>,
        regions: Vec<RegionGroup>,
        dropped: Vec<DroppedBucket>,
        listing_complete: bool,
    ) -> Self {
        let mut totals = Totals::default();
        let mut partial = Vec::new();

        for group in &regions {
            totals.merge(group.totals());

            for record in group.records().iter().filter(|r| r.is_partial()) {
                partial.push(PartialBucket {
                    bucket: record.bucket.name.clone(),
                    region: group.region().to_string(),
                    failed: record.failed_collectors(),
                });
            }
        }

        Self {
            account,
            generated_at,
            regions,
            totals,
            partial,
            dropped,
            listing_complete,
        }
    }

    /// Label of the account or profile the report was built for.
    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    /// When the report was generated.
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Region groups in first-seen order.
    pub fn regions(&self) -> &[RegionGroup] {
        &self.regions
    }

    /// The group for `region`, if any bucket lives there.
    pub fn region(&self, region: &str) -> Option<&RegionGroup> {
        self.regions.iter().find(|g| g.region() == region)
    }

    /// Every record, region by region.
    pub fn records(&self) -> impl Iterator<Item = &BucketRecord> {
        self.regions.iter().flat_map(|g| g.records().iter())
    }

    /// Number of bucket records in the report.
    pub fn bucket_count(&self) -> usize {
        self.totals.buckets
    }

    /// Totals across every region.
    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    /// Buckets with partial collection failures.
    pub fn partial(&self) -> &[PartialBucket] {
        &self.partial
    }

    /// Buckets dropped from the inventory, with their warnings.
    pub fn dropped(&self) -> &[DroppedBucket] {
        &self.dropped
    }

    /// `false` if listing buckets failed part way and the report only
    /// covers the buckets listed before the failure.
    pub fn listing_complete(&self) -> bool {
        self.listing_complete
    }
}
