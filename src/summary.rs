// Plain text rendering of an AnalysisReport
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use crate::common::SizeUnit;
use crate::model::{
    AnalysisReport,
    BucketRecord,
    Cost,
    Totals,
    Usage,
};
use std::collections::BTreeMap;
use std::fmt;

/// Per-region text summary of a report.
pub struct Summary<'a> {
    report: &'a AnalysisReport,
    unit:   SizeUnit,
}

impl<'a> Summary<'a> {
    /// Summarise `report`, formatting byte counts with `unit`.
    pub fn new(report: &'a AnalysisReport, unit: SizeUnit) -> Self {
        Self {
            report,
            unit,
        }
    }

    fn usage(&self, record: &BucketRecord) -> String {
        match &record.usage {
            Some(sample) => {
                match sample.usage {
                    Usage::Known { bytes, .. } => self.unit.format(bytes),
                    Usage::Unknown             => "unknown".into(),
                }
            },
            None => "failed".into(),
        }
    }

    fn totals(&self, f: &mut fmt::Formatter<'_>, totals: &Totals) -> fmt::Result {
        writeln!(
            f,
            "  total: {} ({} unknown), cost {} ({} missing), {} active",
            self.unit.format(totals.bytes),
            totals.bytes_missing,
            costs(&totals.cost),
            totals.cost_missing,
            totals.active_buckets,
        )
    }
}

fn cost(record: &BucketRecord) -> String {
    match record.cost.as_ref().map(|c| &c.cost) {
        Some(Cost::Available { amount, currency }) => {
            format!("{:.2} {}", amount, currency)
        },
        Some(Cost::Disabled) => "disabled".into(),
        Some(Cost::Pending)  => "pending".into(),
        None                 => "failed".into(),
    }
}

fn costs(totals: &BTreeMap<String, f64>) -> String {
    if totals.is_empty() {
        return "n/a".into();
    }

    totals.iter()
        .map(|(currency, amount)| format!("{:.2} {}", amount, currency))
        .collect::<Vec<_>>()
        .join(", ")
}

fn sample(record: &BucketRecord) -> String {
    let sample = match &record.sample {
        Some(sample) => sample,
        None         => return "sample failed".into(),
    };

    let more = if sample.exhausted { "" } else { "+" };

    let activity = match record.active {
        Some(true)  => ", active",
        Some(false) => ", idle",
        None        => "",
    };

    format!("{}{} objects sampled{}", sample.examined, more, activity)
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "bucket" } else { "buckets" }
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;

        if let Some(account) = report.account() {
            writeln!(f, "Account: {}", account)?;
        }

        writeln!(f, "Generated: {}", report.generated_at().to_rfc3339())?;

        for group in report.regions() {
            let count = group.totals().buckets;

            writeln!(f)?;
            writeln!(f, "{} ({} {})", group.region(), count, plural(count))?;

            for record in group.records() {
                writeln!(
                    f,
                    "  {}: {}, cost {}, {}",
                    record.bucket.name,
                    self.usage(record),
                    cost(record),
                    sample(record),
                )?;
            }

            self.totals(f, group.totals())?;
        }

        let count = report.bucket_count();

        writeln!(f)?;
        writeln!(f, "All regions ({} {})", count, plural(count))?;
        self.totals(f, report.totals())?;

        for partial in report.partial() {
            let failed: Vec<&str> = partial.failed
                .iter()
                .map(|c| c.as_str())
                .collect();

            writeln!(f, "Partial: {} ({})", partial.bucket, failed.join(", "))?;
        }

        for dropped in report.dropped() {
            writeln!(f, "Dropped: {}: {}", dropped.bucket, dropped.reason)?;
        }

        if !report.listing_complete() {
            writeln!(f, "Warning: bucket listing was incomplete")?;
        }

        Ok(())
    }
}
