// The report model handed to renderers
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Static bucket metadata captured by the inventory.
mod bucket;

/// Cost Explorer estimates.
mod cost;

/// Per-bucket composite record and collection failure markers.
mod record;

/// Region groups, totals and the finished report.
mod report;

/// Object sample summaries.
mod sample;

/// CloudWatch usage samples.
mod usage;

pub use bucket::*;
pub use cost::*;
pub use record::*;
pub use report::*;
pub use sample::*;
pub use usage::*;
