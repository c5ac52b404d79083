// Common traits and types
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Run-wide settings for the analysis pipeline.
mod analysis_config;

/// Backend call error taxonomy and the pipeline boundary error.
mod error;

/// Continuation-token pagination.
pub mod paging;

/// Bucket location handling.
mod region;

/// Backoff and retry around single backend calls.
mod retry;

/// Byte count formatting for the summary output.
mod size_unit;

/// Traits implemented by the storage, metrics and billing backends.
mod sources;

pub use analysis_config::*;
pub use error::*;
pub use region::*;
pub use retry::*;
pub use size_unit::*;
pub use sources::*;
