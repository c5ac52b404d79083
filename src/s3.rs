// Imports all of the components needed for s3::client
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Implementation of `BucketSource` and `ObjectSource` for our S3 `Client`.
mod bucket_source;

/// S3 `Client`.
mod client;

pub use client::*;
