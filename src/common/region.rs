// Handles region things
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use tracing::debug;

/// Region that global services (Cost Explorer) and buckets without a
/// location constraint live in.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Turn a `GetBucketLocation` location constraint into a region name.
///
/// Location constraints for sufficiently old buckets in S3 may not quite
/// meet expectations. A missing or empty constraint means `us-east-1` and
/// the legacy `EU` constraint means `eu-west-1`.
pub fn location_to_region(location: Option<&str>) -> String {
    debug!("location_to_region: constraint is {:?}", location);

    match location {
        None | Some("") => DEFAULT_REGION.to_string(),
        Some("EU")      => "eu-west-1".to_string(),
        Some(other)     => other.to_string(),
    }
}
