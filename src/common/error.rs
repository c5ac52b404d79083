// Error taxonomy shared by every backend call
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
use aws_smithy_runtime_api::client::result::SdkError;
use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use std::time::Duration;
use thiserror::Error;

// Error codes meaning the credentials themselves are unusable. Any of these
// implies every later call will fail too.
const AUTHORIZATION_CODES: &[&str] = &[
    "AuthFailure",
    "ExpiredToken",
    "ExpiredTokenException",
    "IncompleteSignature",
    "InvalidAccessKeyId",
    "InvalidClientTokenId",
    "InvalidToken",
    "MissingAuthenticationToken",
    "SignatureDoesNotMatch",
    "TokenRefreshRequired",
    "UnrecognizedClientException",
];

// Error codes returned by S3, CloudWatch and Cost Explorer when they want us
// to slow down.
const THROTTLING_CODES: &[&str] = &[
    "BandwidthLimitExceeded",
    "LimitExceededException",
    "PriorRequestNotComplete",
    "ProvisionedThroughputExceededException",
    "RequestLimitExceeded",
    "RequestThrottled",
    "RequestThrottledException",
    "SlowDown",
    "ThrottledException",
    "Throttling",
    "ThrottlingException",
    "TooManyRequestsException",
];

const NOT_FOUND_CODES: &[&str] = &[
    "NoSuchBucket",
    "NotFound",
    "ResourceNotFoundException",
];

/// Errors produced by a single backend call.
#[derive(Debug, Error)]
pub enum CollectError {
    /// The credentials are invalid or expired. Fatal for the whole run.
    #[error("authorization failed: {0}")]
    Authorization(String),

    /// The backend asked us to back off.
    #[error("throttled: {0}")]
    Throttled(String),

    /// A server side or network error that may succeed if repeated.
    #[error("transient failure: {0}")]
    Transient(String),

    /// A single attempt exceeded the per-call timeout.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The bucket or resource no longer exists.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other failure. Not retried.
    #[error("{0}")]
    Service(String),

    /// A retryable error kept recurring until the attempt budget ran out.
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts made, including the first.
        attempts: u32,

        /// The error returned by the final attempt.
        #[source]
        last: Box<CollectError>,
    },
}

impl CollectError {
    /// Returns `true` if the call that produced this error is worth
    /// repeating after a delay.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Throttled(_) | Self::Transient(_) | Self::Timeout(_)
        )
    }

    /// Returns `true` if this error should abort the whole run.
    pub fn is_authorization(&self) -> bool {
        match self {
            Self::Authorization(_)               => true,
            Self::RetriesExhausted { last, .. } => last.is_authorization(),
            _                                    => false,
        }
    }

    /// Returns `true` if the resource being queried has gone away.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Classify a failed call from its service error code and HTTP status.
    ///
    /// Codes take precedence over status, since S3 returns `403` for both
    /// expired credentials and a per-bucket access denial.
    pub fn classify(
        code: Option<&str>,
        status: Option<u16>,
        message: String,
    ) -> Self {
        if let Some(code) = code {
            if AUTHORIZATION_CODES.contains(&code) {
                return Self::Authorization(message);
            }

            if THROTTLING_CODES.contains(&code) {
                return Self::Throttled(message);
            }

            if NOT_FOUND_CODES.contains(&code) {
                return Self::NotFound(message);
            }
        }

        match status {
            Some(401)             => Self::Authorization(message),
            Some(404)             => Self::NotFound(message),
            Some(429 | 503)       => Self::Throttled(message),
            Some(500 | 502 | 504) => Self::Transient(message),
            _                     => Self::Service(message),
        }
    }
}

/// The service error code carried by an SDK error, if any.
pub fn service_code<E>(err: &SdkError<E, HttpResponse>) -> Option<&str>
where
    E: ProvideErrorMetadata,
{
    err.as_service_error().and_then(|e| e.code())
}

// All three AWS SDK crates share the smithy SdkError, so one conversion
// covers every operation.
impl<E> From<SdkError<E, HttpResponse>> for CollectError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    fn from(err: SdkError<E, HttpResponse>) -> Self {
        let message = DisplayErrorContext(&err).to_string();

        match &err {
            SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => {
                Self::Transient(message)
            },
            SdkError::ConstructionFailure(_) => Self::Service(message),
            _ => {
                let code = service_code(&err);
                let status = err.raw_response()
                    .map(|r| r.status().as_u16());

                Self::classify(code, status, message)
            },
        }
    }
}

/// Failures that cross the pipeline boundary.
///
/// Everything else is captured as data on the report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// An authorization failure cancelled the run.
    #[error(
        "authorization failed after {completed} bucket records were merged: \
         {message}"
    )]
    Authorization {
        /// The error reported by the backend.
        message: String,

        /// Bucket records fully merged when the run was cancelled.
        completed: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_codes() {
        let tests = vec![
            (Some("ExpiredToken"),          Some(400), "authorization"),
            (Some("InvalidAccessKeyId"),    Some(403), "authorization"),
            (Some("AccessDenied"),          Some(403), "service"),
            (Some("SlowDown"),              Some(503), "throttled"),
            (Some("ThrottlingException"),   Some(400), "throttled"),
            (Some("NoSuchBucket"),          Some(404), "not_found"),
            (None,                          Some(404), "not_found"),
            (None,                          Some(429), "throttled"),
            (None,                          Some(500), "transient"),
            (Some("ValidationException"),   Some(400), "service"),
            (None,                          None,      "service"),
        ];

        for (code, status, expected) in tests {
            let err = CollectError::classify(code, status, "msg".into());

            let kind = match err {
                CollectError::Authorization(_) => "authorization",
                CollectError::Throttled(_)     => "throttled",
                CollectError::Transient(_)     => "transient",
                CollectError::NotFound(_)      => "not_found",
                CollectError::Service(_)       => "service",
                _                              => "other",
            };

            assert_eq!(kind, expected, "code {:?} status {:?}", code, status);
        }
    }

    #[test]
    fn test_is_retryable() {
        assert!(CollectError::Throttled("x".into()).is_retryable());
        assert!(CollectError::Transient("x".into()).is_retryable());
        assert!(CollectError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(!CollectError::Service("x".into()).is_retryable());
        assert!(!CollectError::Authorization("x".into()).is_retryable());
        assert!(!CollectError::NotFound("x".into()).is_retryable());
    }

    #[test]
    fn test_exhausted_keeps_authorization() {
        let err = CollectError::RetriesExhausted {
            attempts: 2,
            last:     Box::new(CollectError::Authorization("x".into())),
        };

        assert!(err.is_authorization());
    }
}
