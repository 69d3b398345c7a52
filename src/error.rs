use crate::pipeline::Status;
use std::time::Duration;
use thiserror::Error as ThisError;

/// Different errors that the application can raise
#[derive(Debug, ThisError)]
pub enum RuntimeError {
    /// Error returned when a configuration value is missing or malformed
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Error returned by the Secrets Manager API
    #[error("failed to resolve hec token")]
    SecretResolution(#[from] aws_sdk_secretsmanager::Error),
    /// Error returned if the secret exists but has no string value
    #[error("secret {0} has no string value")]
    MissingSecret(String),
    /// Error returned by the S3 API while retrieving an object
    #[error("failed to retrieve object")]
    Retrieval(#[from] aws_sdk_s3::Error),
    /// Error returned if the object body stream breaks mid-read
    #[error("failed to read object body: {0}")]
    ObjectBody(String),
    /// Error returned if the object retrieval doesn't finish in time
    #[error("object retrieval timed out after {0:?}")]
    FetchTimeout(Duration),
    /// Error returned if the object is not a valid gzip stream
    #[error("failed to decompress object")]
    Decompress(#[from] std::io::Error),
    /// Error returned if the collector http client cannot be built
    #[error("failed to build hec client")]
    HttpClient(#[from] reqwest::Error),
    /// Error returned if the decoding task panicked or was cancelled
    #[error("decoding task failed")]
    Task(#[from] tokio::task::JoinError),
}

/// Errors raised while sending one batch to the collector.
/// They are logged and never abort the pipeline.
#[derive(Debug, ThisError)]
pub enum ForwardError {
    /// Connection, TLS or timeout failure
    #[error("hec request failed")]
    Request(#[from] reqwest::Error),
    /// The collector answered with a non-success status
    #[error("hec rejected batch with status {status}: {body}")]
    Rejected {
        /// HTTP status returned by the collector
        status: u16,
        /// Raw response body
        body: String,
    },
    /// The collector answered with something that isn't JSON
    #[error("malformed hec response")]
    Body(#[from] serde_json::Error),
}

impl ForwardError {
    /// Normalized status reported for any failed send.
    pub fn status_code(&self) -> u16 {
        Status::TransportRejected.code()
    }
}
