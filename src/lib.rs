#![deny(missing_docs)]
//! <fullname>S3 to HEC log forwarder</fullname>
//!
//! Lambda function that receives S3 object notifications through SQS.
//! Each referenced object holds gzipped newline-delimited JSON logs; the
//! function decodes every line and forwards the records in batches to a
//! Splunk HTTP Event Collector.
use lambda_runtime::LambdaEvent;

/// `config` reads the start-up settings from the environment
pub mod config;
pub use config::Config;

mod envelope;
pub use envelope::{DecodeError, EnvelopeBuilder, EventEnvelope};

mod error;
pub use error::{ForwardError, RuntimeError};

mod event;
pub use event::{Coordinate, SqsEvent};

/// `fetcher` retrieves and decodes S3 objects
pub mod fetcher;

/// `forwarder` batches decoded records towards the collector
pub mod forwarder;

mod hec;
pub use hec::{HecClient, Transport};

mod pipeline;
pub use pipeline::{Pipeline, PipelineResult, Response, Status};

/// `secrets` includes helpers to work with AWS Secrets Manager
pub mod secrets;

#[cfg(test)]
mod test_util;

/// `handle_records` is the Lambda function entry point
/// that receives the object notifications from SQS
#[tracing::instrument(skip(pipeline, event), fields(request_id = %event.context.request_id))]
pub async fn handle_records(
    pipeline: &Pipeline,
    event: LambdaEvent<SqsEvent>,
) -> Result<Response, RuntimeError> {
    let coordinates = event.payload.coordinates();
    tracing::info!(objects = coordinates.len(), "received notifications");

    Ok(pipeline.run(&coordinates).await)
}
