use crate::{
    config::Config,
    envelope::EnvelopeBuilder,
    event::Coordinate,
    fetcher::{self, FetchReport},
    forwarder::{self, ForwardReport},
    hec::Transport,
};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;

/// Status reported for an object or a whole invocation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// Every record was queued and every batch was attempted
    Success,
    /// The collector refused a request
    TransportRejected,
    /// The object couldn't be retrieved or decompressed
    FetchFailed,
}

impl Status {
    /// HTTP-like code for the status.
    pub fn code(self) -> u16 {
        match self {
            Status::Success => 200,
            Status::TransportRejected => 400,
            Status::FetchFailed => 500,
        }
    }
}

/// `PipelineResult` is the terminal report for one object
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineResult {
    /// Bucket of the object
    pub bucket: String,
    /// Key of the object
    pub key: String,
    /// Outcome of the run
    pub status: Status,
    /// What the fetcher queued
    pub fetched: FetchReport,
    /// What the forwarder sent
    pub forwarded: ForwardReport,
}

/// `Response` is returned to the Lambda runtime
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Code summarizing the whole invocation
    pub status_code: u16,
}

/// `Pipeline` moves objects from S3 to the collector, one at a time.
pub struct Pipeline {
    s3: aws_sdk_s3::Client,
    transport: Arc<dyn Transport>,
    builder: EnvelopeBuilder,
    batch_size: usize,
    fetch_timeout: Duration,
    fail_fast: bool,
}

impl Pipeline {
    /// Initialize the pipeline from the start-up configuration.
    pub fn new(config: &Config, s3: aws_sdk_s3::Client, transport: Arc<dyn Transport>) -> Pipeline {
        Pipeline {
            s3,
            transport,
            builder: EnvelopeBuilder::new(&config.index, &config.sourcetype),
            batch_size: config.batch_size,
            fetch_timeout: config.fetch_timeout,
            fail_fast: config.fail_fast,
        }
    }

    /// Process one object: fetch and forward run concurrently over a
    /// fresh queue, and the result is known once both are done.
    #[tracing::instrument(skip(self), fields(run_id = %uuid::Uuid::new_v4()))]
    pub async fn process(&self, coordinate: &Coordinate) -> PipelineResult {
        let (tx, rx) = mpsc::unbounded_channel();

        let (fetched, forwarded) = tokio::join!(
            fetcher::fetch(&self.s3, coordinate, &self.builder, self.fetch_timeout, tx),
            forwarder::forward(rx, self.transport.as_ref(), self.batch_size),
        );

        let (status, fetched) = match fetched {
            Ok(report) => (Status::Success, report),
            Err(err) => {
                tracing::error!(
                    bucket = %coordinate.bucket,
                    key = %coordinate.key,
                    error = ?err,
                    "failed while reading object"
                );
                (Status::FetchFailed, FetchReport::default())
            }
        };

        tracing::info!(
            key = %coordinate.key,
            status = status.code(),
            records = fetched.records,
            skipped = fetched.skipped,
            batches = forwarded.batches,
            failed_batches = forwarded.failed,
            "object processed"
        );

        PipelineResult {
            bucket: coordinate.bucket.clone(),
            key: coordinate.key.clone(),
            status,
            fetched,
            forwarded,
        }
    }

    /// Process every object in order and summarize the invocation.
    ///
    /// With `fail_fast` the first failed object ends the invocation and the
    /// remaining ones are left untouched.
    #[tracing::instrument(skip(self, coordinates), fields(objects = coordinates.len()))]
    pub async fn run(&self, coordinates: &[Coordinate]) -> Response {
        let mut status = Status::Success;

        for (i, coordinate) in coordinates.iter().enumerate() {
            let result = self.process(coordinate).await;
            if result.status == Status::Success {
                continue;
            }

            status = result.status;
            if self.fail_fast {
                tracing::warn!(
                    key = %result.key,
                    skipped_objects = coordinates.len() - i - 1,
                    "stopping at first failed object"
                );
                break;
            }
        }

        Response {
            status_code: status.code(),
        }
    }
}
