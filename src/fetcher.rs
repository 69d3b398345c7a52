use crate::{
    envelope::{EnvelopeBuilder, EventEnvelope},
    error::RuntimeError,
    event::Coordinate,
};
use aws_sdk_s3::{Client, Error};
use flate2::read::MultiGzDecoder;
use std::{
    io::{BufRead, BufReader},
    time::Duration,
};
use tokio::sync::mpsc::UnboundedSender;

/// `FetchReport` summarizes what the fetcher queued for one object
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// Envelopes pushed onto the queue
    pub records: usize,
    /// Malformed lines that were logged and dropped
    pub skipped: usize,
}

/// Retrieve an object, decompress it and queue one envelope per line.
///
/// The sender is consumed: dropping it closes the queue, which is how the
/// forwarder learns the stream ended. That happens exactly once, on success
/// and on every error path alike.
#[tracing::instrument(skip(client, builder, tx))]
pub async fn fetch(
    client: &Client,
    coordinate: &Coordinate,
    builder: &EnvelopeBuilder,
    timeout: Duration,
    tx: UnboundedSender<EventEnvelope>,
) -> Result<FetchReport, RuntimeError> {
    let content = tokio::time::timeout(timeout, get_object(client, coordinate))
        .await
        .map_err(|_| RuntimeError::FetchTimeout(timeout))??;

    tracing::info!(size = content.len(), "object retrieved");

    let builder = builder.clone();
    let key = coordinate.key.clone();
    let span = tracing::Span::current();
    tokio::task::spawn_blocking(move || {
        span.in_scope(|| decode_object(&content, &builder, &key, &tx))
    })
    .await?
}

async fn get_object(client: &Client, coordinate: &Coordinate) -> Result<Vec<u8>, RuntimeError> {
    let output = client
        .get_object()
        .bucket(&coordinate.bucket)
        .key(&coordinate.key)
        .send()
        .await
        .map_err(Error::from)?;

    let body = output
        .body
        .collect()
        .await
        .map_err(|e| RuntimeError::ObjectBody(e.to_string()))?;

    Ok(body.into_bytes().to_vec())
}

/// Decompress a gzip payload and queue its newline-delimited JSON records.
///
/// Malformed lines are skipped and counted. A broken gzip stream stops
/// decoding with an error, whatever was queued before it stays queued.
pub fn decode_object(
    content: &[u8],
    builder: &EnvelopeBuilder,
    key: &str,
    tx: &UnboundedSender<EventEnvelope>,
) -> Result<FetchReport, RuntimeError> {
    let mut report = FetchReport::default();
    if content.is_empty() {
        return Ok(report);
    }

    let reader = BufReader::new(MultiGzDecoder::new(content));
    for (n, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        match builder.decode_line(&line) {
            Ok(envelope) => {
                if tx.send(envelope).is_err() {
                    tracing::warn!(key, "forwarder is gone, stop decoding");
                    break;
                }
                report.records += 1;
            }
            Err(err) => {
                tracing::warn!(key, line = n + 1, error = %err, "skipping malformed line");
                report.skipped += 1;
            }
        }
    }

    Ok(report)
}
