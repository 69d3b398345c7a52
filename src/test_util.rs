use crate::{envelope::EventEnvelope, error::ForwardError, hec::Transport};
use async_trait::async_trait;
use aws_sdk_s3::Credentials;
use aws_types::{region::Region, SdkConfig};
use flate2::{write::GzEncoder, Compression};
use serde_json::{json, Value};
use std::{io::Write, sync::Mutex};

/// S3 answer for a key that doesn't exist
pub const NO_SUCH_KEY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message><RequestId>4442587FB7D0A2F9</RequestId></Error>"#;

/// Configuration for mocking AWS SDK clients
pub async fn get_mock_config() -> SdkConfig {
    aws_config::from_env()
        .region(Region::new("us-west-1"))
        .credentials_provider(Credentials::new(
            "accesskey",
            "privatekey",
            None,
            None,
            "dummy",
        ))
        .load()
        .await
}

/// Base request builder for the AWS SDK calls
pub fn get_request_builder(service: &str) -> http::request::Builder {
    http::Request::builder().uri(format!("https://{service}.us-west-1.amazonaws.com/"))
}

/// Gzip newline-delimited lines the way producers upload them
pub fn gzip_lines(lines: &[&str]) -> Vec<u8> {
    let mut content = Vec::new();
    for line in lines {
        content.extend_from_slice(line.as_bytes());
        content.push(b'\n');
    }
    gzip_bytes(&content)
}

/// Gzip raw bytes, for content that isn't valid UTF-8
pub fn gzip_bytes(content: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content).unwrap();
    encoder.finish().unwrap()
}

/// `n` lines of the form `{"n": i}`, gzipped
pub fn numbered_lines(n: usize) -> Vec<u8> {
    let lines: Vec<String> = (0..n).map(|i| json!({ "n": i }).to_string()).collect();
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
    gzip_lines(&lines)
}

/// Transport that keeps every batch it is handed, and fails the
/// batches listed in `fail_on` (1-based).
#[derive(Default)]
pub struct RecordingTransport {
    batches: Mutex<Vec<Vec<EventEnvelope>>>,
    fail_on: Vec<usize>,
}

impl RecordingTransport {
    /// Transport that fails the given batches and accepts the rest
    pub fn failing_on(batches: &[usize]) -> RecordingTransport {
        RecordingTransport {
            fail_on: batches.to_vec(),
            ..Default::default()
        }
    }

    /// Size of every batch received, in order
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().iter().map(Vec::len).collect()
    }

    /// Every event received, flattened across batches
    pub fn events(&self) -> Vec<Value> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .map(|e| e.event.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, batch: &[EventEnvelope]) -> Result<Value, ForwardError> {
        let n = {
            let mut batches = self.batches.lock().unwrap();
            batches.push(batch.to_vec());
            batches.len()
        };

        if self.fail_on.contains(&n) {
            return Err(ForwardError::Rejected {
                status: 503,
                body: r#"{"text": "Server is busy", "code": 9}"#.into(),
            });
        }
        Ok(json!({"text": "Success", "code": 0}))
    }
}
