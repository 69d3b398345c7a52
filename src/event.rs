use serde::{de::Error, Deserialize, Deserializer};

/// `SqsEvent` represents the raw event sent by SQS
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct SqsEvent {
    /// Messages in the batch
    #[serde(rename = "Records")]
    pub records: Vec<SqsMessage>,
}

/// `SqsMessage` is one queued message. Its body is an S3 notification
/// encoded as a JSON string, it needs a custom deserializer
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SqsMessage {
    /// SQS message id
    #[serde(default)]
    pub message_id: String,
    /// Decoded notification
    #[serde(deserialize_with = "from_json_string")]
    pub body: S3Notification,
}

/// `S3Notification` is the decoded message body.
/// Test events sent by S3 carry no records.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct S3Notification {
    /// Object events
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

/// `S3EventRecord` describes one object event
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct S3EventRecord {
    /// S3 details of the event
    pub s3: S3Entity,
}

/// `S3Entity` locates the object that triggered the event
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct S3Entity {
    /// Bucket of the object
    pub bucket: S3Bucket,
    /// The object itself
    pub object: S3Object,
}

/// `S3Bucket` names the bucket holding the object
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct S3Bucket {
    /// Bucket name
    pub name: String,
}

/// `S3Object` holds the object key, already url-decoded
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct S3Object {
    /// Object key
    #[serde(deserialize_with = "from_url_encoded")]
    pub key: String,
}

/// `Coordinate` identifies one compressed object to process
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Coordinate {
    /// Bucket name
    pub bucket: String,
    /// Object key
    pub key: String,
}

impl Coordinate {
    /// Build a coordinate from its parts.
    pub fn new(bucket: &str, key: &str) -> Coordinate {
        Coordinate {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl SqsEvent {
    /// Every object coordinate in the event, in delivery order.
    pub fn coordinates(&self) -> Vec<Coordinate> {
        self.records
            .iter()
            .flat_map(|message| message.body.records.iter())
            .map(|record| Coordinate {
                bucket: record.s3.bucket.name.clone(),
                key: record.s3.object.key.clone(),
            })
            .collect()
    }
}

fn from_json_string<'d, D>(deserializer: D) -> Result<S3Notification, D::Error>
where
    D: Deserializer<'d>,
{
    let body = String::deserialize(deserializer)?;
    serde_json::from_str(&body).map_err(D::Error::custom)
}

// S3 encodes spaces in notification keys as `+`
fn from_url_encoded<'d, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'d>,
{
    let key = String::deserialize(deserializer)?.replace('+', " ");
    urlencoding::decode(&key)
        .map(|k| k.into_owned())
        .map_err(D::Error::custom)
}
