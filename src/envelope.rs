use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error as ThisError;

/// Default `index` attached to every event
pub const DEFAULT_INDEX: &str = "aws_others";
/// Default `sourcetype` attached to every event
pub const DEFAULT_SOURCETYPE: &str = "datamesh:aws_account";

/// `EventEnvelope` is one decoded log line, ready to be sent to the collector
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventEnvelope {
    /// Destination index
    pub index: String,
    /// Destination sourcetype
    pub sourcetype: String,
    /// The decoded record
    pub event: Value,
}

/// Reasons a single line cannot be turned into an envelope
#[derive(Debug, ThisError)]
pub enum DecodeError {
    /// The line isn't valid JSON
    #[error("line is not valid json")]
    Json(#[from] serde_json::Error),
    /// The line carries a broken `\u` escape
    #[error("invalid unicode escape at byte {0}")]
    InvalidEscape(usize),
}

/// `EnvelopeBuilder` wraps decoded records with fixed routing metadata
#[derive(Clone, Debug)]
pub struct EnvelopeBuilder {
    index: String,
    sourcetype: String,
}

impl Default for EnvelopeBuilder {
    fn default() -> Self {
        EnvelopeBuilder::new(DEFAULT_INDEX, DEFAULT_SOURCETYPE)
    }
}

impl EnvelopeBuilder {
    /// Create a builder for the given routing fields.
    pub fn new(index: &str, sourcetype: &str) -> EnvelopeBuilder {
        EnvelopeBuilder {
            index: index.into(),
            sourcetype: sourcetype.into(),
        }
    }

    /// Wrap an already normalized record.
    pub fn build(&self, event: Value) -> EventEnvelope {
        EventEnvelope {
            index: self.index.clone(),
            sourcetype: self.sourcetype.clone(),
            event,
        }
    }

    /// Parse one raw line, normalize its text and wrap it.
    pub fn decode_line(&self, line: &[u8]) -> Result<EventEnvelope, DecodeError> {
        let record: Value = serde_json::from_slice(line)?;
        Ok(self.build(normalize(record)?))
    }
}

/// Decode escape text that survived a double-escaping producer.
///
/// Walks every string in the record, object keys included, and replaces
/// literal `\uXXXX` sequences with the character they name. Characters that
/// are already literal (multi-byte UTF-8) are left alone.
pub fn normalize(record: Value) -> Result<Value, DecodeError> {
    Ok(match record {
        Value::String(s) => Value::String(unescape_unicode(&s)?),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(normalize)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Object(fields) => {
            let mut out = Map::with_capacity(fields.len());
            for (k, v) in fields {
                out.insert(unescape_unicode(&k)?, normalize(v)?);
            }
            Value::Object(out)
        }
        other => other,
    })
}

fn unescape_unicode(s: &str) -> Result<String, DecodeError> {
    if !s.contains("\\u") {
        return Ok(s.to_owned());
    }

    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        // an escaped backslash keeps the following text literal
        if bytes[i] == b'\\' && bytes.get(i + 1) == Some(&b'\\') {
            i += 2;
            continue;
        }
        let unit = match read_escape(bytes, i) {
            Some(unit) => unit,
            None => {
                i += 1;
                continue;
            }
        };

        out.push_str(&s[copied..i]);
        let start = i;
        i += 6;

        let c = match unit {
            0xD800..=0xDBFF => match read_escape(bytes, i) {
                Some(low @ 0xDC00..=0xDFFF) => {
                    i += 6;
                    let code = 0x10000 + ((unit as u32 - 0xD800) << 10) + (low as u32 - 0xDC00);
                    char::from_u32(code)
                }
                _ => None,
            },
            0xDC00..=0xDFFF => None,
            _ => char::from_u32(unit as u32),
        };

        out.push(c.ok_or(DecodeError::InvalidEscape(start))?);
        copied = i;
    }

    out.push_str(&s[copied..]);
    Ok(out)
}

/// Read a `\uXXXX` escape starting at `at`, returning the UTF-16 unit.
fn read_escape(bytes: &[u8], at: usize) -> Option<u16> {
    let seq = bytes.get(at..at + 6)?;
    if seq[0] != b'\\' || seq[1] != b'u' {
        return None;
    }
    let hex = std::str::from_utf8(&seq[2..]).ok()?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(hex, 16).ok()
}
