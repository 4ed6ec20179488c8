//! Line-delimited output messages handed to the downstream sink.

use std::io::Write;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::normalize::NormalizedRecord;
use crate::schema::Schema;

/// A message on the tap's output stream.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum TapMessage {
    #[serde(rename = "SCHEMA")]
    Schema {
        stream: String,
        schema: Value,
        key_properties: Vec<String>,
    },
    #[serde(rename = "RECORD")]
    Record { stream: String, record: Value },
}

impl TapMessage {
    pub fn schema(schema: &Schema) -> Self {
        TapMessage::Schema {
            stream: schema.stream.to_string(),
            schema: schema.to_json_schema(),
            key_properties: schema.key_properties.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn record(normalized: NormalizedRecord) -> Self {
        TapMessage::Record {
            stream: normalized.stream.clone(),
            record: normalized.into_value(),
        }
    }
}

/// Output port for emitted messages.
#[async_trait]
pub trait RecordSinkPort: Send + Sync {
    async fn write(&self, message: &TapMessage) -> Result<()>;
}

/// Default sink: one JSON message per line on stdout.
pub struct StdoutSink;

#[async_trait]
impl RecordSinkPort for StdoutSink {
    async fn write(&self, message: &TapMessage) -> Result<()> {
        let line = serde_json::to_string(message)?;
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", line)?;
        Ok(())
    }
}
