//! JSON-lines record sink.
//!
//! Each verified record becomes one line of JSON on the wrapped writer,
//! tagged with its kind. Lines are flushed as they are written so a
//! downstream reader sees records as soon as they verify.

use std::io::Write;

use alexandria_protocol::{RecordStore, StoreError, StoredMedia, StoredPublisher};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;

/// One output line.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkRecord<'a> {
    Media(&'a StoredMedia),
    Publisher(&'a StoredPublisher),
}

/// Record store writing JSON lines.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_line(&self, record: &SinkRecord<'_>) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(record).map_err(|e| StoreError::Rejected {
            reason: e.to_string(),
        })?;
        line.push(b'\n');

        let mut writer = self.writer.lock();
        writer
            .write_all(&line)
            .and_then(|()| writer.flush())
            .map_err(|e| StoreError::Io(e.to_string()))
    }
}

#[async_trait]
impl<W: Write + Send> RecordStore for JsonLinesSink<W> {
    async fn store_media(&self, record: StoredMedia) -> Result<(), StoreError> {
        self.write_line(&SinkRecord::Media(&record))
    }

    async fn store_publisher(&self, record: StoredPublisher) -> Result<(), StoreError> {
        self.write_line(&SinkRecord::Publisher(&record))
    }
}
