//! Stream sync orchestration: fetch rows per stream, normalize each record,
//! and hand the results to the output sink.

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::client::AutopilotClient;
use crate::messages::{RecordSinkPort, TapMessage};
use crate::normalize::RecordNormalizer;
use crate::observability::metrics;

pub struct SyncRunner {
    client: AutopilotClient,
    normalizer: RecordNormalizer,
    sink: Box<dyn RecordSinkPort>,
    strict: bool,
}

impl SyncRunner {
    pub fn new(
        client: AutopilotClient,
        normalizer: RecordNormalizer,
        sink: Box<dyn RecordSinkPort>,
        strict: bool,
    ) -> Self {
        Self {
            client,
            normalizer,
            sink,
            strict,
        }
    }

    /// Sync the selected streams in catalog order.
    pub async fn sync(&self, selected: &[String]) -> Result<()> {
        // Surface typos before any work happens
        for stream in selected {
            self.normalizer.registry().get_schema(stream)?;
        }

        let streams: Vec<&str> = self
            .normalizer
            .registry()
            .stream_names()
            .into_iter()
            .filter(|name| selected.iter().any(|s| s.as_str() == *name))
            .collect();
        info!("Starting sync. Will sync these streams: {:?}", streams);

        for stream in streams {
            let span = tracing::info_span!("Syncing stream", stream = %stream);
            let _enter = span.enter();
            self.sync_stream(stream).await?;
        }

        info!("Sync completed");
        Ok(())
    }

    async fn sync_stream(&self, stream: &str) -> Result<()> {
        self.emit_schema(stream).await?;
        match stream {
            "contacts" => self.sync_contacts().await,
            "lists" => self.sync_lists().await,
            "lists_contacts" => self.sync_lists_contacts().await,
            "smart_segments" => self.sync_smart_segments().await,
            "smart_segments_contacts" => self.sync_smart_segment_contacts().await,
            other => bail!("no sync routine for stream '{}'", other),
        }
    }

    async fn emit_schema(&self, stream: &str) -> Result<()> {
        let schema = self.normalizer.registry().get_schema(stream)?;
        self.sink
            .write(&TapMessage::schema(schema))
            .await
            .context("writing SCHEMA message")
    }

    /// Normalize one raw row and emit it.
    ///
    /// Validation problems are logged and counted; in strict mode they fail
    /// the run instead of letting the record through.
    async fn emit_record(&self, stream: &str, raw: &Value) -> Result<()> {
        let (normalized, report) = self.normalizer.normalize(raw, stream)?;

        if !report.is_empty() {
            for problem in report.problems() {
                metrics::records::problem_logged(stream, problem.code.as_str());
                warn!(
                    stream = stream,
                    field = %problem.field,
                    code = %problem.code,
                    "validation problem in record"
                );
            }
            if self.strict {
                metrics::records::record_failed(stream);
                bail!(
                    "strict mode: record in stream '{}' failed validation ({} problem(s), first: {} on field '{}')",
                    stream,
                    report.problems().len(),
                    report.problems()[0].code,
                    report.problems()[0].field
                );
            }
        }

        self.sink.write(&TapMessage::record(normalized)).await?;
        metrics::records::record_emitted(stream);
        Ok(())
    }

    async fn sync_contacts(&self) -> Result<()> {
        let rows = self.client.fetch_rows("contacts", &[]).await?;
        for row in &rows {
            self.emit_record("contacts", row).await?;
        }
        info!("Completed Contacts Sync ({} records)", rows.len());
        Ok(())
    }

    async fn sync_lists(&self) -> Result<()> {
        let rows = self.client.fetch_rows("lists", &[]).await?;
        for row in &rows {
            self.emit_record("lists", row).await?;
        }
        info!("Completed Lists Sync ({} records)", rows.len());
        Ok(())
    }

    async fn sync_smart_segments(&self) -> Result<()> {
        let rows = self.client.fetch_rows("smart_segments", &[]).await?;
        for row in &rows {
            self.emit_record("smart_segments", row).await?;
        }
        info!("Completed Smart Segments Sync ({} records)", rows.len());
        Ok(())
    }

    /// Child stream: one row per (list, contact) membership pair.
    async fn sync_lists_contacts(&self) -> Result<()> {
        let lists = self.client.fetch_rows("lists", &[]).await?;
        let mut total = 0usize;
        for list in &lists {
            let Some(list_id) = list.get("list_id").and_then(Value::as_str) else {
                warn!("skipping list row without a list_id");
                continue;
            };
            let members = self
                .client
                .fetch_rows("lists_contacts", &[("list_id", list_id)])
                .await?;
            for member in &members {
                let row = json!({
                    "list_id": list_id,
                    "contact_id": member.get("contact_id").cloned().unwrap_or(Value::Null),
                });
                self.emit_record("lists_contacts", &row).await?;
            }
            total += members.len();
        }
        info!("Completed List Contacts Sync ({} records)", total);
        Ok(())
    }

    /// Child stream: one row per (segment, contact) membership pair.
    async fn sync_smart_segment_contacts(&self) -> Result<()> {
        let segments = self.client.fetch_rows("smart_segments", &[]).await?;
        let mut total = 0usize;
        for segment in &segments {
            let Some(segment_id) = segment.get("segment_id").and_then(Value::as_str) else {
                warn!("skipping segment row without a segment_id");
                continue;
            };
            let members = self
                .client
                .fetch_rows("smart_segments_contacts", &[("segment_id", segment_id)])
                .await?;
            for member in &members {
                let row = json!({
                    "segment_id": segment_id,
                    "contact_id": member.get("contact_id").cloned().unwrap_or(Value::Null),
                });
                self.emit_record("smart_segments_contacts", &row).await?;
            }
            total += members.len();
        }
        info!("Completed Smart Segments Contacts Sync ({} records)", total);
        Ok(())
    }
}
