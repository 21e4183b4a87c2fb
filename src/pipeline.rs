//! Drives every pending record through claim → fetch → transform → parse →
//! persist → finalize.
//!
//! One record's failure is contained at the record boundary: it is logged,
//! the record is marked `error`, and the run moves on. Only a failure to
//! obtain the initial backlog snapshot aborts the run.

use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::fetcher::{FetchError, ImageSource};
use crate::gemini::{ContentGenerator, GeminiError, GenerateContentRequest};
use crate::parser::{ParseError, parse_items};
use crate::record::{RecordStatus, SourceRecord};
use crate::store::{RecordStore, StoreError};

const IMAGE_MIME_TYPE: &str = "image/jpeg";

/// The fixed instruction payload sent with every image. It pins the output
/// contract: a bare JSON array, one object per size/price variant, explicit
/// null for unknown ages.
const EXTRACTION_PROMPT: &str = r#"Extract the menu from this image and return it in valid JSON format only.
Do not use markdown or explanations.

Each item should have the following fields:
- category
- name
- age (if not available, return null)
- size (e.g., "glass", "bottle", "180ml", "500ml", "small", "full", etc.)
- Price (as a number)

If an item is available in multiple sizes (like glass, bottle, ml, or other variants), create separate objects for each with the corresponding size and price.

Return the result as an array of JSON objects like this:
[
  {
    "category": "IMPORTED REDS",
    "name": "AG 47 MALBEC SHIRAZ",
    "age": null,
    "size": "glass",
    "Price": 635
  },
  {
    "category": "BEER",
    "name": "Kingfisher",
    "age": null,
    "size": "500ml",
    "Price": 195
  }
]
"#;

/// A contained per-record failure, tagged with the stage that produced it.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("transform failed: {0}")]
    Transform(#[from] GeminiError),

    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),

    #[error("persist failed: {0}")]
    Persist(#[from] StoreError),
}

impl StageError {
    fn stage(&self) -> &'static str {
        match self {
            StageError::Fetch(_) => "fetch",
            StageError::Transform(_) => "transform",
            StageError::Parse(_) => "parse",
            StageError::Persist(_) => "persist",
        }
    }
}

/// One contained failure, kept for the run summary.
#[derive(Debug, Clone, Serialize)]
pub struct RecordFailure {
    pub record_id: String,
    pub stage: String,
    pub message: String,
}

/// Outcome of a full backlog run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Records drawn from the pending snapshot.
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Records lost to another claimant between snapshot and claim.
    pub skipped: usize,
    /// Menu items persisted across all successful records.
    pub items: usize,
    pub started_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub failures: Vec<RecordFailure>,
}

/// Orchestrates the extraction run over the pending backlog.
///
/// Dependencies are passed in once at construction (no ambient connection
/// state), so any of them can be swapped for a fake in tests.
pub struct MenuPipeline<S, F, G> {
    store: S,
    images: F,
    generator: G,
    max_output_tokens: Option<u32>,
}

impl<S, F, G> MenuPipeline<S, F, G>
where
    S: RecordStore,
    F: ImageSource,
    G: ContentGenerator,
{
    pub fn new(store: S, images: F, generator: G, max_output_tokens: Option<u32>) -> Self {
        Self {
            store,
            images,
            generator,
            max_output_tokens,
        }
    }

    /// Process every record that was pending when the run started.
    ///
    /// The snapshot is taken once; records becoming pending mid-run wait
    /// for the next run. Per-record failures never abort the loop — only a
    /// failed snapshot does.
    pub async fn process_backlog(&self) -> Result<RunSummary> {
        let started_at = Utc::now();
        let backlog = self
            .store
            .list_by_status(RecordStatus::Pending)
            .await
            .context("failed to list pending records")?;

        let mut summary = RunSummary {
            processed: 0,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            items: 0,
            started_at,
            duration_ms: 0,
            failures: Vec::new(),
        };

        for record in &backlog {
            summary.processed += 1;

            // Claim before any work so a crash leaves visible evidence.
            match self.store.claim(&record.id).await {
                Ok(true) => {}
                Ok(false) => {
                    // Another pass got there first; not a failure.
                    summary.skipped += 1;
                    log_skip(&record.id);
                    continue;
                }
                Err(e) => {
                    // Claim write rejected: record is left as-is.
                    summary.failed += 1;
                    summary.failures.push(RecordFailure {
                        record_id: record.id.clone(),
                        stage: "claim".into(),
                        message: e.to_string(),
                    });
                    log_failure(&record.id, "claim", &e.to_string());
                    continue;
                }
            }

            match self.process_record(record).await {
                Ok(count) => match self.store.update_status(&record.id, RecordStatus::Done).await
                {
                    Ok(()) => {
                        summary.succeeded += 1;
                        summary.items += count;
                        log_done(&record.id, count);
                    }
                    Err(e) => {
                        summary.failed += 1;
                        summary.failures.push(RecordFailure {
                            record_id: record.id.clone(),
                            stage: "finalize".into(),
                            message: e.to_string(),
                        });
                        log_failure(&record.id, "finalize", &e.to_string());
                    }
                },
                Err(stage_err) => {
                    summary.failed += 1;
                    summary.failures.push(RecordFailure {
                        record_id: record.id.clone(),
                        stage: stage_err.stage().into(),
                        message: stage_err.to_string(),
                    });
                    log_failure(&record.id, stage_err.stage(), &stage_err.to_string());

                    // The record must not rest in `working`. If even this
                    // write fails, the record stays visible as stuck and
                    // operator reset is the recovery path.
                    if let Err(e) = self.store.update_status(&record.id, RecordStatus::Error).await
                    {
                        log_failure(&record.id, "finalize", &e.to_string());
                    }
                }
            }
        }

        summary.duration_ms = (Utc::now() - started_at).num_milliseconds();
        Ok(summary)
    }

    /// Fetch, transform, parse, enrich, and persist one claimed record.
    /// Returns the number of items persisted.
    async fn process_record(&self, record: &SourceRecord) -> Result<usize, StageError> {
        let bytes = self.images.fetch(&record.id).await?;
        let encoded = STANDARD.encode(&bytes);

        let req = GenerateContentRequest::for_image(
            IMAGE_MIME_TYPE,
            encoded,
            EXTRACTION_PROMPT,
            self.max_output_tokens,
        );
        let response = self.generator.generate(&req).await?;
        let text = response
            .first_text()
            .ok_or(GeminiError::EmptyResponse)
            .map_err(StageError::Transform)?;

        let mut items = parse_items(text)?;
        for item in &mut items {
            item.attach_source(&record.payload);
        }

        self.store
            .insert_items(&items)
            .await
            .map_err(StageError::Persist)?;
        Ok(items.len())
    }
}

fn log_done(id: &str, items: usize) {
    eprintln!("  ✓ {id}: done ({items} items)");
}

fn log_skip(id: &str) {
    eprintln!("  - {id}: no longer pending, skipped");
}

fn log_failure(id: &str, stage: &str, message: &str) {
    eprintln!("  ✗ {id}: {stage} failure: {message}");
}
