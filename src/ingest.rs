//! Ingestion pipeline orchestration.
//!
//! Coordinates the full upload flow: extraction → summarization (OCR
//! documents only) → chunking → minimum-length filter → embedding → index
//! build. One file's failure degrades that file to empty text and never
//! aborts the batch.

use std::sync::Arc;

use anyhow::Result;

use crate::chunk::chunk_text;
use crate::completion::CompletionProvider;
use crate::config::Config;
use crate::embedding::EmbeddingProvider;
use crate::extract::extract;
use crate::index::VectorIndex;
use crate::models::{Chunk, Document, SourceFile};
use crate::ocr::OcrProvider;
use crate::summarize::summarize;

/// Counters and per-file warnings from one ingestion run.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub documents: Vec<Document>,
    pub chunks_indexed: usize,
    pub chunks_discarded: usize,
    pub warnings: Vec<String>,
}

/// Ingest a batch of uploaded files into a fresh [`VectorIndex`].
///
/// Returns the index plus a report of what happened per file. The only
/// fatal error is an embedding-capability failure: extraction and
/// summarization problems are isolated to their own document and recorded
/// as warnings.
pub async fn build_index(
    files: &[SourceFile],
    config: &Config,
    ocr: &dyn OcrProvider,
    embedder: Arc<dyn EmbeddingProvider>,
    completion: &dyn CompletionProvider,
) -> Result<(VectorIndex, IngestReport)> {
    let mut report = IngestReport::default();
    let mut retained: Vec<Chunk> = Vec::new();

    for file in files {
        let extracted = extract(&file.name, &file.bytes, ocr).await;
        if let Some(warning) = extracted.warning {
            report.warnings.push(warning);
        }

        let document = Document {
            id: file.name.clone(),
            raw_text: extracted.text,
            was_ocr: extracted.was_ocr,
        };

        // OCR text is noisy; attach a document-level description to its
        // chunks. Absence of a summary never blocks indexing.
        let summary = if document.was_ocr && !document.raw_text.trim().is_empty() {
            summarize(completion, &document.raw_text, &document.id).await
        } else {
            String::new()
        };

        let pieces = chunk_text(
            &document.raw_text,
            config.chunking.chunk_size,
            config.chunking.chunk_overlap,
        );

        // Indices are assigned before the length filter, so they reflect
        // original document order even when short fragments are dropped.
        for (i, text) in pieces.into_iter().enumerate() {
            if text.trim().chars().count() < config.chunking.min_chunk_length {
                report.chunks_discarded += 1;
                continue;
            }
            retained.push(Chunk {
                text,
                source: document.id.clone(),
                chunk_index: i as i64,
                summary: summary.clone(),
            });
        }

        report.documents.push(document);
    }

    report.chunks_indexed = retained.len();
    let index = VectorIndex::build(retained, embedder, config.embedding.batch_size).await?;

    Ok((index, report))
}
