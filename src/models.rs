//! Core data models used throughout docchat.
//!
//! These types represent the documents, chunks, and conversation messages
//! that flow through the ingestion and question-answering pipeline.

/// An uploaded file's extracted text, keyed by filename.
///
/// Created once per file at ingestion and immutable afterwards; the whole
/// set is discarded when the uploaded document set changes.
#[derive(Debug, Clone)]
pub struct Document {
    /// Filename of the uploaded file, used as the document identifier.
    pub id: String,
    pub raw_text: String,
    /// True when the text came from the OCR path (image upload).
    pub was_ocr: bool,
}

/// A bounded fragment of a document's text, the unit of retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    /// Source document id (filename).
    pub source: String,
    /// Position of this fragment in the source document's chunk sequence,
    /// starting at 0. Assigned before the minimum-length filter, so indices
    /// in the index may have gaps but always increase per document.
    pub chunk_index: i64,
    /// Short description of the source document when it was OCR-derived,
    /// empty otherwise.
    pub summary: String,
}

/// Message role in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Wire name used by chat completion APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single conversation message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A raw uploaded file before extraction.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}
