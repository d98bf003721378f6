//! # docchat
//!
//! Chat with your documents: a retrieval-grounded question-answering
//! pipeline for PDF, DOCX, and image (OCR) uploads.
//!
//! Uploaded files are extracted to plain text, split into overlapping
//! chunks, embedded into an in-memory vector index, and questions are
//! answered by a language model conditioned on the most similar chunks
//! plus the prior conversation. When nothing relevant is indexed, the
//! answer is an explicit decline rather than a fabrication.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────────┐   ┌─────────────┐
//! │  Uploads  │──▶│     Pipeline     │──▶│ VectorIndex │
//! │ PDF/DOCX/ │   │ Extract + Chunk  │   │  (in-mem)   │
//! │  images   │   │ + Embed          │   └──────┬──────┘
//! └───────────┘   └──────────────────┘          │
//!                                               ▼
//!                 ┌──────────────────┐   ┌─────────────┐
//!                 │   Conversation   │◀─▶│  Turn loop  │
//!                 │     (Session)    │   │ retrieve →  │
//!                 └──────────────────┘   │ compose →   │
//!                                        │ complete    │
//!                                        └─────────────┘
//! ```
//!
//! All state is process-memory-only: nothing persists across restarts,
//! and both index and conversation reset when the document set changes.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`extract`] | PDF/DOCX/image text extraction |
//! | [`ocr`] | OCR capability (OCR.space client) |
//! | [`chunk`] | Sliding-window text chunking |
//! | [`summarize`] | OCR-document descriptions |
//! | [`embedding`] | Embedding capability (OpenAI, Ollama) |
//! | [`completion`] | Chat completion capability (OpenAI, Ollama) |
//! | [`index`] | In-memory vector similarity index |
//! | [`ingest`] | Upload batch ingestion pipeline |
//! | [`session`] | Conversation state and index ownership |
//! | [`chat`] | Turn orchestration and grounding fallback |

pub mod chat;
pub mod chunk;
pub mod completion;
pub mod config;
pub mod embedding;
pub mod extract;
pub mod index;
pub mod ingest;
pub mod models;
pub mod ocr;
pub mod session;
pub mod summarize;
