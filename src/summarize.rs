//! Short document descriptions for OCR-derived uploads.
//!
//! OCR output is noisier than native text extraction, so image documents
//! get a one-shot summary attached to their chunks' metadata. A failed
//! summarization never blocks indexing; the summary is simply empty.

use crate::completion::CompletionProvider;
use crate::models::Message;

/// Input prefix submitted for summarization, in characters.
const SUMMARY_PREFIX_CHARS: usize = 1500;

/// Describe a document's content in a short summary.
///
/// Truncates the input to a bounded prefix before submission. Returns an
/// empty string on any capability failure, with a warning on stderr.
pub async fn summarize(provider: &dyn CompletionProvider, text: &str, filename: &str) -> String {
    let prefix = truncate_chars(text, SUMMARY_PREFIX_CHARS);
    let prompt = format!(
        "Describe the content of the following document named '{}'. \
         Give a short summary and possible categories:\n\n{}",
        filename, prefix
    );

    match provider.complete(&[Message::user(prompt)]).await {
        Ok(summary) => summary.trim().to_string(),
        Err(e) => {
            eprintln!("Warning: failed to describe document '{}': {}", filename, e);
            String::new()
        }
    }
}

/// Take the first `max_chars` characters, respecting UTF-8 boundaries.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
