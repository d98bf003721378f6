//! Fixed-size sliding-window text chunker.
//!
//! Splits extracted document text into windows of `chunk_size` characters
//! with `overlap` characters repeated between consecutive windows, so that
//! content near a boundary stays retrievable from both sides. Windows are
//! measured in characters, never bytes, so multi-byte text is split safely.
//!
//! The split is deterministic: the same input always yields the same
//! sequence. Empty input yields an empty sequence.

/// Split text into overlapping fixed-size character windows.
///
/// `overlap` must be smaller than `chunk_size` (enforced at config load);
/// values that would stall the window are clamped to a step of one.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if text.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let step = chunk_size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}
