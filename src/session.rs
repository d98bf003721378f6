//! Per-session conversation state and index ownership.
//!
//! A [`Session`] owns one conversation (an append-only message log that
//! always starts with a single system message) and zero-or-one active
//! [`VectorIndex`]. Both are process-memory-only and reset together
//! whenever the uploaded document set changes.
//!
//! Change detection compares the new file-name set against the previously
//! loaded one. Content is deliberately not hashed: re-uploading files with
//! the same names but different content reuses the existing index. That
//! matches the original product behavior and is covered by a test.
//!
//! The index reference is an `Arc` swapped in a single assignment after
//! the replacement index is fully built, so a turn in flight keeps reading
//! a complete index even when rebuild I/O interleaves with user input.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::index::VectorIndex;
use crate::models::{Message, Role};

pub struct Session {
    messages: Vec<Message>,
    loaded_files: BTreeSet<String>,
    index: Option<Arc<VectorIndex>>,
    system_prompt: String,
    /// Maximum retained question/answer turns; 0 keeps everything.
    max_turns: usize,
}

impl Session {
    pub fn new(system_prompt: &str, max_turns: usize) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
            loaded_files: BTreeSet::new(),
            index: None,
            system_prompt: system_prompt.to_string(),
            max_turns,
        }
    }

    /// Whether `names` differs from the currently loaded file-name set.
    ///
    /// Order-insensitive; duplicates collapse. Same names with different
    /// content compare equal (documented limitation, not a bug).
    pub fn needs_reload(&self, names: &[String]) -> bool {
        let incoming: BTreeSet<String> = names.iter().cloned().collect();
        incoming != self.loaded_files
    }

    /// Install a freshly built index for a new document set.
    ///
    /// Resets the conversation to just the system message: answers
    /// grounded in the old documents would be misleading context for
    /// questions about the new ones.
    pub fn install_index(&mut self, names: &[String], index: VectorIndex) {
        self.loaded_files = names.iter().cloned().collect();
        self.index = Some(Arc::new(index));
        self.messages = vec![Message::system(&self.system_prompt)];
    }

    /// The active index, if any documents are loaded.
    pub fn index(&self) -> Option<Arc<VectorIndex>> {
        self.index.clone()
    }

    /// Full ordered conversation, system message first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Append one completed question/answer turn.
    pub fn push_turn(&mut self, question: &str, answer: &str) {
        self.messages.push(Message::user(question));
        self.messages.push(Message::assistant(answer));
        self.trim_history();
    }

    /// Drop the oldest user/assistant pairs past the `max_turns` cap,
    /// always keeping the system message.
    fn trim_history(&mut self) {
        if self.max_turns == 0 {
            return;
        }
        let max_len = 1 + self.max_turns * 2;
        while self.messages.len() > max_len {
            // Remove the oldest non-system pair.
            self.messages.remove(1);
            self.messages.remove(1);
        }
    }

    pub fn loaded_files(&self) -> &BTreeSet<String> {
        &self.loaded_files
    }
}
