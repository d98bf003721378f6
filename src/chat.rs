//! Turn orchestration: retrieve → compose → complete → append.
//!
//! One turn fully processes a user question before the next is accepted.
//! The grounding contract is enforced here: when no documents are loaded
//! or retrieval finds nothing relevant, the answer is the fixed
//! [`FALLBACK_ANSWER`] and the completion capability is never invoked.
//! A capability failure aborts the turn without appending any partial
//! message, leaving the session usable for the next question.

use anyhow::{Context, Result};

use crate::completion::CompletionProvider;
use crate::models::{Chunk, Message};
use crate::session::Session;

/// Answer used whenever no supporting document context exists.
pub const FALLBACK_ANSWER: &str =
    "I don't know. I couldn't find anything relevant in the uploaded documents.";

/// Build the augmented message sequence for one turn.
///
/// Shape: system message, then a user message carrying the retrieved
/// document context, then the full prior conversation, then the new
/// question. Chunk texts are joined in ranked order with blank lines; no
/// deduplication or token budgeting is applied beyond the retrieval `k`.
pub fn assemble_messages(history: &[Message], chunks: &[Chunk], question: &str) -> Vec<Message> {
    let context = chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut messages = Vec::with_capacity(history.len() + 2);
    if let Some(system) = history.first() {
        messages.push(system.clone());
    }
    messages.push(Message::user(format!(
        "Document context:\n{}\n\nNow I'll share our conversation:",
        context
    )));
    messages.extend(history.iter().skip(1).cloned());
    messages.push(Message::user(question));
    messages
}

/// Run one question/answer turn against the session's index.
///
/// Returns the assistant answer, which has also been appended to the
/// conversation together with the question. Errors from the retrieval or
/// completion capabilities propagate with nothing appended.
pub async fn run_turn(
    session: &mut Session,
    question: &str,
    completion: &dyn CompletionProvider,
    k: usize,
) -> Result<String> {
    let index = match session.index() {
        Some(index) => index,
        None => {
            session.push_turn(question, FALLBACK_ANSWER);
            return Ok(FALLBACK_ANSWER.to_string());
        }
    };

    let retrieved = index
        .search(question, k)
        .await
        .context("Retrieval failed")?;

    if retrieved.is_empty() {
        session.push_turn(question, FALLBACK_ANSWER);
        return Ok(FALLBACK_ANSWER.to_string());
    }

    let messages = assemble_messages(session.messages(), &retrieved, question);
    let answer = completion
        .complete(&messages)
        .await
        .context("Completion failed")?;

    session.push_turn(question, &answer);
    Ok(answer)
}
