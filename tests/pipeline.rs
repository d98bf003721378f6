//! End-to-end pipeline tests over fake capability providers.
//!
//! Real DOCX bytes go in one end; answers come out the other. The
//! embedding fake is a deterministic bag-of-words hasher, so retrieval
//! ranks by word overlap and no network is involved.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;

use docchat::chat::{run_turn, FALLBACK_ANSWER};
use docchat::completion::CompletionProvider;
use docchat::config::Config;
use docchat::embedding::EmbeddingProvider;
use docchat::ingest::build_index;
use docchat::models::{Message, Role, SourceFile};
use docchat::ocr::OcrProvider;
use docchat::session::Session;

const DIMS: usize = 32;

/// Deterministic text embedder: each word hashes into one of [`DIMS`]
/// buckets, so texts sharing words get positive cosine similarity.
struct HashedEmbedder {
    calls: AtomicUsize,
}

impl HashedEmbedder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

fn bucket(word: &str) -> usize {
    let mut h: u64 = 0xcbf29ce484222325;
    for b in word.bytes() {
        h ^= b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    (h % DIMS as u64) as usize
}

#[async_trait]
impl EmbeddingProvider for HashedEmbedder {
    fn model_name(&self) -> &str {
        "hashed-bow"
    }

    fn dims(&self) -> usize {
        DIMS
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0f32; DIMS];
                for word in text.to_lowercase().split_whitespace() {
                    let word: String = word.chars().filter(|c| c.is_alphanumeric()).collect();
                    if !word.is_empty() {
                        v[bucket(&word)] += 1.0;
                    }
                }
                v
            })
            .collect())
    }
}

/// Completion fake returning a canned answer; records every call.
struct CannedCompletion {
    answer: String,
    calls: AtomicUsize,
    last_messages: Mutex<Vec<Message>>,
}

impl CannedCompletion {
    fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            calls: AtomicUsize::new(0),
            last_messages: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for CannedCompletion {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_messages.lock().unwrap() = messages.to_vec();
        Ok(self.answer.clone())
    }
}

struct ScriptedOcr {
    text: String,
}

#[async_trait]
impl OcrProvider for ScriptedOcr {
    async fn recognize(&self, _filename: &str, _bytes: &[u8]) -> Result<String> {
        Ok(self.text.clone())
    }
}

struct FailingOcr;

#[async_trait]
impl OcrProvider for FailingOcr {
    async fn recognize(&self, _filename: &str, _bytes: &[u8]) -> Result<String> {
        bail!("OCR request failed with status 500")
    }
}

fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
    use std::io::Write;
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
        body
    );
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}

fn test_config() -> Config {
    Config::default()
}

const FRANCE: &str =
    "The capital of France is Paris, a city on the Seine famous for its museums and cafes.";
const COOKING: &str =
    "Bring a large pot of salted water to a rolling boil before adding the dried pasta.";

#[tokio::test]
async fn docx_question_is_answered_from_retrieved_context() {
    let config = test_config();
    let embedder = Arc::new(HashedEmbedder::new());
    let completion = CannedCompletion::new("Paris is the capital of France.");
    let ocr = ScriptedOcr {
        text: String::new(),
    };

    let files = vec![
        SourceFile {
            name: "geography.docx".to_string(),
            bytes: docx_with_paragraphs(&[FRANCE]),
        },
        SourceFile {
            name: "cooking.docx".to_string(),
            bytes: docx_with_paragraphs(&[COOKING]),
        },
    ];

    let (index, report) = build_index(
        &files,
        &config,
        &ocr,
        Arc::clone(&embedder) as Arc<dyn EmbeddingProvider>,
        &completion,
    )
    .await
    .unwrap();
    assert!(report.warnings.is_empty());
    assert_eq!(report.chunks_indexed, 2);

    let mut session = Session::new("You are a helpful assistant.", 0);
    session.install_index(
        &["geography.docx".to_string(), "cooking.docx".to_string()],
        index,
    );

    let answer = run_turn(
        &mut session,
        "What is the capital of France?",
        &completion,
        config.retrieval.k,
    )
    .await
    .unwrap();

    assert_eq!(answer, "Paris is the capital of France.");
    assert_eq!(completion.call_count(), 1);

    // The completion saw the retrieved document text, ranked first.
    let seen = completion.last_messages.lock().unwrap();
    assert_eq!(seen[0].role, Role::System);
    assert!(seen[1].content.starts_with("Document context:\n"));
    let france_pos = seen[1].content.find("Paris").unwrap();
    if let Some(cooking_pos) = seen[1].content.find("pasta") {
        assert!(france_pos < cooking_pos, "best match should come first");
    }
    assert_eq!(seen.last().unwrap().content, "What is the capital of France?");

    // Question and answer were appended to the conversation.
    assert_eq!(session.messages().len(), 3);
    assert_eq!(session.messages()[2].content, "Paris is the capital of France.");
}

#[tokio::test]
async fn no_documents_falls_back_without_calling_completion() {
    let completion = CannedCompletion::new("should never be used");
    let mut session = Session::new("You are a helpful assistant.", 0);

    let answer = run_turn(&mut session, "What is in the report?", &completion, 5)
        .await
        .unwrap();

    assert_eq!(answer, FALLBACK_ANSWER);
    assert_eq!(completion.call_count(), 0);
    assert_eq!(session.messages().len(), 3);
    assert_eq!(session.messages()[2].content, FALLBACK_ANSWER);
}

#[tokio::test]
async fn empty_index_falls_back_without_embedding_the_query() {
    let config = test_config();
    let embedder = Arc::new(HashedEmbedder::new());
    let completion = CannedCompletion::new("should never be used");
    let ocr = ScriptedOcr {
        text: String::new(),
    };

    // One file whose only chunk is too short to index.
    let files = vec![SourceFile {
        name: "tiny.docx".to_string(),
        bytes: docx_with_paragraphs(&["Hi."]),
    }];
    let (index, report) = build_index(
        &files,
        &config,
        &ocr,
        Arc::clone(&embedder) as Arc<dyn EmbeddingProvider>,
        &completion,
    )
    .await
    .unwrap();
    assert_eq!(report.chunks_indexed, 0);
    assert_eq!(report.chunks_discarded, 1);
    let embeds_after_build = embedder.calls.load(Ordering::SeqCst);

    let mut session = Session::new("You are a helpful assistant.", 0);
    session.install_index(&["tiny.docx".to_string()], index);

    let answer = run_turn(&mut session, "Anything?", &completion, config.retrieval.k)
        .await
        .unwrap();

    assert_eq!(answer, FALLBACK_ANSWER);
    assert_eq!(completion.call_count(), 0);
    assert_eq!(embedder.calls.load(Ordering::SeqCst), embeds_after_build);
}

#[tokio::test]
async fn unchanged_name_set_keeps_session() {
    let config = test_config();
    let embedder = Arc::new(HashedEmbedder::new());
    let completion = CannedCompletion::new("An answer.");
    let ocr = ScriptedOcr {
        text: String::new(),
    };

    let files = vec![SourceFile {
        name: "geography.docx".to_string(),
        bytes: docx_with_paragraphs(&[FRANCE]),
    }];
    let (index, _) = build_index(
        &files,
        &config,
        &ocr,
        Arc::clone(&embedder) as Arc<dyn EmbeddingProvider>,
        &completion,
    )
    .await
    .unwrap();

    let mut session = Session::new("You are a helpful assistant.", 0);
    session.install_index(&["geography.docx".to_string()], index);
    run_turn(&mut session, "Where is Paris?", &completion, config.retrieval.k)
        .await
        .unwrap();
    assert_eq!(session.messages().len(), 3);

    // Same name set again, even with different content behind it: no reload,
    // history intact. Detection is by name only.
    assert!(!session.needs_reload(&["geography.docx".to_string()]));
    assert_eq!(session.messages().len(), 3);

    // A changed set does require a rebuild.
    assert!(session.needs_reload(&[
        "geography.docx".to_string(),
        "cooking.docx".to_string()
    ]));
}

#[tokio::test]
async fn ocr_failure_degrades_one_file_not_the_batch() {
    let config = test_config();
    let embedder = Arc::new(HashedEmbedder::new());
    let completion = CannedCompletion::new("unused");
    let ocr = FailingOcr;

    let files = vec![
        SourceFile {
            name: "scan.png".to_string(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        },
        SourceFile {
            name: "geography.docx".to_string(),
            bytes: docx_with_paragraphs(&[FRANCE]),
        },
    ];

    let (index, report) = build_index(
        &files,
        &config,
        &ocr,
        Arc::clone(&embedder) as Arc<dyn EmbeddingProvider>,
        &completion,
    )
    .await
    .unwrap();

    assert_eq!(report.documents.len(), 2);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("scan.png"));

    let scan = report
        .documents
        .iter()
        .find(|d| d.id == "scan.png")
        .unwrap();
    assert_eq!(scan.raw_text, "");
    assert!(scan.was_ocr);

    // Only the DOCX contributed an indexable chunk.
    assert_eq!(index.len(), 1);
    assert_eq!(completion.call_count(), 0);
}

#[tokio::test]
async fn ocr_document_chunks_carry_a_summary() {
    let config = test_config();
    let embedder = Arc::new(HashedEmbedder::new());
    let completion = CannedCompletion::new("Summary: a scanned utility invoice.");
    let ocr = ScriptedOcr {
        text: "Invoice 2024-117 electricity total due 84.50 euros payable by end of month."
            .to_string(),
    };

    let files = vec![
        SourceFile {
            name: "invoice.png".to_string(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        },
        SourceFile {
            name: "geography.docx".to_string(),
            bytes: docx_with_paragraphs(&[FRANCE]),
        },
    ];

    let (index, report) = build_index(
        &files,
        &config,
        &ocr,
        Arc::clone(&embedder) as Arc<dyn EmbeddingProvider>,
        &completion,
    )
    .await
    .unwrap();

    // Exactly one summarization call, for the OCR document only.
    assert_eq!(completion.call_count(), 1);
    assert!(report.warnings.is_empty());

    let hits = index.search("invoice electricity total", 1).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].source, "invoice.png");
    assert_eq!(hits[0].summary, "Summary: a scanned utility invoice.");

    let hits = index.search("capital France Paris museums", 1).await.unwrap();
    assert_eq!(hits[0].source, "geography.docx");
    assert_eq!(hits[0].summary, "");
}

#[tokio::test]
async fn conversation_grows_two_messages_per_turn() {
    let config = test_config();
    let embedder = Arc::new(HashedEmbedder::new());
    let completion = CannedCompletion::new("An answer.");
    let ocr = ScriptedOcr {
        text: String::new(),
    };

    let files = vec![SourceFile {
        name: "geography.docx".to_string(),
        bytes: docx_with_paragraphs(&[FRANCE]),
    }];
    let (index, _) = build_index(
        &files,
        &config,
        &ocr,
        Arc::clone(&embedder) as Arc<dyn EmbeddingProvider>,
        &completion,
    )
    .await
    .unwrap();

    let mut session = Session::new("You are a helpful assistant.", 0);
    session.install_index(&["geography.docx".to_string()], index);

    for n in 1..=3 {
        run_turn(&mut session, "Where is Paris?", &completion, config.retrieval.k)
            .await
            .unwrap();
        assert_eq!(session.messages().len(), 1 + 2 * n);
    }

    let messages = session.messages();
    assert_eq!(messages[0].role, Role::System);
    for pair in messages[1..].chunks(2) {
        assert_eq!(pair[0].role, Role::User);
        assert_eq!(pair[1].role, Role::Assistant);
    }
}
