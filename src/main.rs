//! # docchat CLI
//!
//! Command-line interface for chatting with uploaded documents.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docchat chat --files <paths>...` | Index the files, then answer questions interactively |
//! | `docchat ask <question> --files <paths>...` | One-shot: index, ask, print the answer |
//! | `docchat extract --files <paths>...` | Preview extracted text and chunk counts |
//!
//! ## Examples
//!
//! ```bash
//! # Interactive session over two documents
//! docchat chat --files report.pdf notes.docx
//!
//! # One question, one answer
//! docchat ask "What is the project deadline?" --files report.pdf
//!
//! # See what would be indexed, without any API calls beyond OCR
//! docchat extract --files scan.png
//! ```
//!
//! Credentials come from the environment: `OPENAI_API_KEY` for embeddings
//! and completions, `OCR_SPACE_API_KEY` for image uploads. Missing
//! credentials fail at startup.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use docchat::chat::run_turn;
use docchat::chunk::chunk_text;
use docchat::completion::{self, CompletionProvider};
use docchat::config::{self, Config};
use docchat::embedding::{self, EmbeddingProvider};
use docchat::extract::extract;
use docchat::ingest::build_index;
use docchat::models::SourceFile;
use docchat::ocr::OcrSpaceClient;
use docchat::session::Session;

/// docchat — chat with your documents.
///
/// Upload PDFs, Word documents, or images (OCR) and ask questions about
/// their content. Files and chats are held in memory only and discarded
/// on exit.
#[derive(Parser)]
#[command(
    name = "docchat",
    about = "Chat with your documents — PDF, DOCX, and image (OCR) question answering",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// A missing file at the default path falls back to built-in defaults.
    #[arg(long, global = true, default_value = "./docchat.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index the given files, then answer questions interactively.
    ///
    /// Reads questions line by line from stdin. Questions are answered
    /// from retrieved document context plus the running conversation;
    /// when nothing relevant is found the assistant declines explicitly.
    Chat {
        /// Files to load (PDF, DOCX, PNG, JPG/JPEG).
        #[arg(long, num_args = 1.., required = true)]
        files: Vec<PathBuf>,
    },

    /// Ask a single question about the given files and print the answer.
    Ask {
        /// The question to ask.
        question: String,

        /// Files to load (PDF, DOCX, PNG, JPG/JPEG).
        #[arg(long, num_args = 1.., required = true)]
        files: Vec<PathBuf>,
    },

    /// Preview extraction: text, OCR flags, and chunk counts per file.
    ///
    /// Calls no embedding or completion capability; images still go
    /// through OCR.
    Extract {
        /// Files to preview (PDF, DOCX, PNG, JPG/JPEG).
        #[arg(long, num_args = 1.., required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Chat { files } => run_chat(&config, &files).await,
        Commands::Ask { question, files } => run_ask(&config, &question, &files).await,
        Commands::Extract { files } => run_extract(&config, &files).await,
    }
}

fn load_config(path: &PathBuf) -> Result<Config> {
    if path.exists() {
        config::load_config(path)
    } else {
        let config = Config::default();
        config::validate(&config)?;
        Ok(config)
    }
}

/// Read the upload batch from disk. An unreadable path degrades to a
/// warning so the rest of the batch still loads.
fn read_files(paths: &[PathBuf]) -> Vec<SourceFile> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        match std::fs::read(path) {
            Ok(bytes) => files.push(SourceFile {
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string()),
                bytes,
            }),
            Err(e) => eprintln!("Warning: could not read {}: {}", path.display(), e),
        }
    }
    files
}

struct Providers {
    ocr: OcrSpaceClient,
    embedder: Arc<dyn EmbeddingProvider>,
    completion: Box<dyn CompletionProvider>,
}

/// Build all capability providers. Missing credentials fail here, before
/// any document is touched.
fn create_providers(config: &Config) -> Result<Providers> {
    Ok(Providers {
        ocr: OcrSpaceClient::new(&config.ocr)?,
        embedder: Arc::from(embedding::create_provider(&config.embedding)?),
        completion: completion::create_provider(&config.completion)?,
    })
}

async fn load_session(
    config: &Config,
    paths: &[PathBuf],
    providers: &Providers,
) -> Result<Session> {
    let files = read_files(paths);
    let names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();

    let mut session = Session::new(&config.chat.system_prompt, config.chat.max_turns);
    let (index, report) = build_index(
        &files,
        config,
        &providers.ocr,
        Arc::clone(&providers.embedder),
        providers.completion.as_ref(),
    )
    .await
    .context("Indexing failed")?;

    for warning in &report.warnings {
        eprintln!("Warning: {}", warning);
    }
    println!("loaded {} file(s)", report.documents.len());
    println!("  chunks indexed: {}", report.chunks_indexed);
    if report.chunks_discarded > 0 {
        println!("  chunks discarded (too short): {}", report.chunks_discarded);
    }

    session.install_index(&names, index);
    Ok(session)
}

async fn run_chat(config: &Config, paths: &[PathBuf]) -> Result<()> {
    let providers = create_providers(config)?;
    let mut session = load_session(config, paths, &providers).await?;

    let interactive = atty::is(atty::Stream::Stdin);
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        if interactive {
            print!("> ");
            std::io::stdout().flush()?;
        }
        let question = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        let question = question.trim();
        if question.is_empty() {
            continue;
        }

        match run_turn(
            &mut session,
            question,
            providers.completion.as_ref(),
            config.retrieval.k,
        )
        .await
        {
            Ok(answer) => println!("{}", answer),
            // Recoverable: the turn failed, the session did not.
            Err(e) => eprintln!("Error: {:#}", e),
        }
    }

    Ok(())
}

async fn run_ask(config: &Config, question: &str, paths: &[PathBuf]) -> Result<()> {
    let providers = create_providers(config)?;
    let mut session = load_session(config, paths, &providers).await?;

    let answer = run_turn(
        &mut session,
        question,
        providers.completion.as_ref(),
        config.retrieval.k,
    )
    .await?;
    println!("{}", answer);
    Ok(())
}

async fn run_extract(config: &Config, paths: &[PathBuf]) -> Result<()> {
    let ocr = OcrSpaceClient::new(&config.ocr)?;
    let files = read_files(paths);

    for file in &files {
        let extracted = extract(&file.name, &file.bytes, &ocr).await;
        let pieces = chunk_text(
            &extracted.text,
            config.chunking.chunk_size,
            config.chunking.chunk_overlap,
        );
        let retained = pieces
            .iter()
            .filter(|t| t.trim().chars().count() >= config.chunking.min_chunk_length)
            .count();

        println!("{}", file.name);
        println!("  ocr: {}", extracted.was_ocr);
        println!("  characters: {}", extracted.text.chars().count());
        println!("  chunks: {} ({} indexable)", pieces.len(), retained);
        if let Some(warning) = &extracted.warning {
            println!("  warning: {}", warning);
        } else if extracted.text.trim().is_empty() {
            println!("  (no text extracted)");
        }
    }

    Ok(())
}
