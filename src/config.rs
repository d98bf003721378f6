use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Default system prompt, describing assistant behavior for every session.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. Answer questions based on \
     the user's uploaded files and previous conversation.";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_min_chunk_length")]
    pub min_chunk_length: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            min_chunk_length: default_min_chunk_length(),
        }
    }
}

fn default_chunk_size() -> usize {
    500
}
fn default_chunk_overlap() -> usize {
    50
}
fn default_min_chunk_length() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Number of chunks retrieved per question.
    #[serde(default = "default_k")]
    pub k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { k: default_k() }
    }
}

fn default_k() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Maximum retained question/answer turns; 0 keeps the full history.
    #[serde(default)]
    pub max_turns: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            max_turns: 0,
        }
    }
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_dims")]
    pub dims: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
    /// Base URL override (required for self-hosted backends like Ollama).
    #[serde(default)]
    pub url: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dims: default_embedding_dims(),
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_embedding_timeout_secs(),
            url: None,
        }
    }
}

fn default_embedding_provider() -> String {
    "openai".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_embedding_dims() -> usize {
    1536
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_embedding_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    #[serde(default = "default_completion_provider")]
    pub provider: String,
    #[serde(default = "default_completion_model")]
    pub model: String,
    #[serde(default = "default_completion_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_completion_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub url: Option<String>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: default_completion_provider(),
            model: default_completion_model(),
            max_retries: default_completion_max_retries(),
            timeout_secs: default_completion_timeout_secs(),
            url: None,
        }
    }
}

fn default_completion_provider() -> String {
    "openai".to_string()
}
fn default_completion_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_completion_max_retries() -> u32 {
    2
}
fn default_completion_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct OcrConfig {
    #[serde(default = "default_ocr_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_ocr_language")]
    pub language: String,
    #[serde(default = "default_ocr_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: default_ocr_endpoint(),
            language: default_ocr_language(),
            timeout_secs: default_ocr_timeout_secs(),
        }
    }
}

fn default_ocr_endpoint() -> String {
    "https://api.ocr.space/parse/image".to_string()
}
fn default_ocr_language() -> String {
    "eng".to_string()
}
fn default_ocr_timeout_secs() -> u64 {
    60
}

/// Load and validate a TOML config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Check invariants that hold for any usable config.
pub fn validate(config: &Config) -> Result<()> {
    if config.chunking.chunk_size == 0 {
        anyhow::bail!("chunking.chunk_size must be > 0");
    }
    if config.chunking.chunk_overlap >= config.chunking.chunk_size {
        anyhow::bail!("chunking.chunk_overlap must be < chunking.chunk_size");
    }
    if config.retrieval.k < 1 {
        anyhow::bail!("retrieval.k must be >= 1");
    }

    match config.embedding.provider.as_str() {
        "openai" | "ollama" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be openai or ollama.",
            other
        ),
    }

    match config.completion.provider.as_str() {
        "openai" | "ollama" => {}
        other => anyhow::bail!(
            "Unknown completion provider: '{}'. Must be openai or ollama.",
            other
        ),
    }

    Ok(())
}
