use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum QaError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file at {path}: {source}")]
    FileRead { path: PathBuf, source: io::Error },

    #[error("Invalid UTF-8 in file {path}")]
    InvalidUtf8 { path: PathBuf },

    #[error("PDF text extraction failed for {path}: {reason}")]
    PdfExtract { path: PathBuf, reason: String },

    #[error("No passages extracted from the input corpus")]
    EmptyCorpus,

    #[error("Missing OPENAI_API_KEY in environment")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Generation request rejected: {0}")]
    Generation(String),

    #[error("Malformed generation response: {0}")]
    MalformedResponse(String),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, QaError>;
