use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum BiError {
    #[error("invalid subject number: {0}")]
    #[diagnostic(help("subjects are numbered 1 to 24"))]
    InvalidSubject(String),

    #[error("unknown dataset: {0}")]
    #[diagnostic(help("expected one of: braininvaders, braininvaders2013"))]
    InvalidDataset(String),

    #[error("invalid session directory name: {0}")]
    InvalidSessionName(String),

    #[error("missing config file bi-data.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to read manifest at {0}")]
    ManifestRead(PathBuf),

    #[error("failed to parse manifest: {0}")]
    ManifestParse(String),

    #[error("download failed: {0}")]
    Http(String),

    #[error("server returned status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("archive error: {0}")]
    Archive(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to load recording: {0}")]
    Recording(String),
}
