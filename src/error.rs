use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while saving a single URL.
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("not a valid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("cannot rewrite html: {0}")]
    Rewrite(#[from] lol_html::errors::RewritingError),

    #[error("bad selector {selector}: {message}")]
    Selector { selector: String, message: String },

    #[error("no free file name for {stem} in {}", dir.display())]
    NamesExhausted { stem: String, dir: PathBuf },

    #[error("create file {} failed: {source}", path.display())]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = SaveError> = std::result::Result<T, E>;
