use std::path::PathBuf;

use thiserror::Error;

/// Why a page could not be rendered.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to launch browser: {0}")]
    Launch(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("page evaluation failed: {0}")]
    Evaluation(String),
    #[error("no element with class marker `{marker}` became visible within {secs}s")]
    Timeout { marker: String, secs: u64 },
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("failed to load page {url}")]
    Render {
        url: String,
        #[source]
        source: RenderError,
    },
    #[error("failed to parse HTML: {0}")]
    Parse(String),
    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}
