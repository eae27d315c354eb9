//! Page rendering through a real browser engine.
//!
//! Category pages fill in their product grid from client-side scripts, so
//! the markup has to come from a rendered DOM rather than the raw response.

pub mod chromium;

use std::path::Path;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{RenderError, ScrapeError};

/// A failed render, with whatever markup the page had at that point.
#[derive(Debug)]
pub struct RenderFailure {
    pub error: RenderError,
    pub partial_markup: String,
}

impl RenderFailure {
    pub fn new(error: RenderError, partial_markup: impl Into<String>) -> Self {
        Self {
            error,
            partial_markup: partial_markup.into(),
        }
    }
}

#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Load `url` and return the document's outer HTML once product content is visible.
    async fn render(&self, url: &str) -> Result<String, RenderFailure>;
}

/// Render `url`; on failure dump the partial markup to `debug_path`.
pub async fn render_or_dump<R>(renderer: &R, url: &str, debug_path: &Path) -> Result<String, ScrapeError>
where
    R: PageRenderer + ?Sized,
{
    match renderer.render(url).await {
        Ok(html) => Ok(html),
        Err(failure) => {
            write_debug_artifact(debug_path, &failure.partial_markup);
            Err(ScrapeError::Render {
                url: url.to_string(),
                source: failure.error,
            })
        }
    }
}

fn write_debug_artifact(path: &Path, markup: &str) {
    match std::fs::write(path, markup) {
        Ok(()) => info!("saved {} bytes of page markup to {}", markup.len(), path.display()),
        Err(e) => warn!("could not write debug file {}: {e}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted(Result<&'static str, &'static str>);

    #[async_trait]
    impl PageRenderer for Scripted {
        async fn render(&self, _url: &str) -> Result<String, RenderFailure> {
            match self.0 {
                Ok(html) => Ok(html.to_string()),
                Err(partial) => Err(RenderFailure::new(
                    RenderError::Navigation("net::ERR_NAME_NOT_RESOLVED".into()),
                    partial,
                )),
            }
        }
    }

    #[tokio::test]
    async fn success_leaves_no_debug_file() {
        let dir = tempfile::tempdir().unwrap();
        let debug = dir.path().join("debug.html");
        let html = render_or_dump(&Scripted(Ok("<html></html>")), "https://x/", &debug)
            .await
            .unwrap();
        assert_eq!(html, "<html></html>");
        assert!(!debug.exists());
    }

    #[tokio::test]
    async fn failure_dumps_partial_markup() {
        let dir = tempfile::tempdir().unwrap();
        let debug = dir.path().join("debug.html");
        let err = render_or_dump(&Scripted(Err("<html><body>")), "https://x/", &debug)
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Render { ref url, .. } if url == "https://x/"));
        assert_eq!(std::fs::read_to_string(&debug).unwrap(), "<html><body>");
    }

    #[tokio::test]
    async fn unwritable_debug_path_keeps_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let debug = dir.path().join("no-such-dir").join("debug.html");
        let err = render_or_dump(&Scripted(Err("")), "https://x/", &debug)
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Render { .. }));
    }
}
