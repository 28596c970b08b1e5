use crate::browser::Page;
use crate::utils::sanitize_filename;
use chrono::Local;
use std::path::{Path, PathBuf};

/// Saves screenshots of pages left in an unexpected state for human review
#[derive(Debug, Clone)]
pub struct Diagnostics {
    dir: PathBuf,
}

impl Diagnostics {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `hh_<tag>_<timestamp>.png`. Failures are logged, never returned.
    pub async fn capture<P: Page>(&self, page: &P, tag: &str) -> Option<PathBuf> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = self
            .dir
            .join(format!("hh_{}_{}.png", sanitize_filename(tag), stamp));

        let png = match page.screenshot().await {
            Ok(png) => png,
            Err(e) => {
                ::log::warn!("Could not take screenshot: {}", e);
                return None;
            }
        };

        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            ::log::warn!("Could not create {}: {}", self.dir.display(), e);
            return None;
        }
        match tokio::fs::write(&path, png).await {
            Ok(()) => {
                ::log::warn!("Screenshot saved: {}", path.display());
                Some(path)
            }
            Err(e) => {
                ::log::warn!("Could not save screenshot {}: {}", path.display(), e);
                None
            }
        }
    }
}
