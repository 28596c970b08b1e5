use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use thiserror::Error;

const HEADER: [&str; 2] = ["title", "link"];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report {path} I/O failed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("report CSV write failed: {0}")]
    Csv(#[from] csv::Error),
}

/// CSV log of listings applied to, one `title,link` row per application
#[derive(Debug, Clone)]
pub struct CsvReport {
    path: PathBuf,
}

impl CsvReport {
    /// Creates the file with its header row unless it already exists
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, ReportError> {
        let report = Self { path: path.into() };
        report.ensure_header()?;
        Ok(report)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_header(&self) -> Result<(), ReportError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        if self.path.exists() {
            return Ok(());
        }
        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(HEADER)?;
        writer.flush().map_err(|source| self.io_error(source))?;
        Ok(())
    }

    pub fn append_row(&self, title: &str, link: &str) -> Result<(), ReportError> {
        if !self.path.exists() {
            self.ensure_header()?;
        }
        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|source| self.io_error(source))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record([title, link])?;
        writer.flush().map_err(|source| self.io_error(source))?;
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> ReportError {
        ReportError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
