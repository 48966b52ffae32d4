use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::instrument;

use crate::domain::{ports::DocumentSource, Document, DomainError, IngestOutcome, IngestReport};

const EXTENSION: &str = "txt";

/// Reads the `*.txt` files directly inside one directory.
pub struct DirectoryLoader {
    dir: PathBuf,
}

impl DirectoryLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Every `*.txt` entry, sorted by path. Symlinks are followed; entries
    /// that do not resolve to a regular file come back as skip outcomes.
    async fn list_text_files(&self) -> Result<Vec<Result<PathBuf, IngestOutcome>>, DomainError> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let listed = match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => Ok(path),
                Ok(_) => Err(IngestOutcome::skipped(&path, "not a regular file")),
                Err(e) => Err(IngestOutcome::skipped(&path, e.to_string())),
            };
            entries.push(listed);
        }
        entries.sort_by(|a, b| listed_path(a).cmp(listed_path(b)));
        Ok(entries)
    }

    /// The document and whether invalid UTF-8 had to be dropped.
    async fn read_one(path: &Path) -> Result<(Document, bool), IngestOutcome> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| IngestOutcome::skipped(path, e.to_string()))?;

        let (text, lossy) = match String::from_utf8(bytes) {
            Ok(text) => (text, false),
            Err(e) => {
                let text: String = String::from_utf8_lossy(e.as_bytes())
                    .chars()
                    .filter(|&c| c != char::REPLACEMENT_CHARACTER)
                    .collect();
                (text, true)
            }
        };

        if text.trim().is_empty() {
            return Err(IngestOutcome::skipped(path, "empty"));
        }
        Ok((Document::new(path, text), lossy))
    }
}

fn listed_path(listed: &Result<PathBuf, IngestOutcome>) -> &Path {
    match listed {
        Ok(path) => path,
        Err(outcome) => &outcome.path,
    }
}

#[async_trait]
impl DocumentSource for DirectoryLoader {
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn load(&self) -> Result<IngestReport, DomainError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let mut report = IngestReport::default();
        for listed in self.list_text_files().await? {
            let read = match listed {
                Ok(path) => Self::read_one(&path)
                    .await
                    .map(|(document, lossy)| (path, document, lossy)),
                Err(outcome) => Err(outcome),
            };
            match read {
                Ok((path, document, lossy)) => {
                    let chars = document.text.chars().count();
                    report.outcomes.push(IngestOutcome::loaded(&path, chars, lossy));
                    report.documents.push(document);
                }
                Err(outcome) => {
                    tracing::warn!(path = %outcome.path.display(), status = ?outcome.status, "document skipped");
                    report.outcomes.push(outcome);
                }
            }
        }

        tracing::info!(
            loaded = report.loaded_count(),
            skipped = report.outcomes.len() - report.loaded_count(),
            "documents read"
        );
        Ok(report)
    }
}
