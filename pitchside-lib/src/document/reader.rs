use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::document::Document;
use crate::{Error, Result};

/// Reads every text file under a directory into [`Document`]s.
///
/// Files are visited in file-name order so repeated runs produce the same
/// document sequence. Files that are not valid UTF-8 are skipped.
#[derive(Debug, Clone)]
pub struct DirectoryReader {
    root: PathBuf,
    recursive: bool,
    exclude_hidden: bool,
    required_exts: Vec<String>,
}

impl DirectoryReader {
    /// Create a recursive reader rooted at `root` that skips hidden entries.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            recursive: true,
            exclude_hidden: true,
            required_exts: Vec::new(),
        }
    }

    #[must_use]
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    #[must_use]
    pub fn exclude_hidden(mut self, exclude_hidden: bool) -> Self {
        self.exclude_hidden = exclude_hidden;
        self
    }

    /// Only accept files with one of these extensions (without the dot,
    /// case-insensitive). An empty list accepts everything.
    #[must_use]
    pub fn required_exts<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_exts = exts
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// Read all matching files.
    ///
    /// Fails if the root does not exist. An existing directory with no
    /// readable files yields an empty vector.
    pub fn load_data(&self) -> Result<Vec<Document>> {
        if !self.root.exists() {
            return Err(Error::NotFound(format!(
                "directory {} does not exist",
                self.root.display()
            )));
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let exclude_hidden = self.exclude_hidden;

        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !(exclude_hidden && e.depth() > 0 && is_hidden(e)));

        let mut documents = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            if !entry.file_type().is_file() || !self.accepts(entry.path()) {
                continue;
            }

            match read_document(entry.path()) {
                Ok(Some(doc)) => documents.push(doc),
                Ok(None) => warn!(path = %entry.path().display(), "skipping non-UTF-8 file"),
                Err(e) => return Err(e),
            }
        }

        debug!(root = %self.root.display(), count = documents.len(), "loaded documents");
        Ok(documents)
    }

    fn accepts(&self, path: &Path) -> bool {
        if self.required_exts.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.required_exts.contains(&ext.to_lowercase()))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

fn read_document(path: &Path) -> Result<Option<Document>> {
    let bytes = fs::read(path)?;
    let Ok(content) = String::from_utf8(bytes) else {
        return Ok(None);
    };

    let meta = fs::metadata(path)?;
    let path_str = path.to_string_lossy().into_owned();
    let mut doc = Document::new(path_str.clone(), content)
        .with_metadata("file_path", path_str)
        .with_metadata("file_size", meta.len().to_string());

    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        doc = doc.with_metadata("file_name", name);
    }
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        doc = doc.with_metadata("file_type", ext.to_lowercase());
    }
    if let Ok(modified) = meta.modified() {
        let date: DateTime<Local> = modified.into();
        doc = doc.with_metadata("last_modified_date", date.format("%Y-%m-%d").to_string());
    }

    Ok(Some(doc))
}
