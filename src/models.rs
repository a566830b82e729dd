use std::collections::BTreeSet;
use std::path::PathBuf;

/// One row of the app's `download_table`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadRecord {
    pub row_id: i64,
    pub title: String,
    pub artist: String,
    pub track_id: i64,
    pub likes: i64,
    pub duration: f64,
    pub create_time: Option<i64>,
    pub download_url: String,
    pub download_aac_url: String,
    pub downloaded_bytes: i64,
    pub total_bytes: i64,
    pub filepath: String,
    pub album_id: i64,
    pub album_name: String,
    pub album_image: String,
}

impl DownloadRecord {
    /// The local copy in the app's cache is only usable once fully downloaded.
    pub fn is_complete(&self) -> bool {
        self.downloaded_bytes >= self.total_bytes
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(untitled)"
        } else {
            &self.title
        }
    }
}

/// An album picked for export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumSelection {
    pub album_id: i64,
    pub album_name: String,
}

/// Per-album counts shown when listing the database contents.
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumSummary {
    pub album_id: i64,
    pub album_name: String,
    pub tracks: usize,
    pub complete: usize,
    /// Total length in seconds
    pub duration: f64,
}

/// Which albums a run should export.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AlbumFilter {
    #[default]
    All,
    Named(String),
}

impl From<Option<String>> for AlbumFilter {
    fn from(album: Option<String>) -> Self {
        match album {
            Some(name) => AlbumFilter::Named(name),
            None => AlbumFilter::All,
        }
    }
}

/// Everything a caller supplies to start an export.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub database: PathBuf,
    pub output_dir: PathBuf,
    pub album: AlbumFilter,
    pub verbose: bool,
}

/// Titles that failed during a run, split by stage.
///
/// Sets keep the report deduplicated and in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportResult {
    pub failed: BTreeSet<String>,
    pub meta_failed: BTreeSet<String>,
}

impl ExportResult {
    pub fn merge(&mut self, other: ExportResult) {
        self.failed.extend(other.failed);
        self.meta_failed.extend(other.meta_failed);
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.meta_failed.is_empty()
    }
}
