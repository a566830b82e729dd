use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors raised by the export pipeline.
///
/// Only `DataAccess`, `OutputDir`, `AlbumNotFound` and `NoAlbums` abort a run.
/// The rest are recorded per track and reported in the summary.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Database could not be opened or `download_table` could not be read
    #[error("cannot read database {path}: {source}")]
    DataAccess {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("album \"{0}\" not found in database")]
    AlbumNotFound(String),

    #[error("no albums in database")]
    NoAlbums,

    #[error("download failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("copy from {path} failed: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("tagging failed: {0}")]
    Tag(String),

    #[error("unrecognized audio format: {0}")]
    UnsupportedFormat(PathBuf),
}
