use std::collections::BTreeMap;
use std::path::Path;

use crate::core::database;
use crate::error::{ExportError, Result};
use crate::models::{AlbumFilter, AlbumSelection, AlbumSummary, DownloadRecord};

/// Records grouped by `album_id`, built once per run.
///
/// Ids iterate in ascending order; records within an album keep database row
/// order.
pub struct AlbumIndex<'a> {
    albums: BTreeMap<i64, Vec<&'a DownloadRecord>>,
}

impl<'a> AlbumIndex<'a> {
    pub fn build(records: &'a [DownloadRecord]) -> Self {
        let mut albums: BTreeMap<i64, Vec<&DownloadRecord>> = BTreeMap::new();
        for record in records {
            albums.entry(record.album_id).or_default().push(record);
        }
        Self { albums }
    }

    /// Records of one album, empty if the id is unknown.
    pub fn tracks(&self, album_id: i64) -> &[&'a DownloadRecord] {
        self.albums.get(&album_id).map(Vec::as_slice).unwrap_or_default()
    }

    fn selections(&self) -> Vec<AlbumSelection> {
        self.albums
            .iter()
            .filter_map(|(&album_id, tracks)| {
                tracks.first().map(|r| AlbumSelection {
                    album_id,
                    album_name: r.album_name.clone(),
                })
            })
            .collect()
    }
}

/// Picks the albums a run should process.
///
/// A named filter matches every album id whose name equals it exactly, so two
/// albums sharing a name are both exported.
///
/// # Errors
///
/// [`ExportError::AlbumNotFound`] when a named filter matches nothing, and
/// [`ExportError::NoAlbums`] when the database holds no records at all.
pub fn resolve(index: &AlbumIndex<'_>, filter: &AlbumFilter) -> Result<Vec<AlbumSelection>> {
    let selected: Vec<AlbumSelection> = match filter {
        AlbumFilter::All => index.selections(),
        AlbumFilter::Named(name) => index
            .selections()
            .into_iter()
            .filter(|s| &s.album_name == name)
            .collect(),
    };

    if selected.is_empty() {
        return Err(match filter {
            AlbumFilter::All => ExportError::NoAlbums,
            AlbumFilter::Named(name) => ExportError::AlbumNotFound(name.clone()),
        });
    }
    Ok(selected)
}

/// Track counts per album, for listing.
pub fn summarize(index: &AlbumIndex<'_>) -> Vec<AlbumSummary> {
    index
        .albums
        .iter()
        .filter_map(|(&album_id, tracks)| {
            let first = tracks.first()?;
            Some(AlbumSummary {
                album_id,
                album_name: first.album_name.clone(),
                tracks: tracks.len(),
                complete: tracks.iter().filter(|r| r.is_complete()).count(),
                duration: tracks.iter().map(|r| r.duration).sum(),
            })
        })
        .collect()
}

/// Reads a database and lists its albums.
pub fn album_summaries(database: &Path) -> Result<Vec<AlbumSummary>> {
    let records = database::load_records(database)?;
    let index = AlbumIndex::build(&records);
    Ok(summarize(&index))
}
