use std::path::{Path, PathBuf};

use crate::sources::RemoteSource;

pub const COVER_FILE: &str = "cover.jpg";

/// Saves the album's cover art as `cover.jpg` in `album_folder`.
///
/// Returns `None` when there is no URL or the download fails; a missing cover
/// never stops the album.
pub fn fetch_cover(url: &str, album_folder: &Path, remote: &dyn RemoteSource) -> Option<PathBuf> {
    if url.trim().is_empty() {
        return None;
    }

    let dest = album_folder.join(COVER_FILE);
    match remote.download_to(url, &dest) {
        Ok(_) => Some(dest),
        Err(e) => {
            log::warn!("no cover for {}: {:#}", album_folder.display(), e);
            None
        }
    }
}
