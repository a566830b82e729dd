use std::path::{Path, PathBuf};

use crate::core::materializer::{self, Outcome};
use crate::core::progress::{Line, ProgressSink};
use crate::core::tagger::{MetadataWriter, TagCapability, TrackTags};
use crate::core::{cover, paths, CancelToken};
use crate::models::{AlbumSelection, DownloadRecord, ExportResult};
use crate::sources::RemoteSource;

/// What an album run needs besides the album itself.
pub struct AlbumContext<'a> {
    /// Directory of the database; the cache lives in its `Download/` folder
    pub cache_root: &'a Path,
    pub output_dir: &'a Path,
    pub remote: &'a dyn RemoteSource,
    pub tagger: &'a MetadataWriter,
    pub comment: &'a str,
    pub verbose: bool,
    pub cancel: &'a CancelToken,
}

/// Exports every track of one album into `<output_dir>/<album name>/`.
///
/// If the album folder cannot be created the album is skipped and all of its
/// titles count as failed. Otherwise the cover is fetched (best effort) and
/// the tracks are handled in database order; a failing track never stops the
/// ones after it.
pub fn process_album(
    album: &AlbumSelection,
    tracks: &[&DownloadRecord],
    ctx: &AlbumContext<'_>,
    sink: &mut dyn ProgressSink,
) -> ExportResult {
    let mut result = ExportResult::default();

    let folder = match paths::create_album_folder(ctx.output_dir, &album.album_name) {
        Ok(folder) => folder,
        Err(e) => {
            log::warn!("cannot create folder for album {:?}: {}", album.album_name, e);
            if ctx.verbose {
                sink.emit(Line::item(2, format!("Failed to create subfolder {}", album.album_name)));
                sink.emit(Line::item(2, format!("Skip folder {}", album.album_name)));
            }
            result
                .failed
                .extend(tracks.iter().map(|r| r.display_title().to_string()));
            return result;
        }
    };

    let cover_url = tracks.first().map(|r| r.album_image.as_str()).unwrap_or_default();
    let cover_data = cover::fetch_cover(cover_url, &folder, ctx.remote).and_then(read_cover);

    for record in tracks {
        if ctx.cancel.is_cancelled() {
            log::info!("export cancelled inside album {:?}", album.album_name);
            break;
        }
        export_track(record, &album.album_name, &folder, cover_data.as_deref(), ctx, sink, &mut result);
    }

    result
}

fn export_track(
    record: &DownloadRecord,
    album_name: &str,
    folder: &Path,
    cover: Option<&[u8]>,
    ctx: &AlbumContext<'_>,
    sink: &mut dyn ProgressSink,
    result: &mut ExportResult,
) {
    let title = record.display_title();
    log::debug!(
        "exporting row {} (track {}, {:.0}s, {} likes, created {:?})",
        record.row_id,
        record.track_id,
        record.duration,
        record.likes,
        record.create_time
    );
    if ctx.verbose {
        sink.emit(Line::item(2, format!("Getting file for: {}", title)));
        if !record.is_complete() {
            sink.emit(Line::item(2, format!("Downloading incomplete audio: {}", title)));
        }
    }

    let dest = paths::track_path(folder, &record.title, &record.artist);
    let outcome = match materializer::materialize(record, ctx.cache_root, &dest, ctx.remote) {
        Ok(outcome) => outcome,
        Err(e) => {
            log::warn!("export of {:?} failed: {}", title, e);
            if ctx.verbose {
                sink.emit(Line::item(2, format!("Failed to export {}", title)));
            }
            result.failed.insert(title.to_string());
            return;
        }
    };

    match &outcome {
        Outcome::Missing(source) => {
            log::debug!(
                "{:?} is marked complete but {} does not exist, skipping",
                title,
                source.display()
            );
            return;
        }
        Outcome::Downloaded(url) => log::debug!("{:?} fetched from {}", title, url),
        Outcome::Copied => {}
    }

    if ctx.tagger.capability() == TagCapability::Available && ctx.verbose {
        sink.emit(Line::item(2, format!("Writing metadata for: {}", title)));
    }
    let tags = TrackTags {
        title: &record.title,
        artist: &record.artist,
        album: album_name,
        comment: ctx.comment,
        cover,
    };
    if let Err(e) = ctx.tagger.write(&dest, &tags) {
        log::warn!("tagging {} failed: {}", dest.display(), e);
        result.meta_failed.insert(title.to_string());
    }
}

fn read_cover(path: PathBuf) -> Option<Vec<u8>> {
    match std::fs::read(&path) {
        Ok(data) => Some(data),
        Err(e) => {
            log::warn!("cannot read {}: {}", path.display(), e);
            None
        }
    }
}
