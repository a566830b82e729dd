use std::path::{Path, PathBuf};

use crate::error::{ExportError, Result};
use crate::models::DownloadRecord;
use crate::sources::RemoteSource;

/// Name of the app's cache folder, next to the database file.
pub const CACHE_DIR: &str = "Download";

/// How a track's audio ended up at its destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Copied from the local cache
    Copied,
    /// Fetched from one of the record's URLs
    Downloaded(String),
    /// Marked complete but absent from the cache; nothing written, not a failure
    Missing(PathBuf),
}

/// Path of a record's payload inside the local cache.
pub fn cached_path(cache_root: &Path, record: &DownloadRecord) -> PathBuf {
    cache_root.join(CACHE_DIR).join(&record.filepath)
}

/// Produces the audio file for `record` at `dest`.
///
/// An unfinished download is fetched again, from `download_url` and then
/// `download_aac_url`; the local cache is not looked at in that case. A
/// finished one is copied from `<cache_root>/Download/<filepath>`.
///
/// # Errors
///
/// [`ExportError::Fetch`] when both URLs fail, [`ExportError::Copy`] when the
/// cached file exists but cannot be copied.
pub fn materialize(
    record: &DownloadRecord,
    cache_root: &Path,
    dest: &Path,
    remote: &dyn RemoteSource,
) -> Result<Outcome> {
    if !record.is_complete() {
        return fetch_remote(record, dest, remote);
    }

    let source = cached_path(cache_root, record);
    if !source.exists() {
        return Ok(Outcome::Missing(source));
    }

    std::fs::copy(&source, dest).map_err(|e| ExportError::Copy {
        path: source.clone(),
        source: e,
    })?;
    Ok(Outcome::Copied)
}

fn fetch_remote(record: &DownloadRecord, dest: &Path, remote: &dyn RemoteSource) -> Result<Outcome> {
    let mut reasons = Vec::new();

    for url in [&record.download_url, &record.download_aac_url] {
        match remote.download_to(url, dest) {
            Ok(bytes) => {
                log::info!("fetched {} ({} bytes)", record.display_title(), bytes);
                return Ok(Outcome::Downloaded(url.clone()));
            }
            Err(e) => {
                log::warn!("download of {} from {:?} failed: {:#}", record.display_title(), url, e);
                reasons.push(format!("{:#}", e));
            }
        }
    }

    Err(ExportError::Fetch {
        url: record.download_url.clone(),
        reason: reasons.join("; "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::{incomplete, record};
    use crate::sources::fake::FakeSource;

    #[test]
    fn test_complete_copies_byte_for_byte() {
        let cache = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let rec = record(1, "Episode 1", 10, "Podcast A");
        let payload: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let src = cached_path(cache.path(), &rec);
        std::fs::create_dir_all(src.parent().unwrap()).unwrap();
        std::fs::write(&src, &payload).unwrap();
        let remote = FakeSource::new();
        let dest = out.path().join("Episode 1-Host.mp3");

        let outcome = materialize(&rec, cache.path(), &dest, &remote).unwrap();

        assert_eq!(outcome, Outcome::Copied);
        assert_eq!(std::fs::read(&dest).unwrap(), payload);
        assert!(remote.requested().is_empty());
    }

    #[test]
    fn test_complete_but_missing_is_silent() {
        let cache = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let rec = record(1, "Episode 1", 10, "Podcast A");
        let dest = out.path().join("x.mp3");

        let outcome = materialize(&rec, cache.path(), &dest, &FakeSource::new()).unwrap();

        assert_eq!(outcome, Outcome::Missing(cached_path(cache.path(), &rec)));
        assert!(!dest.exists());
    }

    #[test]
    fn test_copy_error_is_reported() {
        let cache = tempfile::tempdir().unwrap();
        let rec = record(1, "Episode 1", 10, "Podcast A");
        let src = cached_path(cache.path(), &rec);
        std::fs::create_dir_all(src.parent().unwrap()).unwrap();
        std::fs::write(&src, b"audio").unwrap();
        // destination folder does not exist
        let dest = cache.path().join("missing-dir").join("x.mp3");

        let err = materialize(&rec, cache.path(), &dest, &FakeSource::new()).unwrap_err();

        assert!(matches!(err, ExportError::Copy { .. }));
    }

    #[test]
    fn test_incomplete_uses_primary_url_only() {
        let cache = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let rec = incomplete(2, "Episode 2", 10, "Podcast A");
        // a cached copy exists but must be ignored
        let src = cached_path(cache.path(), &rec);
        std::fs::create_dir_all(src.parent().unwrap()).unwrap();
        std::fs::write(&src, b"stale partial").unwrap();
        let remote = FakeSource::new().with(&rec.download_url, b"primary body");
        let dest = out.path().join("x.mp3");

        let outcome = materialize(&rec, cache.path(), &dest, &remote).unwrap();

        assert_eq!(outcome, Outcome::Downloaded(rec.download_url.clone()));
        assert_eq!(std::fs::read(&dest).unwrap(), b"primary body");
        assert_eq!(remote.requested(), vec![rec.download_url.clone()]);
    }

    #[test]
    fn test_incomplete_falls_back_to_aac() {
        let out = tempfile::tempdir().unwrap();
        let rec = incomplete(2, "Episode 2", 10, "Podcast A");
        let remote = FakeSource::new().with(&rec.download_aac_url, b"aac body");
        let dest = out.path().join("x.mp3");

        let outcome = materialize(&rec, out.path(), &dest, &remote).unwrap();

        assert_eq!(outcome, Outcome::Downloaded(rec.download_aac_url.clone()));
        assert_eq!(std::fs::read(&dest).unwrap(), b"aac body");
        assert_eq!(
            remote.requested(),
            vec![rec.download_url.clone(), rec.download_aac_url.clone()]
        );
    }

    #[test]
    fn test_incomplete_both_urls_fail() {
        let out = tempfile::tempdir().unwrap();
        let rec = incomplete(2, "Episode 2", 10, "Podcast A");
        let remote = FakeSource::new();
        let dest = out.path().join("x.mp3");

        let err = materialize(&rec, out.path(), &dest, &remote).unwrap_err();

        assert!(matches!(err, ExportError::Fetch { .. }));
        assert_eq!(remote.requested().len(), 2);
    }
}
