//! Whole-run orchestration.
//!
//! A run opens the database, resolves the albums to export, makes sure the
//! output directory exists and then hands each album to the album processor.
//! Failures below the run level are collected and printed once, at the end.
//!
//! The exit status is `1` only for run-level failures (unreadable database,
//! uncreatable output directory, no matching album). Tracks that failed to
//! export or tag are listed in the summary but still give `0`.

use std::path::Path;

use anyhow::Result;

use crate::config::Config;
use crate::core::albums::{self, AlbumIndex};
use crate::core::processor::{self, AlbumContext};
use crate::core::progress::{Line, ProgressSink};
use crate::core::tagger::{MetadataWriter, TagCapability};
use crate::core::{database, CancelToken};
use crate::error::ExportError;
use crate::models::{ExportRequest, ExportResult};
use crate::sources::http::HttpSource;
use crate::sources::RemoteSource;

/// Collaborators of a run, injected so front-ends and tests choose them.
pub struct ExportEnv<'a> {
    pub remote: &'a dyn RemoteSource,
    pub tagger: &'a MetadataWriter,
    pub comment: &'a str,
    pub cancel: &'a CancelToken,
}

/// What a finished (not aborted) run did.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub albums: usize,
    pub result: ExportResult,
    pub cancelled: bool,
}

/// Runs an export and returns the process exit status.
pub fn run(request: &ExportRequest, env: &ExportEnv<'_>, sink: &mut dyn ProgressSink) -> i32 {
    match export(request, env, sink) {
        Ok(_) => 0,
        Err(e) => {
            log::error!("{}", e);
            report_fatal(&e, request, sink);
            1
        }
    }
}

/// Runs an export with the HTTP client and tag writer described by `config`.
pub fn run_configured(
    request: &ExportRequest,
    config: &Config,
    cancel: &CancelToken,
    sink: &mut dyn ProgressSink,
) -> Result<i32> {
    let remote = HttpSource::new(&config.http)?;
    let tagger = MetadataWriter::new(TagCapability::detect(config.export.write_tags));
    if tagger.capability() == TagCapability::Unavailable {
        log::info!("tag writing is disabled for this run");
    }
    let env = ExportEnv {
        remote: &remote,
        tagger: &tagger,
        comment: &config.export.comment,
        cancel,
    };
    Ok(run(request, &env, sink))
}

/// The pipeline proper. Run-level failures come back as `Err`.
pub fn export(
    request: &ExportRequest,
    env: &ExportEnv<'_>,
    sink: &mut dyn ProgressSink,
) -> Result<RunSummary, ExportError> {
    let verbose = request.verbose;

    let conn = database::open(&request.database)?;
    if verbose {
        sink.emit(Line::header(1, "Connected to database:"));
        sink.emit(Line::item(2, request.database.display().to_string()));
    }

    let records = database::read_records(&conn, &request.database)?;
    let cache_root = request.database.parent().unwrap_or_else(|| Path::new(""));

    let index = AlbumIndex::build(&records);
    let selected = albums::resolve(&index, &request.album)?;

    if !request.output_dir.is_dir() {
        std::fs::create_dir_all(&request.output_dir).map_err(|source| ExportError::OutputDir {
            path: request.output_dir.clone(),
            source,
        })?;
    }

    let ctx = AlbumContext {
        cache_root,
        output_dir: &request.output_dir,
        remote: env.remote,
        tagger: env.tagger,
        comment: env.comment,
        verbose,
        cancel: env.cancel,
    };

    let mut summary = RunSummary::default();
    let total = selected.len();
    for (i, album) in selected.iter().enumerate() {
        if env.cancel.is_cancelled() {
            summary.cancelled = true;
            break;
        }
        if verbose {
            sink.emit(Line::numbered(
                1,
                format!("Processing album: \"{}\"", album.album_name),
                i + 1,
                total,
            ));
        }
        let album_result =
            processor::process_album(album, index.tracks(album.album_id), &ctx, sink);
        summary.result.merge(album_result);
        summary.albums += 1;
    }
    summary.cancelled |= env.cancel.is_cancelled();

    if verbose {
        sink.emit(Line::header(1, "Drop connection to database:"));
    }
    database::close(conn);

    report_summary(&summary, sink);
    Ok(summary)
}

fn report_summary(summary: &RunSummary, sink: &mut dyn ProgressSink) {
    if summary.cancelled {
        sink.emit(Line::header(1, format!("Cancelled after {} album(s)", summary.albums)));
    }

    sink.emit(Line::header(1, "Summary"));
    let result = &summary.result;
    if !result.failed.is_empty() {
        sink.emit(Line::header(2, "Failed to export:"));
        for title in &result.failed {
            sink.emit(Line::item(2, title.as_str()));
        }
    }
    if !result.meta_failed.is_empty() {
        sink.emit(Line::header(2, "Failed to write meta data in:"));
        for title in &result.meta_failed {
            sink.emit(Line::item(2, title.as_str()));
        }
    }
    if result.is_clean() {
        sink.emit(Line::header(2, "All done."));
    }
}

fn report_fatal(error: &ExportError, request: &ExportRequest, sink: &mut dyn ProgressSink) {
    match error {
        ExportError::DataAccess { source, .. } => {
            sink.emit(Line::header(1, "Failed to connect to database:"));
            sink.emit(Line::item(2, request.database.display().to_string()));
            sink.emit(Line::item(2, source.to_string()));
        }
        ExportError::OutputDir { path, source } => {
            sink.emit(Line::header(
                1,
                format!("Failed to create output directory: {}", path.display()),
            ));
            sink.emit(Line::item(2, source.to_string()));
        }
        ExportError::AlbumNotFound(_) => {
            sink.emit(Line::header(1, "Given album name not found in database."));
        }
        other => sink.emit(Line::header(1, other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::{record, FixtureDb};
    use crate::models::AlbumFilter;
    use crate::sources::fake::FakeSource;

    struct Run {
        status: i32,
        lines: Vec<String>,
    }

    fn run_export(db: &Path, out: &Path, album: AlbumFilter, remote: &FakeSource) -> Run {
        let tagger = MetadataWriter::new(TagCapability::Unavailable);
        let cancel = CancelToken::new();
        let env = ExportEnv {
            remote,
            tagger: &tagger,
            comment: "test",
            cancel: &cancel,
        };
        let request = ExportRequest {
            database: db.to_path_buf(),
            output_dir: out.to_path_buf(),
            album,
            verbose: true,
        };
        let mut lines = Vec::new();
        let status = run(&request, &env, &mut |l: Line| lines.push(l.to_string()));
        Run { status, lines }
    }

    fn mp3_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".mp3"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_single_album_all_done() {
        let r1 = record(1, "Episode 1", 1, "Podcast A");
        let r2 = record(2, "Episode 2", 1, "Podcast A");
        let fixture = FixtureDb::new(&[r1.clone(), r2.clone()]);
        fixture.cache(&r1, b"one");
        fixture.cache(&r2, b"two");
        let out = fixture.root().join("export");
        let remote = FakeSource::new().with(&r1.album_image, b"jpeg");

        let run = run_export(&fixture.db_path, &out, AlbumFilter::All, &remote);

        assert_eq!(run.status, 0);
        let album = out.join("Podcast A");
        assert!(album.join("cover.jpg").exists());
        assert_eq!(mp3_names(&album), vec!["Episode 1-Host.mp3", "Episode 2-Host.mp3"]);
        assert!(run.lines.iter().any(|l| l == "# Processing album: \"Podcast A\" (1 of 1)"));
        assert_eq!(run.lines.last().map(String::as_str), Some("## All done."));
    }

    #[test]
    fn test_named_album_only() {
        let a = record(1, "A1", 1, "Podcast A");
        let b = record(2, "B1", 2, "Podcast B");
        let fixture = FixtureDb::new(&[a.clone(), b.clone()]);
        fixture.cache(&a, b"a");
        fixture.cache(&b, b"b");
        let out = fixture.root().join("export");

        let run = run_export(
            &fixture.db_path,
            &out,
            AlbumFilter::Named("Podcast B".to_string()),
            &FakeSource::new(),
        );

        assert_eq!(run.status, 0);
        assert_eq!(mp3_names(&out.join("Podcast B")), vec!["B1-Host.mp3"]);
        assert!(!out.join("Podcast A").exists());
    }

    #[test]
    fn test_missing_cached_file_in_neither_list() {
        let r1 = record(1, "Episode 1", 1, "Podcast A");
        let r2 = record(2, "Episode 2", 1, "Podcast A");
        let fixture = FixtureDb::new(&[r1.clone(), r2.clone()]);
        fixture.cache(&r1, b"one");
        let out = fixture.root().join("export");

        let run = run_export(&fixture.db_path, &out, AlbumFilter::All, &FakeSource::new());

        assert_eq!(run.status, 0);
        assert_eq!(mp3_names(&out.join("Podcast A")), vec!["Episode 1-Host.mp3"]);
        assert!(run.lines.iter().any(|l| l == "## All done."));
        assert!(!run.lines.iter().any(|l| l.contains("Failed")));
    }

    #[test]
    fn test_uncreatable_output_dir_is_fatal() {
        let r1 = record(1, "Episode 1", 1, "Podcast A");
        let fixture = FixtureDb::new(&[r1.clone()]);
        fixture.cache(&r1, b"one");
        let blocker = fixture.root().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let remote = FakeSource::new();

        let run = run_export(&fixture.db_path, &blocker.join("out"), AlbumFilter::All, &remote);

        assert_eq!(run.status, 1);
        assert!(remote.requested().is_empty());
        assert!(!run.lines.iter().any(|l| l.contains("Processing album")));
        assert!(run
            .lines
            .iter()
            .any(|l| l.starts_with("# Failed to create output directory")));
    }

    #[test]
    fn test_unknown_album_is_fatal_and_leaves_output_alone() {
        let r1 = record(1, "Episode 1", 1, "Podcast A");
        let fixture = FixtureDb::new(&[r1]);
        let out = fixture.root().join("export");

        let run = run_export(
            &fixture.db_path,
            &out,
            AlbumFilter::Named("Podcast Z".to_string()),
            &FakeSource::new(),
        );

        assert_eq!(run.status, 1);
        assert!(!out.exists());
        assert!(run
            .lines
            .iter()
            .any(|l| l == "# Given album name not found in database."));
    }

    #[test]
    fn test_unreadable_database_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let run = run_export(
            &dir.path().join("missing.sqlite"),
            &dir.path().join("out"),
            AlbumFilter::All,
            &FakeSource::new(),
        );

        assert_eq!(run.status, 1);
        assert_eq!(run.lines[0], "# Failed to connect to database:");
    }

    #[test]
    fn test_failures_deduplicated_and_status_zero() {
        // same title in two albums, both incomplete with dead URLs
        let mut a = record(1, "Episode 1", 1, "Podcast A");
        a.downloaded_bytes = 0;
        let mut b = record(2, "Episode 1", 2, "Podcast B");
        b.downloaded_bytes = 0;
        let fixture = FixtureDb::new(&[a, b]);
        let out = fixture.root().join("export");

        let run = run_export(&fixture.db_path, &out, AlbumFilter::All, &FakeSource::new());

        assert_eq!(run.status, 0);
        let failed_at = run
            .lines
            .iter()
            .position(|l| l == "## Failed to export:")
            .unwrap();
        assert_eq!(run.lines[failed_at + 1].trim(), "Episode 1");
        assert_eq!(
            run.lines
                .iter()
                .filter(|l| l.trim() == "Episode 1")
                .count(),
            1
        );
        assert!(!run.lines.iter().any(|l| l == "## All done."));
    }

    #[test]
    fn test_cancelled_run_reports() {
        let r1 = record(1, "Episode 1", 1, "Podcast A");
        let fixture = FixtureDb::new(&[r1.clone()]);
        fixture.cache(&r1, b"one");
        let tagger = MetadataWriter::new(TagCapability::Unavailable);
        let cancel = CancelToken::new();
        cancel.cancel();
        let remote = FakeSource::new();
        let env = ExportEnv {
            remote: &remote,
            tagger: &tagger,
            comment: "",
            cancel: &cancel,
        };
        let request = ExportRequest {
            database: fixture.db_path.clone(),
            output_dir: fixture.root().join("export"),
            album: AlbumFilter::All,
            verbose: false,
        };

        let summary = export(&request, &env, &mut |_: Line| {}).unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.albums, 0);
    }
}
