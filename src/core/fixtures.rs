//! Test fixtures: a scratch `ting.sqlite` laid out like the app's cache.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use tempfile::TempDir;

use crate::models::DownloadRecord;

pub struct FixtureDb {
    pub dir: TempDir,
    pub db_path: PathBuf,
}

impl FixtureDb {
    pub fn new(records: &[DownloadRecord]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("ting.sqlite");
        let conn = Connection::open(&db_path).unwrap();
        conn.execute_batch(
            "CREATE TABLE download_table (
                title TEXT,
                trackId INTEGER,
                artist TEXT,
                likes INTEGER,
                duration REAL,
                createTime INTEGER,
                downloadUrl TEXT,
                downloadAacUrl TEXT,
                downloadedBytes INTEGER,
                totalBytes INTEGER,
                filepath TEXT,
                albumId INTEGER,
                albumName TEXT,
                albumImage TEXT
            );",
        )
        .unwrap();

        for r in records {
            conn.execute(
                "INSERT INTO download_table (rowid, title, trackId, artist, likes, duration,
                    createTime, downloadUrl, downloadAacUrl, downloadedBytes, totalBytes,
                    filepath, albumId, albumName, albumImage)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    r.row_id,
                    r.title,
                    r.track_id,
                    r.artist,
                    r.likes,
                    r.duration,
                    r.create_time,
                    r.download_url,
                    r.download_aac_url,
                    r.downloaded_bytes,
                    r.total_bytes,
                    r.filepath,
                    r.album_id,
                    r.album_name,
                    r.album_image,
                ],
            )
            .unwrap();
        }

        Self { dir, db_path }
    }

    /// Directory holding the database, i.e. the parent of `Download/`.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Puts a payload into the local cache for `record`.
    pub fn cache(&self, record: &DownloadRecord, data: &[u8]) -> PathBuf {
        let path = self.root().join("Download").join(&record.filepath);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, data).unwrap();
        path
    }
}

/// A fully downloaded record with predictable URLs and cache path.
pub fn record(row_id: i64, title: &str, album_id: i64, album_name: &str) -> DownloadRecord {
    DownloadRecord {
        row_id,
        title: title.to_string(),
        artist: "Host".to_string(),
        track_id: 1000 + row_id,
        likes: 3,
        duration: 61.5,
        create_time: Some(1_468_300_000),
        download_url: format!("http://cdn.test/{row_id}.mp3"),
        download_aac_url: format!("http://cdn.test/{row_id}.m4a"),
        downloaded_bytes: 100,
        total_bytes: 100,
        filepath: format!("{album_id}/{row_id}.mp3"),
        album_id,
        album_name: album_name.to_string(),
        album_image: format!("http://img.test/{album_id}.jpg"),
    }
}

/// Same as [`record`] but with an unfinished local download.
pub fn incomplete(row_id: i64, title: &str, album_id: i64, album_name: &str) -> DownloadRecord {
    DownloadRecord {
        downloaded_bytes: 40,
        ..record(row_id, title, album_id, album_name)
    }
}

/// `fLaC` marker and a lone STREAMINFO block (44.1 kHz, stereo, 16 bit),
/// followed by 64 bytes of `0xAA` filler standing in for audio frames.
pub fn flac_stream() -> Vec<u8> {
    let mut data = b"fLaC".to_vec();
    data.extend_from_slice(&[0x80, 0x00, 0x00, 0x22]);
    data.extend_from_slice(&[0x10, 0x00, 0x10, 0x00]);
    data.extend_from_slice(&[0x00; 6]);
    data.extend_from_slice(&[0x0A, 0xC4, 0x42, 0xF0]);
    data.extend_from_slice(&[0x00; 4]);
    data.extend_from_slice(&[0x00; 16]);
    data.extend_from_slice(&[0xAA; 64]);
    data
}
