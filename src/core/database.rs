//! Read access to the app's download database (`ting.sqlite`).
//!
//! The pipeline only ever runs one fixed projection over `download_table`.
//! Column types in the app's database are loose (SQLite affinity), so the
//! numeric columns are read leniently and NULL text becomes an empty string.

use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, Row};

use crate::error::{ExportError, Result};
use crate::models::DownloadRecord;

const RECORDS_QUERY: &str = "SELECT rowid, title, trackId, artist, likes, duration, createTime,
        downloadUrl, downloadAacUrl, downloadedBytes, totalBytes, filepath,
        albumId, albumName, albumImage
    FROM download_table
    ORDER BY rowid";

/// Opens an existing database read-only. A missing file is an error, never
/// created, and nothing is ever written back into the user's copy.
pub fn open(path: &Path) -> Result<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    Connection::open_with_flags(path, flags).map_err(|source| ExportError::DataAccess {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads every download record in row order.
///
/// # Errors
///
/// Returns [`ExportError::DataAccess`] if the table or one of the expected
/// columns is missing, or a row cannot be decoded.
pub fn read_records(conn: &Connection, path: &Path) -> Result<Vec<DownloadRecord>> {
    let data_access = |source| ExportError::DataAccess {
        path: path.to_path_buf(),
        source,
    };

    let mut stmt = conn.prepare(RECORDS_QUERY).map_err(data_access)?;
    let rows = stmt
        .query_map([], DownloadRecord::from_row)
        .map_err(data_access)?;

    let records = rows.collect::<rusqlite::Result<Vec<_>>>().map_err(data_access)?;
    log::info!("read {} download records from {}", records.len(), path.display());
    Ok(records)
}

/// Opens the database, reads it and closes it again.
pub fn load_records(path: &Path) -> Result<Vec<DownloadRecord>> {
    let conn = open(path)?;
    let records = read_records(&conn, path)?;
    close(conn);
    Ok(records)
}

pub fn close(conn: Connection) {
    if let Err((_, e)) = conn.close() {
        log::warn!("closing database failed: {}", e);
    }
}

impl DownloadRecord {
    /// Maps one row of [`RECORDS_QUERY`] to a record.
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            row_id: row.get(0)?,
            title: text_at(row, 1)?,
            track_id: int_at(row, 2)?.unwrap_or_default(),
            artist: text_at(row, 3)?,
            likes: int_at(row, 4)?.unwrap_or_default(),
            duration: real_at(row, 5)?,
            create_time: int_at(row, 6)?,
            download_url: text_at(row, 7)?,
            download_aac_url: text_at(row, 8)?,
            downloaded_bytes: int_at(row, 9)?.unwrap_or_default(),
            total_bytes: int_at(row, 10)?.unwrap_or_default(),
            filepath: text_at(row, 11)?,
            album_id: int_at(row, 12)?.unwrap_or_default(),
            album_name: text_at(row, 13)?,
            album_image: text_at(row, 14)?,
        })
    }
}

fn text_at(row: &Row, idx: usize) -> rusqlite::Result<String> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    })
}

fn real_at(row: &Row, idx: usize) -> rusqlite::Result<f64> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Integer(i) => i as f64,
        ValueRef::Real(f) => f,
        ValueRef::Text(t) => std::str::from_utf8(t)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or_default(),
        ValueRef::Null | ValueRef::Blob(_) => 0.0,
    })
}

fn int_at(row: &Row, idx: usize) -> rusqlite::Result<Option<i64>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Integer(i) => Some(i),
        ValueRef::Real(f) => Some(f as i64),
        ValueRef::Text(t) => std::str::from_utf8(t)
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .map(|f| f as i64),
        ValueRef::Null | ValueRef::Blob(_) => None,
    })
}
