use std::path::{Path, PathBuf};

/// Replaces characters that cannot appear in a file name with `_`.
pub fn sanitize_filename(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| {
            if c == '/' || c == '\0' {
                return '_';
            }
            if cfg!(target_os = "windows") {
                if matches!(c, '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') {
                    return '_';
                }
                if c.is_ascii_control() {
                    return '_';
                }
            }
            if cfg!(target_os = "macos") && c == ':' {
                return '_';
            }
            c
        })
        .collect();

    // "", "." and ".." would resolve outside the intended folder
    match cleaned.as_str() {
        "" | "." => "_".to_string(),
        ".." => "__".to_string(),
        _ => cleaned,
    }
}

/// `root/<album name>`, without touching the filesystem.
pub fn album_folder(root: &Path, album_name: &str) -> PathBuf {
    root.join(sanitize_filename(album_name))
}

/// Creates the album folder and its parents if they do not exist yet.
pub fn create_album_folder(root: &Path, album_name: &str) -> std::io::Result<PathBuf> {
    let folder = album_folder(root, album_name);
    if !folder.is_dir() {
        std::fs::create_dir_all(&folder)?;
    }
    Ok(folder)
}

/// Builds the `"{title}-{artist}.mp3"` file name.
///
/// The extension is always `.mp3`, whatever the payload actually is. Two
/// tracks of one album with the same title and artist map to the same path;
/// the later one overwrites the earlier.
pub fn track_file_name(title: &str, artist: &str) -> String {
    format!("{}.mp3", sanitize_filename(&format!("{}-{}", title, artist)))
}

pub fn track_path(album_folder: &Path, title: &str, artist: &str) -> PathBuf {
    album_folder.join(track_file_name(title, artist))
}
