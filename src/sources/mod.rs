pub mod http;

use std::path::Path;

use anyhow::Result;

/// Where remote payloads (audio and cover art) come from.
pub trait RemoteSource {
    /// Downloads `url` into `dest`, creating or truncating the file.
    /// Returns the number of bytes written.
    fn download_to(&self, url: &str, dest: &Path) -> Result<u64>;
}
