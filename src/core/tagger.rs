use std::path::Path;

use crate::error::Result;

/// Fields embedded into every exported track.
#[derive(Debug, Clone, Copy)]
pub struct TrackTags<'a> {
    pub title: &'a str,
    pub artist: &'a str,
    pub album: &'a str,
    pub comment: &'a str,
    /// Raw image bytes of the album cover, when one was fetched
    pub cover: Option<&'a [u8]>,
}

/// Whether tags can be written in this run. Decided once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagCapability {
    Available,
    Unavailable,
}

impl TagCapability {
    /// Available when the binary was built with the `tags` feature and the
    /// user has not switched tagging off.
    pub fn detect(enabled: bool) -> Self {
        if cfg!(feature = "tags") && enabled {
            TagCapability::Available
        } else {
            TagCapability::Unavailable
        }
    }
}

pub struct MetadataWriter {
    capability: TagCapability,
}

impl MetadataWriter {
    pub fn new(capability: TagCapability) -> Self {
        Self { capability }
    }

    pub fn capability(&self) -> TagCapability {
        self.capability
    }

    /// Writes `tags` into the file at `path`.
    ///
    /// Returns `Ok(false)` without touching the file when tagging is
    /// unavailable. On error the audio file is left as it was written.
    pub fn write(&self, path: &Path, tags: &TrackTags<'_>) -> Result<bool> {
        match self.capability {
            TagCapability::Unavailable => Ok(false),
            TagCapability::Available => {
                backend::write_tags(path, tags)?;
                Ok(true)
            }
        }
    }
}

#[cfg(feature = "tags")]
mod backend {
    use std::fs::File;
    use std::io::BufReader;
    use std::path::Path;

    use id3::{Tag, TagLike, Version};
    use lofty::config::WriteOptions;
    use lofty::file::FileType;
    use lofty::picture::{Picture, PictureType};
    use lofty::prelude::*;
    use lofty::probe::Probe;

    use super::TrackTags;
    use crate::error::{ExportError, Result};

    /// Exported files always end in `.mp3` but may hold AAC in an MP4
    /// container, so the format is taken from the content.
    pub fn write_tags(path: &Path, tags: &TrackTags<'_>) -> Result<()> {
        match detect_file_type(path)? {
            FileType::Mpeg => write_id3(path, tags),
            other => write_container_tag(path, other, tags),
        }
    }

    fn detect_file_type(path: &Path) -> Result<FileType> {
        let file = File::open(path)
            .map_err(|e| ExportError::Tag(format!("cannot open {}: {}", path.display(), e)))?;
        let probe = Probe::new(BufReader::new(file))
            .guess_file_type()
            .map_err(|e| ExportError::Tag(e.to_string()))?;
        probe
            .file_type()
            .ok_or_else(|| ExportError::UnsupportedFormat(path.to_path_buf()))
    }

    /// ID3v2.4 for MPEG audio. An existing tag is kept and updated.
    fn write_id3(path: &Path, tags: &TrackTags<'_>) -> Result<()> {
        let mut tag = Tag::read_from_path(path).unwrap_or_else(|_| Tag::new());

        tag.set_title(tags.title);
        tag.set_artist(tags.artist);
        tag.set_album(tags.album);
        tag.add_frame(id3::frame::Comment {
            lang: "eng".to_string(),
            description: String::new(),
            text: tags.comment.to_string(),
        });
        if let Some(art_data) = tags.cover {
            match cover_mime_type(art_data) {
                Some(mime_type) => {
                    tag.remove_all_pictures();
                    tag.add_frame(id3::frame::Picture {
                        mime_type: mime_type.to_string(),
                        picture_type: id3::frame::PictureType::CoverFront,
                        description: String::new(),
                        data: art_data.to_vec(),
                    });
                }
                None => log::warn!("cover for {} is not a JPEG or PNG image, skipped", path.display()),
            }
        }

        tag.write_to_path(path, Version::Id3v24)
            .map_err(|e| ExportError::Tag(e.to_string()))
    }

    /// Everything else lofty knows (MP4 gets `©nam`/`©ART`/`©alb`/`covr`).
    fn write_container_tag(path: &Path, file_type: FileType, tags: &TrackTags<'_>) -> Result<()> {
        let tag_err = |e: lofty::error::LoftyError| ExportError::Tag(e.to_string());

        let mut tagged_file = Probe::open(path)
            .map_err(tag_err)?
            .guess_file_type()
            .map_err(|e| ExportError::Tag(e.to_string()))?
            .read()
            .map_err(tag_err)?;

        let tag_type = tagged_file.primary_tag_type();
        if tagged_file.tag(tag_type).is_none() {
            tagged_file.insert_tag(lofty::tag::Tag::new(tag_type));
        }
        let tag = tagged_file.tag_mut(tag_type).ok_or_else(|| {
            ExportError::Tag(format!("no writable tag for {:?} ({:?})", file_type, tag_type))
        })?;

        tag.set_title(tags.title.to_string());
        tag.set_artist(tags.artist.to_string());
        tag.set_album(tags.album.to_string());
        tag.set_comment(tags.comment.to_string());
        if let Some(art_data) = tags.cover {
            match Picture::from_reader(&mut &art_data[..]) {
                Ok(mut picture) => {
                    picture.set_pic_type(PictureType::CoverFront);
                    tag.remove_picture_type(PictureType::CoverFront);
                    tag.push_picture(picture);
                }
                Err(e) => log::warn!("cover for {} skipped: {}", path.display(), e),
            }
        }

        tagged_file
            .save_to_path(path, WriteOptions::default())
            .map_err(tag_err)
    }

    /// MIME type from the image's magic bytes; `None` for anything that is
    /// not JPEG or PNG (an HTML error page served with status 200, say).
    fn cover_mime_type(data: &[u8]) -> Option<&'static str> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            Some("image/png")
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some("image/jpeg")
        } else {
            None
        }
    }

}

#[cfg(not(feature = "tags"))]
mod backend {
    use std::path::Path;

    use super::TrackTags;
    use crate::error::{ExportError, Result};

    pub fn write_tags(_path: &Path, _tags: &TrackTags<'_>) -> Result<()> {
        Err(ExportError::Tag("built without the `tags` feature".to_string()))
    }
}
