//! `artifact`
//!
//! Encoding icons and putting them on disk.

use std::{
    io::{self, Cursor, Write},
    path::{Path, PathBuf},
};

use image::{ImageFormat, RgbaImage};
use tempfile::NamedTempFile;

use crate::sizes::TargetSize;

/// The extension of every icon written.
pub const ICON_EXTENSION: &str = "png";

/// The file name prefix used when none is configured.
pub const DEFAULT_FILE_PREFIX: &str = "icon";

/// An icon that has been written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// The size the icon was rendered at.
    pub size: TargetSize,
    /// Where the icon was written.
    pub path: PathBuf,
}

/// Gets the file name an icon of a given size is written to, e.g. `icon16.png`.
pub fn artifact_file_name(prefix: &str, size: TargetSize) -> String {
    format!("{prefix}{size}.{ICON_EXTENSION}")
}

/// Encodes an image as a PNG.
///
/// # Arguments
/// * `image`: The image to encode.
///
/// # Returns
/// The bytes of the PNG file.
///
/// # Errors
/// An [`image::ImageError`] if the encoder rejects the image.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}

/// Writes a file so that readers only ever see the old contents or the complete new contents.
///
/// The bytes are written to a temporary file next to the destination, which is then renamed over
/// the destination. If anything fails the temporary file is removed.
///
/// # Arguments
/// * `dir`: The directory to write into. Must already exist.
/// * `file_name`: The name of the file within `dir`.
/// * `bytes`: The complete contents of the file.
///
/// # Returns
/// The path that was written.
///
/// # Errors
/// An [`io::Error`] if the directory is missing or not writable, or the disk is full.
pub fn write_atomically(dir: &Path, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
    let destination = dir.join(file_name);

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(&destination).map_err(|err| err.error)?;

    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_files_by_size() {
        let size = TargetSize::new(48).unwrap();
        assert_eq!(artifact_file_name(DEFAULT_FILE_PREFIX, size), "icon48.png");
        assert_eq!(artifact_file_name("favicon-", size), "favicon-48.png");
    }

    #[test]
    fn encodes_png() {
        let image = RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 4]));
        let bytes = encode_png(&image).unwrap();

        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png)
            .unwrap()
            .into_rgba8();
        assert_eq!(decoded, image, "PNG is lossless");
        assert_eq!(bytes, encode_png(&image).unwrap(), "encoding is deterministic");
    }

    #[test]
    fn replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("icon16.png"), b"old").unwrap();

        let path = write_atomically(dir.path(), "icon16.png", b"new").unwrap();

        assert_eq!(path, dir.path().join("icon16.png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
        assert_eq!(
            std::fs::read_dir(dir.path()).unwrap().count(),
            1,
            "no temporary files are left behind"
        );
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");

        let err = write_atomically(&missing, "icon16.png", b"data").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!missing.exists(), "the directory is not created");
    }
}
