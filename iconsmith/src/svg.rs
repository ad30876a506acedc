//! `svg`
//!
//! Loading and parsing of the source SVG.
use std::{
    fmt, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use resvg::usvg::{self, fontdb};

/// Builds the font database used to lay out any text in the source SVG.
///
/// System fonts are loaded once here and shared between every render, loading them is by far
/// the slowest part of parsing a small icon.
///
/// # Returns
/// The font database.
pub fn load_fonts() -> Arc<fontdb::Database> {
    let mut fontdb = fontdb::Database::new();
    fontdb.load_system_fonts();

    fontdb.set_serif_family("Times New Roman");
    fontdb.set_sans_serif_family("Arial");
    fontdb.set_cursive_family("Comic Sans MS");
    fontdb.set_fantasy_family("Impact");
    fontdb.set_monospace_family("Courier New");

    log::debug!("Loaded {} font faces", fontdb.len());

    Arc::new(fontdb)
}

/// Parses an SVG file into a tree ready to be rendered.
///
/// # Arguments
/// * `path`: The path to the file, will be used to allow the SVG to link to files in the same
///   directory, for example it will be used if the SVG embeds an image via a link.
/// * `bytes`: The bytes of the file.
/// * `fontdb`: Fonts available to text in the SVG.
///
/// # Returns
/// The parsed SVG if it was successfully parsed, otherwise an error.
///
/// # Errors
/// Parsing errors if a tree cannot be parsed from the provided `bytes`.
#[allow(clippy::module_name_repetitions)]
pub fn parse_svg(
    path: &Path,
    bytes: &[u8],
    fontdb: &Arc<fontdb::Database>,
) -> Result<usvg::Tree, usvg::Error> {
    let options = usvg::Options {
        resources_dir: path.parent().map(Path::to_path_buf),
        font_family: "Times New Roman".to_string(),
        languages: vec!["en-GB".to_string()],
        fontdb: Arc::clone(fontdb),
        ..usvg::Options::default()
    };

    usvg::Tree::from_data(bytes, &options)
}

/// Errors that can occur when loading the source SVG.
#[derive(Debug)]
pub enum SourceReadError {
    /// The file could not be read.
    FailedToReadFile {
        /// The file we tried to read.
        path: PathBuf,
        /// Why reading failed.
        cause: io::Error,
    },
    /// The file was read but is not a usable SVG.
    ErrorParsingSvg {
        /// The file we tried to parse.
        path: PathBuf,
        /// Why parsing failed.
        cause: usvg::Error,
    },
}

impl fmt::Display for SourceReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceReadError::FailedToReadFile { path, cause } => {
                write!(f, "could not read {}: {cause}", path.display())
            }
            SourceReadError::ErrorParsingSvg { path, cause } => {
                write!(f, "could not parse {} as SVG: {cause}", path.display())
            }
        }
    }
}

impl std::error::Error for SourceReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceReadError::FailedToReadFile { cause, .. } => Some(cause),
            SourceReadError::ErrorParsingSvg { cause, .. } => Some(cause),
        }
    }
}

/// The vector image that every icon is rendered from.
///
/// Read once per run and never modified.
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// Where the image was read from.
    path: PathBuf,
    /// The raw bytes of the image.
    bytes: Arc<[u8]>,
}

impl SourceImage {
    /// Reads an SVG from disk and checks that it parses.
    ///
    /// # Arguments
    /// * `path`: The SVG file to read.
    ///
    /// # Returns
    /// The loaded image.
    ///
    /// # Errors
    /// A [`SourceReadError`] if the file cannot be read or is not a valid SVG.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SourceReadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|cause| SourceReadError::FailedToReadFile {
            path: path.to_path_buf(),
            cause,
        })?;

        Self::from_bytes(path, bytes)
    }

    /// Wraps SVG bytes that have already been read, checking that they parse.
    ///
    /// # Arguments
    /// * `path`: Where the bytes came from. Linked resources are resolved relative to it.
    /// * `bytes`: The SVG document.
    ///
    /// # Returns
    /// The loaded image.
    ///
    /// # Errors
    /// [`SourceReadError::ErrorParsingSvg`] if the bytes are not a valid SVG.
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Result<Self, SourceReadError> {
        let path = path.into();
        // Fonts only matter when rendering, an empty database is enough to validate.
        let no_fonts = Arc::new(fontdb::Database::new());
        if let Err(cause) = parse_svg(&path, &bytes, &no_fonts) {
            return Err(SourceReadError::ErrorParsingSvg { path, cause });
        }

        log::debug!("Loaded {} ({} bytes)", path.display(), bytes.len());

        Ok(SourceImage {
            path,
            bytes: bytes.into(),
        })
    }

    /// Gets the path the image was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the raw SVG bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}
