//! `raster`
//!
//! Turns the source SVG into pixels.

use std::{fmt, sync::Arc};

use image::RgbaImage;
use resvg::{
    tiny_skia::{Pixmap, Transform},
    usvg::{self, fontdb},
};
use serde::{Deserialize, Serialize};

use crate::svg::{load_fonts, parse_svg, SourceImage};

/// How a source image that is not square is placed on a square icon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Fit {
    /// Scale until the icon is completely covered, centring the image and cropping the overflow.
    #[default]
    Cover,
    /// Scale until the whole image fits, centring it and leaving the remainder transparent.
    Contain,
    /// Stretch each axis independently to fill the icon.
    Fill,
}

impl Fit {
    /// Works out the transform that maps the source image onto the output.
    ///
    /// # Arguments
    /// * `source_width`: Width of the source image in SVG units.
    /// * `source_height`: Height of the source image in SVG units.
    /// * `width`: Width of the output in pixels.
    /// * `height`: Height of the output in pixels.
    ///
    /// # Returns
    /// The transform to render the source with.
    #[allow(clippy::cast_precision_loss)]
    pub fn transform(
        self,
        source_width: f32,
        source_height: f32,
        width: u32,
        height: u32,
    ) -> Transform {
        let width = width as f32;
        let height = height as f32;
        let scale_x = width / source_width;
        let scale_y = height / source_height;

        let scale = match self {
            Fit::Fill => return Transform::from_scale(scale_x, scale_y),
            Fit::Cover => scale_x.max(scale_y),
            Fit::Contain => scale_x.min(scale_y),
        };

        let offset_x = (width - source_width * scale) / 2.0;
        let offset_y = (height - source_height * scale) / 2.0;
        Transform::from_scale(scale, scale).post_translate(offset_x, offset_y)
    }
}

impl fmt::Display for Fit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Fit::Cover => "cover",
            Fit::Contain => "contain",
            Fit::Fill => "fill",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while rendering a single icon.
#[derive(Debug)]
pub enum RasterizeError {
    /// The source could not be parsed for this render.
    ErrorParsingSvg(usvg::Error),
    /// A pixel buffer of the requested size could not be allocated.
    /// Happens for zero sized or enormous requests.
    FailedToCreatePixmap {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// The rasterizer produced an image of a different size to the one requested.
    UnexpectedDimensions {
        /// The size that was requested.
        expected: (u32, u32),
        /// The size that was produced.
        actual: (u32, u32),
    },
}

impl fmt::Display for RasterizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterizeError::ErrorParsingSvg(err) => write!(f, "could not parse SVG: {err}"),
            RasterizeError::FailedToCreatePixmap { width, height } => {
                write!(f, "could not allocate a {width}x{height} pixmap")
            }
            RasterizeError::UnexpectedDimensions { expected, actual } => write!(
                f,
                "expected a {}x{} image but got {}x{}",
                expected.0, expected.1, actual.0, actual.1
            ),
        }
    }
}

impl std::error::Error for RasterizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RasterizeError::ErrorParsingSvg(err) => Some(err),
            _ => None,
        }
    }
}

/// Something that can render the source image at a given size.
///
/// Implementors are shared between worker threads, so must be [`Sync`].
pub trait Rasterize: Sync {
    /// Renders the source image.
    ///
    /// # Arguments
    /// * `source`: The image to render.
    /// * `width`: Width of the output in pixels.
    /// * `height`: Height of the output in pixels.
    ///
    /// # Returns
    /// A `width` by `height` image with straight (not premultiplied) alpha.
    ///
    /// # Errors
    /// A [`RasterizeError`] if the image cannot be rendered at this size.
    fn rasterize(
        &self,
        source: &SourceImage,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, RasterizeError>;
}

/// Renders SVGs on the CPU with `resvg`.
pub struct ResvgRasterizer {
    /// Fonts available to text in the SVG.
    fontdb: Arc<fontdb::Database>,
    /// How non-square sources are placed.
    fit: Fit,
}

impl ResvgRasterizer {
    /// Creates a new [`ResvgRasterizer`] with the system fonts loaded.
    ///
    /// # Arguments
    /// * `fit`: How non-square sources are placed on the icon.
    pub fn new(fit: Fit) -> Self {
        Self::with_fonts(load_fonts(), fit)
    }

    /// Creates a new [`ResvgRasterizer`] with a specific set of fonts.
    ///
    /// # Arguments
    /// * `fontdb`: Fonts available to text in the SVG.
    /// * `fit`: How non-square sources are placed on the icon.
    pub fn with_fonts(fontdb: Arc<fontdb::Database>, fit: Fit) -> Self {
        ResvgRasterizer { fontdb, fit }
    }
}

impl Rasterize for ResvgRasterizer {
    fn rasterize(
        &self,
        source: &SourceImage,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, RasterizeError> {
        let tree = parse_svg(source.path(), source.bytes(), &self.fontdb)
            .map_err(RasterizeError::ErrorParsingSvg)?;

        let mut pixmap = Pixmap::new(width, height)
            .ok_or(RasterizeError::FailedToCreatePixmap { width, height })?;
        let size = tree.size();
        let transform = self.fit.transform(size.width(), size.height(), width, height);
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        pixmap_to_image(&pixmap)
    }
}

/// Converts a rendered pixmap into an image.
///
/// `tiny-skia` stores premultiplied alpha, images expect straight alpha.
///
/// # Arguments
/// * `pixmap`: The rendered pixmap.
///
/// # Returns
/// The image.
///
/// # Errors
/// [`RasterizeError::UnexpectedDimensions`] if the pixel data does not cover the pixmap.
fn pixmap_to_image(pixmap: &Pixmap) -> Result<RgbaImage, RasterizeError> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let data: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|pixel| {
            let colour = pixel.demultiply();
            [colour.red(), colour.green(), colour.blue(), colour.alpha()]
        })
        .collect();

    RgbaImage::from_vec(width, height, data).ok_or(RasterizeError::UnexpectedDimensions {
        expected: (width, height),
        actual: (width, 0),
    })
}
