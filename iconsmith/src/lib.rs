//! `iconsmith`
//!
//! Renders a single SVG into a set of square PNG icons, one per requested size.
//!
//! Each size is an independent job: render the SVG, encode the pixels as a PNG and write it to
//! `{output_dir}/{prefix}{size}.png`. Files are replaced atomically so a failed job never leaves
//! a partial icon behind.

pub mod artifact;
pub mod batch;
pub mod config;
pub mod raster;
pub mod sizes;
pub mod svg;

use std::path::Path;

pub use artifact::Artifact;
pub use batch::{
    ArtifactError, ArtifactFailure, Batch, BatchOptions, BatchReport, CancelFlag, FailurePolicy,
    GenerateError, IconJob, Stage,
};
pub use config::GeneratorConfig;
pub use raster::{Fit, Rasterize, RasterizeError, ResvgRasterizer};
pub use sizes::{TargetSize, TargetSizes};
pub use svg::{SourceImage, SourceReadError};

/// Renders `source` at every size in `sizes` into `output_dir`, stopping at the first failure.
///
/// # Arguments
/// * `source`: The image to render.
/// * `sizes`: The sizes to render, may be empty.
/// * `output_dir`: An existing directory to write icons to.
///
/// # Returns
/// A report of every icon written.
///
/// # Errors
/// [`GenerateError::Artifacts`] naming the size and step that failed.
pub fn generate_icons(
    source: &SourceImage,
    sizes: &TargetSizes,
    output_dir: &Path,
) -> Result<BatchReport, GenerateError> {
    Batch::new(ResvgRasterizer::new(Fit::default()), BatchOptions::default())
        .run(source, sizes, output_dir)
}

/// Loads the source image and renders every icon described by `config`.
///
/// # Arguments
/// * `config`: The paths, sizes and settings for the run.
/// * `cancel`: Raised by the caller to stop the run between icons.
///
/// # Returns
/// A report of every icon written.
///
/// # Errors
/// [`GenerateError::ReadingSource`] before anything is written if the source cannot be loaded,
/// otherwise any error from [`Batch::run`].
pub fn run(
    config: &GeneratorConfig,
    cancel: Option<CancelFlag>,
) -> Result<BatchReport, GenerateError> {
    let source = SourceImage::load(&config.source)?;

    let options = BatchOptions {
        cancel,
        ..config.batch_options()
    };
    let batch = Batch::new(ResvgRasterizer::new(config.fit), options);

    batch.run(&source, &config.sizes, &config.output_dir)
}
