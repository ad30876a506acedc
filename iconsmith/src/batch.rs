//! `batch`
//!
//! Renders every requested size of icon, one independent job per size.

use std::{
    fmt,
    num::NonZeroUsize,
    path::Path,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use crate::{
    artifact::{artifact_file_name, encode_png, write_atomically, Artifact, DEFAULT_FILE_PREFIX},
    raster::{Rasterize, RasterizeError},
    sizes::{TargetSize, TargetSizes},
    svg::{SourceImage, SourceReadError},
};

/// What to do once an icon fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop starting new icons after the first failure.
    #[default]
    HaltOnFirst,
    /// Carry on with every other icon and report all of the failures at the end.
    CollectAll,
}

/// Lets the caller stop a batch between icons.
///
/// Icons already being rendered are allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates a new flag that has not been raised.
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks any batch using this flag to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Checks whether the flag has been raised.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Settings for a batch.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Prefix of every output file name, the size and extension are appended.
    pub file_prefix: String,
    /// What to do once an icon fails.
    pub failure_policy: FailurePolicy,
    /// How many icons may be rendered at once.
    pub workers: NonZeroUsize,
    /// Checked before each icon is started.
    pub cancel: Option<CancelFlag>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        BatchOptions {
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            failure_policy: FailurePolicy::default(),
            workers: NonZeroUsize::MIN,
            cancel: None,
        }
    }
}

/// The step of producing an icon that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Rendering the SVG to pixels.
    Rasterize,
    /// Encoding the pixels as a PNG.
    Encode,
    /// Writing the PNG to disk.
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Rasterize => "rasterizing",
            Stage::Encode => "encoding",
            Stage::Write => "writing",
        };
        f.write_str(name)
    }
}

/// The underlying cause of an icon failing.
#[derive(Debug)]
pub enum ArtifactFailure {
    /// The SVG could not be rendered at this size.
    Rasterize(RasterizeError),
    /// The pixels could not be encoded.
    Encode(image::ImageError),
    /// The file could not be written.
    Write(std::io::Error),
}

impl ArtifactFailure {
    /// Gets the step that failed.
    pub fn stage(&self) -> Stage {
        match self {
            ArtifactFailure::Rasterize(_) => Stage::Rasterize,
            ArtifactFailure::Encode(_) => Stage::Encode,
            ArtifactFailure::Write(_) => Stage::Write,
        }
    }
}

impl fmt::Display for ArtifactFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactFailure::Rasterize(err) => write!(f, "{err}"),
            ArtifactFailure::Encode(err) => write!(f, "{err}"),
            ArtifactFailure::Write(err) => write!(f, "{err}"),
        }
    }
}

/// A single icon that could not be produced.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct ArtifactError {
    /// Position of the size in the requested sizes.
    pub index: usize,
    /// The size that failed.
    pub size: TargetSize,
    /// What went wrong.
    pub cause: ArtifactFailure,
}

impl ArtifactError {
    /// Gets the step that failed.
    pub fn stage(&self) -> Stage {
        self.cause.stage()
    }
}

impl fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}px icon (#{}) failed while {}: {}",
            self.size,
            self.index,
            self.stage(),
            self.cause
        )
    }
}

impl std::error::Error for ArtifactError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.cause {
            ArtifactFailure::Rasterize(err) => Some(err),
            ArtifactFailure::Encode(err) => Some(err),
            ArtifactFailure::Write(err) => Some(err),
        }
    }
}

/// Errors that can stop a batch.
#[derive(Debug)]
pub enum GenerateError {
    /// The source image could not be loaded, nothing was written.
    ReadingSource(SourceReadError),
    /// One or more icons failed, sorted by their position in the requested sizes.
    /// Icons that succeeded remain on disk.
    Artifacts(Vec<ArtifactError>),
    /// The batch was cancelled.
    Cancelled {
        /// How many icons were written before the batch stopped.
        completed: usize,
    },
}

impl From<SourceReadError> for GenerateError {
    fn from(value: SourceReadError) -> Self {
        GenerateError::ReadingSource(value)
    }
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerateError::ReadingSource(err) => write!(f, "{err}"),
            GenerateError::Artifacts(errors) => {
                write!(f, "{} icon(s) failed", errors.len())?;
                for err in errors {
                    write!(f, "\n  {err}")?;
                }
                Ok(())
            }
            GenerateError::Cancelled { completed } => {
                write!(f, "cancelled after {completed} icon(s) were written")
            }
        }
    }
}

impl std::error::Error for GenerateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenerateError::ReadingSource(err) => Some(err),
            GenerateError::Artifacts(errors) => errors
                .first()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            GenerateError::Cancelled { .. } => None,
        }
    }
}

/// The outcome of a batch where every icon was written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// The icons written, in the order the sizes were requested.
    pub artifacts: Vec<Artifact>,
}

/// One unit of work: render, encode and write a single size.
///
/// Jobs never depend on each other. Each owns its pixels and output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconJob {
    /// Position of the size in the requested sizes.
    pub index: usize,
    /// The size to render.
    pub size: TargetSize,
    /// Name of the file within the output directory.
    pub file_name: String,
}

impl IconJob {
    /// Creates one job per requested size.
    ///
    /// # Arguments
    /// * `sizes`: The sizes to render.
    /// * `file_prefix`: Prefix of every output file name.
    ///
    /// # Returns
    /// The jobs, in the same order as `sizes`.
    pub fn plan(sizes: &TargetSizes, file_prefix: &str) -> Vec<IconJob> {
        sizes
            .iter()
            .enumerate()
            .map(|(index, size)| IconJob {
                index,
                size,
                file_name: artifact_file_name(file_prefix, size),
            })
            .collect()
    }

    /// Produces this job's icon.
    ///
    /// # Arguments
    /// * `rasterizer`: Renders the source.
    /// * `source`: The image to render.
    /// * `output_dir`: Where to write the icon.
    ///
    /// # Returns
    /// The written icon.
    ///
    /// # Errors
    /// An [`ArtifactError`] naming the step that failed.
    pub fn run(
        &self,
        rasterizer: &dyn Rasterize,
        source: &SourceImage,
        output_dir: &Path,
    ) -> Result<Artifact, ArtifactError> {
        let fail = |cause| ArtifactError {
            index: self.index,
            size: self.size,
            cause,
        };
        let pixels = self.size.pixels();

        let image = rasterizer
            .rasterize(source, pixels, pixels)
            .map_err(|err| fail(ArtifactFailure::Rasterize(err)))?;
        if image.dimensions() != (pixels, pixels) {
            return Err(fail(ArtifactFailure::Rasterize(
                RasterizeError::UnexpectedDimensions {
                    expected: (pixels, pixels),
                    actual: image.dimensions(),
                },
            )));
        }

        let png = encode_png(&image).map_err(|err| fail(ArtifactFailure::Encode(err)))?;
        let path = write_atomically(output_dir, &self.file_name, &png)
            .map_err(|err| fail(ArtifactFailure::Write(err)))?;

        log::info!("Wrote {} ({}x{})", path.display(), self.size, self.size);

        Ok(Artifact {
            size: self.size,
            path,
        })
    }
}

/// Renders a set of icons from one source image.
pub struct Batch<R> {
    /// Renders the source.
    rasterizer: R,
    /// Settings for the batch.
    options: BatchOptions,
}

impl<R: Rasterize> Batch<R> {
    /// Creates a new [`Batch`].
    ///
    /// # Arguments
    /// * `rasterizer`: Renders the source.
    /// * `options`: Settings for the batch.
    pub fn new(rasterizer: R, options: BatchOptions) -> Self {
        Batch {
            rasterizer,
            options,
        }
    }

    /// Gets the settings for the batch.
    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Renders every size and writes it to `output_dir`.
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
    /// [`GenerateError::Artifacts`] if any icon failed, or [`GenerateError::Cancelled`] if the
    /// cancel flag was raised.
    pub fn run(
        &self,
        source: &SourceImage,
        sizes: &TargetSizes,
        output_dir: &Path,
    ) -> Result<BatchReport, GenerateError> {
        let jobs = IconJob::plan(sizes, &self.options.file_prefix);
        let workers = self.options.workers.get().min(jobs.len());

        log::debug!(
            "Rendering {} icon(s) from {} into {} with {} worker(s)",
            jobs.len(),
            source.path().display(),
            output_dir.display(),
            workers.max(1)
        );

        let outcome = if workers > 1 {
            self.run_concurrently(&jobs, workers, source, output_dir)
        } else {
            self.run_sequentially(&jobs, source, output_dir)
        };

        outcome.finish()
    }

    /// Runs the jobs one after another, in order.
    fn run_sequentially(
        &self,
        jobs: &[IconJob],
        source: &SourceImage,
        output_dir: &Path,
    ) -> Outcome {
        let mut outcome = Outcome::default();

        for job in jobs {
            if self.is_cancelled() {
                outcome.cancelled = true;
                break;
            }

            match job.run(&self.rasterizer, source, output_dir) {
                Ok(artifact) => outcome.completed.push((job.index, artifact)),
                Err(err) => {
                    log::error!("{err}");
                    outcome.failed.push(err);
                    if self.options.failure_policy == FailurePolicy::HaltOnFirst {
                        break;
                    }
                }
            }
        }

        outcome
    }

    /// Runs the jobs on a pool of `workers` threads which take jobs in order from a shared cursor.
    fn run_concurrently(
        &self,
        jobs: &[IconJob],
        workers: usize,
        source: &SourceImage,
        output_dir: &Path,
    ) -> Outcome {
        let next_job = AtomicUsize::new(0);
        let halted = AtomicBool::new(false);
        let outcome = Mutex::new(Outcome::default());

        std::thread::scope(|scope| {
            for worker in 0..workers {
                let (next_job, halted, outcome) = (&next_job, &halted, &outcome);
                scope.spawn(move || loop {
                    if halted.load(Ordering::SeqCst) {
                        return;
                    }
                    let Some(job) = jobs.get(next_job.fetch_add(1, Ordering::SeqCst)) else {
                        return;
                    };
                    // Only a job that was about to start counts as cancelled work.
                    if self.is_cancelled() {
                        lock(outcome).cancelled = true;
                        return;
                    }

                    log::debug!("Worker {worker} rendering {}px icon", job.size);
                    let result = job.run(&self.rasterizer, source, output_dir);

                    let mut outcome = lock(outcome);
                    match result {
                        Ok(artifact) => outcome.completed.push((job.index, artifact)),
                        Err(err) => {
                            log::error!("{err}");
                            outcome.failed.push(err);
                            if self.options.failure_policy == FailurePolicy::HaltOnFirst {
                                halted.store(true, Ordering::SeqCst);
                            }
                        }
                    }
                });
            }
        });

        outcome
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Checks whether the caller has asked the batch to stop.
    fn is_cancelled(&self) -> bool {
        self.options
            .cancel
            .as_ref()
            .is_some_and(CancelFlag::is_cancelled)
    }
}

/// Locks the shared outcome, carrying on if another worker panicked while holding it.
fn lock(outcome: &Mutex<Outcome>) -> std::sync::MutexGuard<'_, Outcome> {
    outcome
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// What happened to the jobs of a batch.
#[derive(Default)]
struct Outcome {
    /// Icons written, with the index of their job.
    completed: Vec<(usize, Artifact)>,
    /// Icons that failed.
    failed: Vec<ArtifactError>,
    /// Whether the batch stopped because it was cancelled.
    cancelled: bool,
}

impl Outcome {
    /// Turns the outcome into the result of the batch.
    ///
    /// Failures take priority over cancellation, so nothing that went wrong is hidden.
    fn finish(mut self) -> Result<BatchReport, GenerateError> {
        if !self.failed.is_empty() {
            self.failed.sort_by_key(|err| err.index);
            return Err(GenerateError::Artifacts(self.failed));
        }

        if self.cancelled {
            log::warn!("Cancelled after {} icon(s)", self.completed.len());
            return Err(GenerateError::Cancelled {
                completed: self.completed.len(),
            });
        }

        self.completed.sort_by_key(|(index, _)| *index);
        Ok(BatchReport {
            artifacts: self
                .completed
                .into_iter()
                .map(|(_, artifact)| artifact)
                .collect(),
        })
    }
}
