//! `generate-icons`
//!
//! Renders `public/icon.svg` into `public/icon{16,32,48,128}.png`, or whatever the flags or
//! config file ask for instead.

use std::{num::NonZeroUsize, path::PathBuf, process::ExitCode};

use clap::Parser;
use iconsmith::{Fit, GeneratorConfig, TargetSizes};

/// Renders an SVG into a set of square PNG icons.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// JSON config file, flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    /// The SVG to render.
    #[arg(long)]
    source: Option<PathBuf>,
    /// The existing directory to write icons to.
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Comma separated sizes in pixels, e.g. `16,32,48,128`.
    #[arg(long)]
    sizes: Option<TargetSizes>,
    /// Prefix of every output file name.
    #[arg(long)]
    prefix: Option<String>,
    /// How a non-square SVG is placed on the icon.
    #[arg(long, value_enum)]
    fit: Option<Fit>,
    /// How many icons may be rendered at once.
    #[arg(long)]
    jobs: Option<NonZeroUsize>,
    /// Carry on after an icon fails and report every failure.
    #[arg(long)]
    keep_going: bool,
}

impl Args {
    /// Builds the config for this run, starting from the config file if one was given.
    ///
    /// # Errors
    /// A [`iconsmith::config::ConfigError`] if the config file cannot be loaded.
    fn into_config(self) -> Result<GeneratorConfig, iconsmith::config::ConfigError> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::load(path)?,
            None => GeneratorConfig::default(),
        };

        if let Some(source) = self.source {
            config.source = source;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(sizes) = self.sizes {
            config.sizes = sizes;
        }
        if let Some(prefix) = self.prefix {
            config.file_prefix = prefix;
        }
        if let Some(fit) = self.fit {
            config.fit = fit;
        }
        if let Some(jobs) = self.jobs {
            config.workers = jobs;
        }
        config.keep_going |= self.keep_going;

        Ok(config)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Args::parse().into_config() {
        Ok(config) => config,
        Err(err) => {
            log::error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    match iconsmith::run(&config, None) {
        Ok(report) => {
            log::info!(
                "Generated {} icon(s) in {}",
                report.artifacts.len(),
                config.output_dir.display()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("Error generating icons: {err}");
            ExitCode::FAILURE
        }
    }
}
