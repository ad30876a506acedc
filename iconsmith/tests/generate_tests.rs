//! End to end tests of icon generation against real files.

use std::path::Path;

use iconsmith::{
    generate_icons, Batch, BatchOptions, CancelFlag, GenerateError, GeneratorConfig, Rasterize,
    RasterizeError, SourceImage, SourceReadError, Stage, TargetSizes,
};
use image::RgbaImage;

/// A square badge: a filled circle on a rounded square.
const ICON_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="64" height="64" viewBox="0 0 64 64">
    <rect x="4" y="4" width="56" height="56" rx="12" fill="#1e88e5"/>
    <circle cx="32" cy="32" r="16" fill="#ffffff"/>
</svg>"##;

/// Writes the test icon to `dir/icon.svg` and loads it.
fn write_source(dir: &Path) -> SourceImage {
    let path = dir.join("icon.svg");
    std::fs::write(&path, ICON_SVG).unwrap();
    SourceImage::load(&path).unwrap()
}

/// Lists the files in a directory, sorted.
fn list(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn sizes(list: &str) -> TargetSizes {
    list.parse().unwrap()
}

#[test]
fn reference_sizes() {
    let source_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let source = write_source(source_dir.path());

    let report = generate_icons(&source, &TargetSizes::reference(), output_dir.path()).unwrap();

    assert_eq!(report.artifacts.len(), 4);
    insta::assert_snapshot!(list(output_dir.path()).join("\n"), @r"
    icon128.png
    icon16.png
    icon32.png
    icon48.png
    ");

    for artifact in &report.artifacts {
        let image = image::open(&artifact.path).unwrap();
        let pixels = artifact.size.pixels();
        assert_eq!(
            (image.width(), image.height()),
            (pixels, pixels),
            "{}",
            artifact.path.display()
        );
        assert_eq!(
            artifact.path,
            output_dir.path().join(format!("icon{pixels}.png")),
            "named by size"
        );
    }
}

#[test]
fn running_twice_gives_identical_files() {
    let source_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let source = write_source(source_dir.path());
    let sizes = sizes("16,48");

    generate_icons(&source, &sizes, output_dir.path()).unwrap();
    let first: Vec<Vec<u8>> = list(output_dir.path())
        .iter()
        .map(|name| std::fs::read(output_dir.path().join(name)).unwrap())
        .collect();

    generate_icons(&source, &sizes, output_dir.path()).unwrap();
    let second: Vec<Vec<u8>> = list(output_dir.path())
        .iter()
        .map(|name| std::fs::read(output_dir.path().join(name)).unwrap())
        .collect();

    assert_eq!(list(output_dir.path()), ["icon16.png", "icon48.png"]);
    assert_eq!(first, second, "outputs are byte-for-byte identical");
}

#[test]
fn no_sizes_writes_nothing() {
    let source_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let source = write_source(source_dir.path());

    let report = generate_icons(&source, &TargetSizes::default(), output_dir.path()).unwrap();

    assert!(report.artifacts.is_empty());
    assert!(list(output_dir.path()).is_empty());
}

#[test]
fn duplicate_sizes_overwrite_the_same_file() {
    let source_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let source = write_source(source_dir.path());

    let report = generate_icons(&source, &sizes("16,16"), output_dir.path()).unwrap();

    assert_eq!(report.artifacts.len(), 2, "both writes are reported");
    assert_eq!(report.artifacts[0].path, report.artifacts[1].path);
    assert_eq!(list(output_dir.path()), ["icon16.png"]);
}

#[test]
fn malformed_source_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("icon.svg");
    std::fs::write(&source, "<svg xmlns=\"http://www.w3.org/2000/svg\"><rect></svg>").unwrap();
    let output_dir = dir.path().join("out");
    std::fs::create_dir(&output_dir).unwrap();

    let config = GeneratorConfig {
        source: source.clone(),
        output_dir: output_dir.clone(),
        ..GeneratorConfig::default()
    };
    let err = iconsmith::run(&config, None).unwrap_err();

    assert!(
        matches!(
            err,
            GenerateError::ReadingSource(SourceReadError::ErrorParsingSvg { ref path, .. })
                if *path == source
        ),
        "got {err:?}"
    );
    assert!(list(&output_dir).is_empty(), "nothing is written");
}

#[test]
fn missing_source_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = GeneratorConfig {
        source: dir.path().join("missing.svg"),
        output_dir: dir.path().to_path_buf(),
        ..GeneratorConfig::default()
    };

    let err = iconsmith::run(&config, None).unwrap_err();

    assert!(
        matches!(
            err,
            GenerateError::ReadingSource(SourceReadError::FailedToReadFile { .. })
        ),
        "got {err:?}"
    );
    assert!(list(dir.path()).is_empty(), "nothing is written");
}

#[test]
fn missing_output_dir_persists_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(dir.path());
    let output_dir = dir.path().join("public");

    let err = generate_icons(&source, &TargetSizes::reference(), &output_dir).unwrap_err();

    let GenerateError::Artifacts(errors) = err else {
        panic!("expected an artifact failure, got {err:?}");
    };
    assert_eq!(errors.len(), 1, "the batch halts at the first failure");
    assert_eq!(errors[0].index, 0);
    assert_eq!(errors[0].stage(), Stage::Write);
    assert!(!output_dir.exists(), "the output directory is not created");
    assert_eq!(list(dir.path()), ["icon.svg"]);
}

/// Renders blank icons, failing at exactly one size.
struct FailsAt(u32);

impl Rasterize for FailsAt {
    fn rasterize(
        &self,
        _source: &SourceImage,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, RasterizeError> {
        if width == self.0 {
            Err(RasterizeError::FailedToCreatePixmap { width, height })
        } else {
            Ok(RgbaImage::new(width, height))
        }
    }
}

#[test]
fn failure_is_reported_with_size_and_stage() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(dir.path());
    let output_dir = dir.path().join("out");
    std::fs::create_dir(&output_dir).unwrap();

    let err = Batch::new(FailsAt(32), BatchOptions::default())
        .run(&source, &TargetSizes::reference(), &output_dir)
        .unwrap_err();

    insta::assert_snapshot!(err.to_string(), @r"
    1 icon(s) failed
      32px icon (#1) failed while rasterizing: could not allocate a 32x32 pixmap
    ");
    assert_eq!(list(&output_dir), ["icon16.png"]);
}

#[test]
fn cancelled_run_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(dir.path());
    let output_dir = dir.path().join("out");
    std::fs::create_dir(&output_dir).unwrap();

    let cancel = CancelFlag::new();
    cancel.cancel();
    let options = BatchOptions {
        cancel: Some(cancel),
        ..BatchOptions::default()
    };

    let err = Batch::new(FailsAt(0), options)
        .run(&source, &TargetSizes::reference(), &output_dir)
        .unwrap_err();

    insta::assert_snapshot!(err.to_string(), @"cancelled after 0 icon(s) were written");
    assert!(list(&output_dir).is_empty());
}

#[test]
fn config_controls_the_run() {
    let dir = tempfile::tempdir().unwrap();
    write_source(dir.path());
    let output_dir = dir.path().join("out");
    std::fs::create_dir(&output_dir).unwrap();

    let config_path = dir.path().join("icons.json");
    let config_json = serde_json::json!({
        "source": dir.path().join("icon.svg"),
        "output_dir": output_dir,
        "sizes": [24, 96],
        "file_prefix": "favicon-",
        "fit": "contain",
        "workers": 2,
    });
    std::fs::write(&config_path, config_json.to_string()).unwrap();

    let config = GeneratorConfig::load(&config_path).unwrap();
    let report = iconsmith::run(&config, None).unwrap();

    assert_eq!(report.artifacts.len(), 2);
    assert_eq!(list(&output_dir), ["favicon-24.png", "favicon-96.png"]);
    let image = image::open(output_dir.join("favicon-96.png")).unwrap();
    assert_eq!((image.width(), image.height()), (96, 96));
}
