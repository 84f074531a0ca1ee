//! End-to-end runs over generated images.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::SeedableRng;
use walkdir::WalkDir;

use patchprep::image::load_image;
use patchprep::{Config, Dimension, Error, Pipeline};

fn config(seed: u64) -> Config {
    Config {
        valid_extension: "png".to_string(),
        enforced_dimm: Dimension::new(40, 60, 3),
        cropped_dimm: Dimension::new(40, 40, 3),
        sample_dimm: Dimension::new(12, 12, 3),
        train_ratio: 0.7,
        samples_per_image: 3,
        seed: Some(seed),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn write_image(path: &Path, width: u32, height: u32, tint: u8) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 4) as u8, (y * 4) as u8, tint])
    });
    img.save(path).unwrap();
}

fn make_inputs(root: &Path) {
    write_image(&root.join("alpha.png"), 90, 60, 10);
    write_image(&root.join("beta.png"), 60, 40, 20);
    write_image(&root.join("nested/gamma.png"), 45, 80, 30);
    fs::write(root.join("readme.txt"), "not an image").unwrap();
}

/// Relative path -> file bytes for everything under `root`.
fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .map(Result::unwrap)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            (
                e.path().strip_prefix(root).unwrap().to_path_buf(),
                fs::read(e.path()).unwrap(),
            )
        })
        .collect()
}

#[test]
fn test_run_writes_train_and_test() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    make_inputs(input.path());

    let mut pipeline = Pipeline::new(config(7)).unwrap();
    let summary = pipeline.run(input.path(), output.path()).unwrap();

    assert_eq!(summary.images, 3);
    assert_eq!(summary.patches, 9);
    assert_eq!(summary.train, 6);
    assert_eq!(summary.test, 3);

    let files = snapshot(output.path());
    assert_eq!(files.len(), 9);

    let train = files.keys().filter(|p| p.starts_with("train")).count();
    let test = files.keys().filter(|p| p.starts_with("test")).count();
    assert_eq!((train, test), (6, 3));

    for path in files.keys() {
        let first = path.components().next().unwrap().as_os_str();
        assert!(first == "train" || first == "test", "{}", path.display());

        let decoded = load_image(output.path().join(path)).unwrap();
        assert_eq!(decoded.dim(), (12, 12, 3));
    }

    // Every source image contributes indices 0..3 across both splits.
    for stem in ["alpha", "beta", "nested/gamma"] {
        for index in 0..3 {
            let name = format!("{stem}_{index}.png");
            let in_train = files.contains_key(&Path::new("train").join(&name));
            let in_test = files.contains_key(&Path::new("test").join(&name));
            assert!(in_train ^ in_test, "{name} missing or duplicated");
        }
    }
}

#[test]
fn test_seeded_runs_are_identical() {
    let input = tempfile::tempdir().unwrap();
    make_inputs(input.path());

    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();

    Pipeline::new(config(123))
        .unwrap()
        .run(input.path(), first.path())
        .unwrap();
    Pipeline::with_rng(config(0), StdRng::seed_from_u64(123))
        .unwrap()
        .run(input.path(), second.path())
        .unwrap();

    assert_eq!(snapshot(first.path()), snapshot(second.path()));
}

#[test]
fn test_collect_preserves_listing_order() {
    let input = tempfile::tempdir().unwrap();
    make_inputs(input.path());

    let mut pipeline = Pipeline::new(config(5)).unwrap();
    let paths = pipeline.list(input.path()).unwrap();
    let patches = pipeline.collect(&paths, input.path()).unwrap();

    let labels: Vec<_> = patches
        .iter()
        .map(|p| (p.source_id.as_str(), p.index))
        .collect();
    assert_eq!(
        labels,
        vec![
            ("alpha", 0),
            ("alpha", 1),
            ("alpha", 2),
            ("beta", 0),
            ("beta", 1),
            ("beta", 2),
            ("nested/gamma", 0),
            ("nested/gamma", 1),
            ("nested/gamma", 2),
        ]
    );
    assert!(patches.iter().all(|p| p.patch.dim() == (12, 12, 3)));
}

#[test]
fn test_corrupt_image_aborts_before_writing() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    make_inputs(input.path());
    fs::write(input.path().join("broken.png"), b"garbage").unwrap();

    let err = Pipeline::new(config(1))
        .unwrap()
        .run(input.path(), output.path())
        .unwrap_err();

    match err {
        Error::Decode { path, .. } => assert!(path.ends_with("broken.png")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(snapshot(output.path()).is_empty());
}

#[test]
fn test_empty_input_produces_nothing() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    let summary = Pipeline::new(config(1))
        .unwrap()
        .run(input.path(), output.path())
        .unwrap();

    assert_eq!((summary.images, summary.patches), (0, 0));
    assert!(snapshot(output.path()).is_empty());
}

#[test]
fn test_full_train_ratio_leaves_test_empty() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    make_inputs(input.path());

    let summary = Pipeline::new(Config {
        train_ratio: 1.0,
        ..config(2)
    })
    .unwrap()
    .run(input.path(), output.path())
    .unwrap();

    assert_eq!((summary.train, summary.test), (9, 0));
    assert!(!output.path().join("test").exists());
}

#[test]
fn test_scenario_sample_counts() {
    let base = Config {
        enforced_dimm: Dimension::new(270, 480, 3),
        cropped_dimm: Dimension::new(270, 270, 3),
        sample_dimm: Dimension::new(80, 80, 3),
        ..config(0)
    };

    assert!(Pipeline::new(Config {
        samples_per_image: 3,
        ..base.clone()
    })
    .is_ok());

    assert!(matches!(
        Pipeline::new(Config {
            samples_per_image: 10,
            ..base
        }),
        Err(Error::InsufficientArea {
            available: 9,
            requested: 10
        })
    ));
}

#[test]
fn test_config_file_cropped_exceeds_enforced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
valid_extension = "jpg"
enforced_dimm = "10,10,3"
cropped_dimm = "20,20,3"
sample_dimm = "5,5,3"
train_ratio = 0.7
"#,
    )
    .unwrap();

    assert!(matches!(
        Config::load(&path),
        Err(Error::Configuration { .. })
    ));
}

#[test]
fn test_missing_config_file() {
    assert!(matches!(
        Config::load("/definitely/not/here.toml"),
        Err(Error::ConfigRead { .. })
    ));
}

#[test]
fn test_output_root_that_is_a_file_names_the_path() {
    let input = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    make_inputs(input.path());
    let output = scratch.path().join("out");
    fs::write(&output, b"not a directory").unwrap();

    let err = Pipeline::new(config(4))
        .unwrap()
        .run(input.path(), &output)
        .unwrap_err();

    match &err {
        Error::Write { path, .. } => assert!(path.starts_with(&output)),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains(&*output.to_string_lossy()), "{err}");
}

#[test]
#[cfg(target_os = "linux")]
fn test_non_utf8_file_name_fails_with_its_path() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    make_inputs(input.path());
    let odd = input.path().join(OsStr::from_bytes(b"caf\xe9.png"));
    write_image(&odd, 60, 40, 40);

    let err = Pipeline::new(config(6))
        .unwrap()
        .run(input.path(), output.path())
        .unwrap_err();

    assert!(matches!(err, Error::PathFormat { ref path, .. } if *path == odd));
    assert!(snapshot(output.path()).is_empty());
}
