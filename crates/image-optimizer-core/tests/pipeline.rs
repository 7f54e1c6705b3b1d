//! End-to-end tests for the optimization pipeline: load from disk, run a
//! batch, export the results.

mod common;

use std::sync::atomic::AtomicBool;

use image_optimizer_core::{
    Config, ImageFormat, ImageOptimizer, ItemState, OptimizationOptions,
};

#[test]
fn full_pipeline_loads_runs_and_exports() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    let paths = vec![
        common::write_png(input.path(), "first.png", 2400, 1600),
        common::write_png(input.path(), "second.png", 640, 480),
    ];

    let config = Config {
        output_dir: output.path().to_path_buf(),
        ..Default::default()
    };
    let optimizer = ImageOptimizer::new(config).unwrap();

    let images = optimizer.load_images(&paths).unwrap();
    assert_eq!(images.len(), 2);

    let cancel = AtomicBool::new(false);
    let mut events = Vec::new();
    let processed = optimizer
        .run(images, &cancel, |e| events.push(e))
        .unwrap();

    assert!(processed.iter().all(|i| i.state == ItemState::Succeeded));
    assert_eq!(events.last().unwrap().percent, 100.0);

    // Oversized input was constrained to the default 1920x1080 box
    let first = processed[0].result.as_ref().unwrap();
    assert_eq!((first.width, first.height), (1620, 1080));

    let written = optimizer.export(&processed).unwrap();
    assert_eq!(written.len(), 2);
    assert!(output.path().join("first.jpg").exists());
    assert!(output.path().join("second.jpg").exists());

    // Exported bytes are decodable in the requested format
    let bytes = std::fs::read(output.path().join("first.jpg")).unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!(decoded.width(), 1620);
}

#[test]
fn corrupt_file_fails_in_isolation() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    let paths = vec![
        common::write_png(input.path(), "good.png", 200, 200),
        common::write_garbage(input.path(), "bad.png"),
        common::write_png(input.path(), "also-good.png", 300, 200),
    ];

    let config = Config {
        output_dir: output.path().to_path_buf(),
        ..Default::default()
    };
    let optimizer = ImageOptimizer::new(config).unwrap();
    let images = optimizer.load_images(&paths).unwrap();

    let cancel = AtomicBool::new(false);
    let processed = optimizer.run(images, &cancel, |_| {}).unwrap();

    assert_eq!(processed.len(), 3);
    assert_eq!(processed[0].state, ItemState::Succeeded);
    assert_eq!(processed[1].state, ItemState::Failed);
    assert_eq!(processed[2].state, ItemState::Succeeded);

    // Only the succeeded items are exported
    let written = optimizer.export(&processed).unwrap();
    assert_eq!(written.len(), 2);
}

#[test]
fn webp_output_round_trips() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    let paths = vec![common::write_png(input.path(), "photo.png", 512, 384)];
    let config = Config {
        options: OptimizationOptions {
            format: ImageFormat::WebP,
            quality: 0.7,
            ..Default::default()
        },
        output_dir: output.path().to_path_buf(),
        ..Default::default()
    };
    let optimizer = ImageOptimizer::new(config).unwrap();
    let images = optimizer.load_images(&paths).unwrap();

    let cancel = AtomicBool::new(false);
    let processed = optimizer.run(images, &cancel, |_| {}).unwrap();
    optimizer.export(&processed).unwrap();

    let bytes = std::fs::read(output.path().join("photo.webp")).unwrap();
    let decoded = image::load_from_memory_with_format(&bytes, image::ImageFormat::WebP).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (512, 384));
}

#[test]
fn unsupported_input_extension_is_rejected_at_load() {
    let input = tempfile::tempdir().unwrap();
    let path = input.path().join("scan.tiff");
    std::fs::write(&path, b"whatever").unwrap();

    let optimizer = ImageOptimizer::new(Config::default()).unwrap();
    assert!(optimizer.load_images(&[path]).is_err());
}
