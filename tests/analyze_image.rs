mod common;

use image::{Rgb, RgbImage};
use reversi_analyzer::config::VisionSettings;
use reversi_analyzer::error::AnalyzerError;
use reversi_analyzer::vision::{AnalysisResponse, Completion, ImageAnalyzer};
use std::sync::mpsc;

/// Collects whatever the analyzer reports, counting the calls.
struct Recorder(mpsc::Sender<Result<AnalysisResponse, (&'static str, String)>>);

impl Completion for Recorder {
    fn resolve(self, response: AnalysisResponse) {
        self.0.send(Ok(response)).unwrap();
    }

    fn reject(self, code: &'static str, message: String) {
        self.0.send(Err((code, message))).unwrap();
    }
}

fn run(analyzer: &ImageAnalyzer, path: &std::path::Path) -> Vec<Result<AnalysisResponse, (&'static str, String)>> {
    let (tx, rx) = mpsc::channel();
    analyzer.analyze_image(path, Recorder(tx));
    rx.try_iter().collect()
}

#[test]
fn any_loadable_image_resolves_with_an_empty_board() {
    let dir = tempfile::tempdir().unwrap();
    let analyzer = ImageAnalyzer::default();

    let board = common::save(&common::screenshot(&common::opening_discs()), dir.path(), "board.png");
    let noise = common::save(
        &RgbImage::from_fn(64, 48, |x, y| Rgb([(x * 37 % 256) as u8, (y * 91 % 256) as u8, 7])),
        dir.path(),
        "noise.jpg",
    );

    for path in [board, noise] {
        let reports = run(&analyzer, &path);
        assert_eq!(reports, vec![Ok(AnalysisResponse::empty_success())]);
    }
}

#[test]
fn unloadable_files_reject_with_load_failure() {
    let dir = tempfile::tempdir().unwrap();
    let text = dir.path().join("notes.txt");
    std::fs::write(&text, "not an image").unwrap();
    let analyzer = ImageAnalyzer::default();

    for path in [dir.path().join("missing.png"), text] {
        let reports = run(&analyzer, &path);
        assert_eq!(
            reports,
            vec![Err(("ERROR", AnalyzerError::LOAD_FAILED.to_string()))]
        );
    }
}

#[test]
fn preprocessing_failure_rejects_with_its_message() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::save(&RgbImage::new(30, 30), dir.path(), "dark.png");
    let analyzer = ImageAnalyzer::new(&VisionSettings::default().with_block_size(1));

    let reports = run(&analyzer, &path);
    assert_eq!(reports.len(), 1);
    let (code, message) = reports[0].clone().unwrap_err();
    assert_eq!(code, "ERROR");
    assert!(message.contains("block size"), "{message}");
}

#[test]
fn misnamed_images_still_resolve() {
    let dir = tempfile::tempdir().unwrap();
    let png = common::save(&common::screenshot(&common::opening_discs()), dir.path(), "board.png");
    let analyzer = ImageAnalyzer::default();

    for name in ["capture", "capture.tmp", "capture.jpg"] {
        let path = dir.path().join(name);
        std::fs::copy(&png, &path).unwrap();
        assert_eq!(
            run(&analyzer, &path),
            vec![Ok(AnalysisResponse::empty_success())],
            "{name}"
        );
    }
}

#[test]
fn truncated_png_rejects_with_load_failure() {
    let dir = tempfile::tempdir().unwrap();
    let png = common::save(
        &RgbImage::from_fn(120, 90, |x, y| Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, 40])),
        dir.path(),
        "full.png",
    );
    let bytes = std::fs::read(&png).unwrap();
    let truncated = dir.path().join("truncated.png");
    std::fs::write(&truncated, &bytes[..bytes.len() / 2]).unwrap();

    assert_eq!(
        run(&ImageAnalyzer::default(), &truncated),
        vec![Err(("ERROR", AnalyzerError::LOAD_FAILED.to_string()))]
    );
}
