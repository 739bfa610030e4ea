// tests/verify_tests.rs
//
// End-to-end properties of the verification pipeline, driven through
// the public API of both crates.

use image::RgbImage;
use pillcheck_core::{
    BBox, Detection, Expectation, MismatchReason, RawExpectation,
    alert::{AlertCommand, container_number},
};
use pillcheck_cv::{
    CrossCheckConfig, CrossChecker, MockDetector, PillVerifier, VerifyConfig,
    crosscheck::{Centroid, FeatureExtractor, NearestCentroid},
};

fn det(label: &str, confidence: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> Detection {
    Detection::new(label, confidence, BBox::new(x1, y1, x2, y2))
}

fn verifier_for(detections: Vec<Detection>) -> PillVerifier {
    PillVerifier::new(VerifyConfig::default(), Box::new(MockDetector::new(detections)))
        .expect("default config is valid")
}

#[test]
fn foreign_type_fails_even_with_exact_count() {
    // One red pill as expected, plus one stray blue pill elsewhere.
    let verifier = verifier_for(vec![
        det("red", 0.9, 0.0, 0.0, 30.0, 30.0),
        det("blue", 0.95, 100.0, 100.0, 130.0, 130.0),
    ]);
    let expectation = Expectation::of_label("red").with_count(1);

    let response = verifier.verify(&RgbImage::new(200, 200), &expectation);
    assert!(!response.verdict.pass);
    assert_eq!(response.verdict.mismatch_reason, MismatchReason::ForeignType);
}

#[test]
fn duplicates_collapse_before_counting() {
    // Three raw proposals of the same two aspirin pills; the pair
    // overlapping above the IoU threshold collapses to one.
    let verifier = verifier_for(vec![
        det("aspirin", 0.6, 0.0, 0.0, 20.0, 20.0),
        det("aspirin", 0.7, 1.0, 1.0, 21.0, 21.0),
        det("aspirin", 0.65, 80.0, 80.0, 100.0, 100.0),
    ]);
    let expectation = Expectation::of_label("aspirin").with_count(2);

    let response = verifier.verify(&RgbImage::new(200, 200), &expectation);
    assert!(response.verdict.pass);
    assert_eq!(response.verdict.count, 2);
    assert_eq!(response.verdict.mismatch_reason, MismatchReason::None);
    assert_eq!(response.verdict.classes_detected.len(), 1);
    assert_eq!(response.verdict.classes_detected[0].n, 2);
}

#[test]
fn no_expectation_passes_on_confident_detections() {
    let verifier = verifier_for(vec![det("anything", 0.9, 0.0, 0.0, 30.0, 30.0)]);

    let response = verifier.verify(&RgbImage::new(100, 100), &Expectation::any());
    assert!(response.verdict.pass);
}

#[test]
fn no_expectation_fails_with_no_detection() {
    let verifier = verifier_for(Vec::new());

    let response = verifier.verify(&RgbImage::new(100, 100), &Expectation::any());
    assert!(!response.verdict.pass);
    assert_eq!(response.verdict.mismatch_reason, MismatchReason::NoDetection);
}

#[test]
fn overall_confidence_is_area_weighted() {
    // (0.9*100 + 0.5*300) / 400 = 0.6
    let verifier = verifier_for(vec![
        det("a", 0.9, 0.0, 0.0, 10.0, 10.0),
        det("a", 0.5, 50.0, 0.0, 80.0, 10.0),
    ]);

    let response = verifier.verify(&RgbImage::new(100, 100), &Expectation::any());
    assert!((response.verdict.confidence - 0.6).abs() < 1e-6);
    assert!(response.verdict.pass);
}

#[test]
fn cross_check_with_zero_disagreements_does_not_change_the_verdict() {
    let detections = vec![det("aspirin", 0.9, 20.0, 20.0, 60.0, 60.0)];
    let expectation = Expectation::of_label("aspirin").with_count(1);
    let frame = RgbImage::from_pixel(100, 100, image::Rgb([255, 255, 255]));

    let plain = verifier_for(detections.clone());
    let baseline = plain.verify(&frame, &expectation);

    // A one-class model can only ever agree with the detector.
    let feature_len = FeatureExtractor::new(8).feature_len();
    let model = NearestCentroid::new(vec![Centroid {
        label: "aspirin".into(),
        values: vec![0.5; feature_len],
    }]);
    let checker = CrossChecker::new(CrossCheckConfig::default(), Box::new(model), None);
    let checked = verifier_for(detections).with_cross_checker(checker);
    let response = checked.verify(&frame, &expectation);

    assert_eq!(response.verdict, baseline.verdict);
    assert!(baseline.cross_check.is_none());
    let summary = response.cross_check.expect("cross-check was configured");
    assert_eq!(summary.successful, 1);
    assert!(!summary.foreign_pills_detected);
}

#[test]
fn expectation_payload_aliases_resolve_in_order() {
    let raw: RawExpectation =
        serde_json::from_str(r#"{"pillType": "Ibuprofen", "count": 3}"#).unwrap();
    let expectation = raw.resolve();
    assert_eq!(expectation.label.as_deref(), Some("Ibuprofen"));
    assert_eq!(expectation.count, Some(3));

    let raw: RawExpectation = serde_json::from_str(r#"{}"#).unwrap();
    assert_eq!(raw.resolve(), Expectation::any());
}

#[test]
fn failing_verdict_maps_to_an_alert_command() {
    let verifier = verifier_for(vec![det("blue", 0.9, 0.0, 0.0, 30.0, 30.0)]);
    let expectation = Expectation::of_label("red");

    let response = verifier.verify(&RgbImage::new(100, 100), &expectation);
    assert!(!response.verdict.pass);

    let command = AlertCommand::PillAlert {
        container: container_number("container2"),
    };
    assert_eq!(command.to_line(), "PILLALERT C2\n");
}
