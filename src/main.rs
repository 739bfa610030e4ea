use anyhow::{Context, Result};
use pillcheck_core::{Expectation, RawExpectation};
use pillcheck_cv::{PillVerifier, StaticDetector, VerifyConfig};
use std::env;
use std::process::ExitCode;

fn usage() -> ! {
    eprintln!("Usage: pillcheck <detections.json> [expected-json]");
    eprintln!();
    eprintln!("  detections.json  precomputed detector output for one frame");
    eprintln!("  expected-json    e.g. '{{\"pill\": \"aspirin\", \"count\": 2}}'");
    std::process::exit(2);
}

fn parse_expectation(raw: &str) -> Result<Expectation> {
    let parsed: RawExpectation =
        serde_json::from_str(raw).context("expected must be a JSON object")?;
    Ok(parsed.resolve())
}

fn run() -> Result<bool> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        usage();
    }

    let detector = StaticDetector::from_json_file(&args[1])?;
    let expectation = match args.get(2) {
        Some(raw) => parse_expectation(raw)?,
        None => Expectation::any(),
    };

    log::debug!("expectation: {expectation:?}");

    let verifier = PillVerifier::new(VerifyConfig::default(), Box::new(detector))?;

    // The fixture already carries the detections; the frame is a stub.
    let frame = image::RgbImage::new(1, 1);
    let response = verifier.verify(&frame, &expectation);

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(response.verdict.pass)
}

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("pillcheck: {e:#}");
            ExitCode::from(2)
        }
    }
}
