mod common;

use approx::assert_abs_diff_eq;
use candle_core::Device;
use ravensaid::{Error, Ravensaid, ScoreError, MAX_SCORE};
use ravensaid_common::RavensaidConfig;

use common::write_constant_model;

fn small_config() -> RavensaidConfig {
    RavensaidConfig {
        input_bytes: 4,
        hidden_size: 2,
        max_message_bytes: None,
    }
}

#[test]
fn test_load_and_score() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_constant_model(dir.path(), &RavensaidConfig::default(), 0.0);

    let model = Ravensaid::load(&path).unwrap();
    let score = model.score("Nevermore.").unwrap();
    assert_eq!(score.fixed_point(), 5000);
    assert_eq!(score.to_string(), "50.00%");
}

#[test]
fn test_scores_stay_in_range() {
    let dir = tempfile::tempdir().unwrap();
    for logit in [-30.0f32, -3.0, 0.0, 3.0, 30.0] {
        let path = write_constant_model(dir.path(), &RavensaidConfig::default(), logit);
        let model = Ravensaid::load(&path).unwrap();
        let score = model.score("quoth the raven").unwrap().fixed_point();
        assert!((0..=MAX_SCORE).contains(&score), "logit {logit} gave {score}");

        let expected = 1.0 / (1.0 + (-logit as f64).exp());
        assert_abs_diff_eq!(model.probability("x").unwrap(), expected, epsilon = 1e-6);
    }
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Ravensaid::load(dir.path().join("missing.nn"));
    assert!(matches!(result, Err(Error::ModelLoad(_))));
}

#[test]
fn test_load_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.nn");
    std::fs::write(&path, b"this is not a tensor file").unwrap();
    assert!(Ravensaid::load(&path).is_err());
}

#[test]
fn test_load_shape_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    // Saved with a small network, but no config.json: loader expects defaults.
    let path = write_constant_model(dir.path(), &small_config(), 0.0);
    assert!(matches!(Ravensaid::load(&path), Err(Error::ModelLoad(_))));
}

#[test]
fn test_sidecar_config_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let config = small_config();
    let path = write_constant_model(dir.path(), &config, 0.0);
    config.save(&dir.path().join("config.json")).unwrap();

    let model = Ravensaid::load(&path).unwrap();
    assert_eq!(model.config(), &config);
    assert_eq!(model.score("caw").unwrap().fixed_point(), 5000);
}

#[test]
fn test_invalid_messages() {
    let dir = tempfile::tempdir().unwrap();
    let config = RavensaidConfig {
        max_message_bytes: Some(8),
        ..small_config()
    };
    let path = write_constant_model(dir.path(), &config, 0.0);

    let model = Ravensaid::load_with_config(&path, config, Device::Cpu).unwrap();
    assert_eq!(model.score(""), Err(ScoreError::InvalidMessage));
    assert_eq!(model.score("123456789"), Err(ScoreError::InvalidMessage));
    assert!(model.score("12345678").is_ok());
}

#[test]
fn test_long_messages_are_truncated_without_limit() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_constant_model(dir.path(), &RavensaidConfig::default(), 0.0);
    let model = Ravensaid::load(&path).unwrap();
    let long = "caw ".repeat(1000);
    assert_eq!(model.score(&long).unwrap().fixed_point(), 5000);
}

#[test]
fn test_score_loop() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_constant_model(dir.path(), &RavensaidConfig::default(), 0.0);
    let model = Ravensaid::load(&path).unwrap();

    let input = b"hello\r\n\nexit\nnever scored\n";
    let mut output = Vec::new();
    model.score_loop(&input[..], &mut output).unwrap();

    let output = String::from_utf8(output).unwrap();
    assert_eq!(output.matches("Likelihood that Ravenholdt said ^: 50.00%").count(), 1);
    assert_eq!(output.matches("Could not score message").count(), 1);
}

#[test]
fn test_score_loop_stops_at_end_of_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_constant_model(dir.path(), &RavensaidConfig::default(), 0.0);
    let model = Ravensaid::load(&path).unwrap();

    let mut output = Vec::new();
    model.score_loop(&b"one\ntwo"[..], &mut output).unwrap();
    let output = String::from_utf8(output).unwrap();
    assert_eq!(output.matches("Likelihood").count(), 2);
}
