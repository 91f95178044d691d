//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use std::process::{Command, Output};

use prv_sim::sim::engine::Engine;
use prv_sim::sim::types::{ModelParams, SimulationConfig};

/// Reference parameters with both noise sources silenced.
pub fn quiet_params() -> ModelParams {
    ModelParams::default().noise_free()
}

/// Noise-free engine with the given operator settings.
pub fn quiet_engine(config: SimulationConfig) -> Engine {
    Engine::new(quiet_params(), config)
}

/// Operator settings with the schedule off and a fixed manual target.
pub fn manual_target(target_m: f64) -> SimulationConfig {
    SimulationConfig {
        schedule_enabled: false,
        target_value_m: target_m,
        ..SimulationConfig::default()
    }
}

/// Runs the binary with `args` and returns its output.
pub fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_prv-sim"))
        .args(args)
        .output()
        .expect("prv-sim process should run")
}

/// Runs the binary and returns stdout, asserting success.
pub fn run_cli_ok(args: &[&str]) -> String {
    let output = run_cli(args);
    assert!(
        output.status.success(),
        "prv-sim {args:?} failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout should be valid UTF-8")
}

/// Extracts the first number after `label` on the matching summary line.
pub fn parse_metric(stdout: &str, label: &str) -> f64 {
    let line = stdout
        .lines()
        .find(|line| line.trim_start().starts_with(label))
        .unwrap_or_else(|| panic!("missing summary line `{label}` in output: {stdout}"));

    let rest = &line.trim_start()[label.len()..];
    rest.split_whitespace()
        .find_map(|tok| tok.parse::<f64>().ok())
        .unwrap_or_else(|| panic!("no number in summary line `{line}`"))
}

/// Extracts the number following `key` on the line starting with `label`,
/// e.g. `parse_keyed(out, "Critical point:", "mean")`.
pub fn parse_keyed(stdout: &str, label: &str, key: &str) -> f64 {
    let line = stdout
        .lines()
        .find(|line| line.trim_start().starts_with(label))
        .unwrap_or_else(|| panic!("missing summary line `{label}` in output: {stdout}"));

    let mut tokens = line.split_whitespace();
    tokens
        .find(|tok| *tok == key)
        .and_then(|_| tokens.next())
        .and_then(|tok| tok.parse::<f64>().ok())
        .unwrap_or_else(|| panic!("no `{key}` value in summary line `{line}`"))
}
