// End-to-end tests for the importtime_waterfall binary.
// None of these start a Python interpreter: traces come from a fixture file,
// a temporary file, or stdin.

use predicates::prelude::*;
use std::io::Write;
use std::path::PathBuf;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample_importtime_output")
}

fn command() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("importtime_waterfall")
}

#[test]
fn json_from_input_file() {
    let output = command().arg("--input").arg(fixture()).output().unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let top = value.as_array().unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0]["name"], "a");
    assert_eq!(top[1]["name"], "b");
    assert_eq!(top[1]["nested_imports"][0]["name"], "b0");
    assert_eq!(top[1]["nested_imports"][0]["t_cumulative_us"], 5);
}

#[test]
fn json_sorted_by_self_time() {
    let output = command()
        .arg("--input")
        .arg(fixture())
        .arg("--sort")
        .arg("self")
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value[0]["name"], "b");
    assert_eq!(value[1]["name"], "a");
    assert_eq!(value[0]["nested_imports"][0]["name"], "b0");
}

#[test]
fn json_depth_zero_drops_nested_imports() {
    let output = command()
        .arg("--input")
        .arg(fixture())
        .arg("--depth")
        .arg("0")
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    for import in value.as_array().unwrap() {
        assert_eq!(import["nested_imports"], serde_json::json!([]));
    }
}

#[test]
fn waterfall_sorted_by_self_time() {
    let output = command()
        .arg("--input")
        .arg(fixture())
        .arg("--format")
        .arg("waterfall")
        .arg("--sort")
        .arg("self")
        .arg("--width")
        .arg("60")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "module name | import time (us)");
    assert_eq!(lines[1], "-".repeat(60));
    assert!(lines[2].starts_with("b "));
    assert!(lines[3].starts_with(".b0 "));
    assert!(lines[4].starts_with(".b1 "));
    assert!(lines[5].starts_with("a "));
    assert!(lines[2..].iter().all(|line| line.chars().count() <= 60));
}

#[test]
fn waterfall_cumulative_time() {
    command()
        .arg("--input")
        .arg(fixture())
        .arg("--format")
        .arg("waterfall")
        .arg("--time")
        .arg("cumulative")
        .arg("--width")
        .arg("40")
        .assert()
        .success()
        .stdout(predicate::str::contains("(5)\n"))
        .stdout(predicate::str::contains("WARNING").not());
}

#[test]
fn waterfall_width_from_columns() {
    let output = command()
        .env("COLUMNS", "50")
        .arg("--input")
        .arg(fixture())
        .arg("--format")
        .arg("waterfall")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().nth(1), Some("-".repeat(50).as_str()));
}

#[test]
fn narrow_waterfall_warns_but_succeeds() {
    command()
        .arg("--input")
        .arg(fixture())
        .arg("--format")
        .arg("waterfall")
        .arg("--width")
        .arg("5")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "WARNING: The waterfall diagram may not be displayed correctly",
        ));
}

#[test]
fn reads_trace_from_stdin() {
    let trace = std::fs::read_to_string(fixture()).unwrap();

    command()
        .arg("--input")
        .arg("-")
        .write_stdin(trace)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"b1\""));
}

#[test]
fn zero_width_falls_back_to_columns() {
    let output = command()
        .env("COLUMNS", "50")
        .arg("--input")
        .arg(fixture())
        .arg("--format")
        .arg("waterfall")
        .arg("--width")
        .arg("0")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().nth(1), Some("-".repeat(50).as_str()));
    assert!(!stdout.contains("WARNING"));
}

#[test]
fn stdin_with_invalid_utf8_still_parses() {
    let mut trace = b"program output: caf\xe9\n".to_vec();
    trace.extend(std::fs::read(fixture()).unwrap());

    command()
        .arg("--input")
        .arg("-")
        .write_stdin(trace)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"b1\""));
}

#[test]
fn time_requires_waterfall_format() {
    // The interpreter does not exist; the conflict must be reported first.
    command()
        .arg("json")
        .arg("--python")
        .arg("/nonexistent/bin/python-importtime")
        .arg("--time")
        .arg("self")
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "--time requires format to be set to waterfall",
        ));
}

#[test]
fn width_requires_waterfall_format() {
    command()
        .arg("--input")
        .arg(fixture())
        .arg("--width")
        .arg("100")
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "--width requires format to be set to waterfall",
        ));
}

#[test]
fn module_or_input_is_required() {
    command().assert().code(2);
}

#[test]
fn module_and_input_conflict() {
    command()
        .arg("json")
        .arg("--input")
        .arg(fixture())
        .assert()
        .code(2);
}

#[test]
fn empty_trace_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "import time: self [us] | cumulative | imported package").unwrap();

    command()
        .arg("--input")
        .arg(file.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("could not parse any imports"));
}

#[test]
fn missing_input_file_is_an_error() {
    command()
        .arg("--input")
        .arg("/nonexistent/importtime.txt")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read input file"));
}

#[test]
fn missing_interpreter_is_an_error() {
    command()
        .arg("json")
        .arg("--python")
        .arg("/nonexistent/bin/python-importtime")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to run interpreter"));
}
