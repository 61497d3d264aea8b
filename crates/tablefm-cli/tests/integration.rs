//! Integration tests for tablefm-cli.
//!
//! Run the binary end to end and inspect the WAV files it writes.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Helper to get the path to the `tablefm` binary built by cargo.
fn tablefm_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_tablefm"))
}

fn read_wav(path: &Path) -> (hound::WavSpec, Vec<f32>) {
    let mut reader = hound::WavReader::open(path).expect("output should be a WAV file");
    let spec = reader.spec();
    let samples = reader
        .samples::<f32>()
        .collect::<Result<Vec<_>, _>>()
        .expect("float samples");
    (spec, samples)
}

#[test]
fn cli_algorithms_lists_all_four() {
    let output = tablefm_bin()
        .arg("algorithms")
        .output()
        .expect("failed to run tablefm algorithms");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in [
        "cascade",
        "sum-then-cascade",
        "double-sum-then-modulate",
        "additive",
    ] {
        assert!(stdout.contains(name), "missing '{name}'");
    }
}

#[test]
fn cli_patches_list_shows_factory() {
    let output = tablefm_bin()
        .args(["patches", "list"])
        .output()
        .expect("failed to run tablefm patches list");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["init", "bell", "organ", "pulse"] {
        assert!(stdout.contains(name), "missing '{name}'");
    }
}

#[test]
fn cli_render_writes_note() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("note.wav");

    let output = tablefm_bin()
        .args(["render", "--patch", "bell", "--freq", "330", "--duration", "0.5"])
        .args(["--sample-rate", "22050", "--block-size", "100"])
        .arg(&out)
        .output()
        .expect("failed to run tablefm render");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let (spec, samples) = read_wav(&out);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 22050);
    assert_eq!(samples.len(), 11025);
    assert!(samples.iter().all(|s| s.is_finite() && s.abs() <= 1.0));
    assert!(samples.iter().any(|&s| s != 0.0));
}

#[test]
fn cli_render_rejects_zero_block_size() {
    let dir = TempDir::new().unwrap();
    let output = tablefm_bin()
        .args(["render", "--block-size", "0"])
        .arg(dir.path().join("x.wav"))
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn cli_render_unknown_patch_fails() {
    let dir = TempDir::new().unwrap();
    let output = tablefm_bin()
        .args(["render", "--patch", "no-such-patch"])
        .arg(dir.path().join("x.wav"))
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not found"));
}

#[test]
fn cli_chord_reports_dropped_notes() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("chord.wav");
    let notes: Vec<String> = (48..66).map(|n: u8| n.to_string()).collect();

    let output = tablefm_bin()
        .args(["chord", "--notes", &notes.join(","), "--duration", "0.25"])
        .arg(&out)
        .output()
        .expect("failed to run tablefm chord");
    assert!(output.status.success());

    // 18 notes into a 16-voice pool.
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 dropped"), "stdout: {stdout}");

    let (_, samples) = read_wav(&out);
    assert!(samples.iter().all(|s| s.is_finite()));
}

#[test]
fn cli_patch_export_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("organ.toml");

    let output = tablefm_bin()
        .args(["patches", "export", "organ"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let output = tablefm_bin()
        .args(["patches", "check"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    // Existing file without --force.
    let output = tablefm_bin()
        .args(["patches", "export", "organ"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(!output.status.success());
}
