use assert_cmd::cargo::cargo_bin_cmd;
use serde::Deserialize;
use std::error::Error;
use std::path::PathBuf;

#[derive(Deserialize)]
struct SmoothOutput {
    y: Vec<f64>,
}

#[derive(Deserialize)]
struct PeakOut {
    index: usize,
    y: f64,
}

#[derive(Deserialize)]
struct Summary {
    count: usize,
    highest: Option<PeakOut>,
}

#[derive(Deserialize)]
struct PeaksOutput {
    peaks: Vec<PeakOut>,
    summary: Summary,
}

#[derive(Deserialize)]
struct Decimated {
    x: Vec<f64>,
    y: Vec<f64>,
}

fn samples_path() -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .join("test_data/samples.txt")
        .to_string_lossy()
        .to_string()
}

#[test]
fn smooth_moving_average_from_stdin() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("trendlab");
    cmd.args(["smooth", "--window", "3"])
        .write_stdin("1\n2\n3\n4\n5\n");
    let out = cmd.assert().success().get_output().stdout.clone();
    let value: SmoothOutput = serde_json::from_slice(&out)?;
    assert_eq!(value.y, vec![1.5, 2.0, 3.0, 4.0, 4.5]);
    Ok(())
}

#[test]
fn smooth_without_window_is_identity() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("trendlab");
    cmd.args(["smooth", "--method", "savitzky-golay", "--input", &samples_path()]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let value: SmoothOutput = serde_json::from_slice(&out)?;
    assert_eq!(value.y, vec![0.0, 1.0, 3.0, 1.0, 0.0, 1.0, 5.0, 1.0, 0.0]);
    Ok(())
}

#[test]
fn peaks_command_reports_summary() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("trendlab");
    cmd.args(["peaks", "--input", &samples_path(), "--height-percent", "0"]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let value: PeaksOutput = serde_json::from_slice(&out)?;
    let indices: Vec<usize> = value.peaks.iter().map(|p| p.index).collect();
    assert_eq!(indices, vec![2, 6]);
    assert_eq!(value.summary.count, 2);
    let highest = value.summary.highest.expect("highest peak");
    assert_eq!(highest.index, 6);
    assert_eq!(highest.y, 5.0);
    Ok(())
}

#[test]
fn decimate_bounds_point_count() -> Result<(), Box<dyn Error>> {
    let input: String = (0..10_000)
        .map(|i| format!("{}\n", ((i * 7919) % 1000) as f64 - 500.0))
        .collect();
    let mut cmd = cargo_bin_cmd!("trendlab");
    cmd.args(["decimate", "--target", "10"]).write_stdin(input);
    let out = cmd.assert().success().get_output().stdout.clone();
    let value: Decimated = serde_json::from_slice(&out)?;
    assert!(value.y.len() <= 20);
    assert_eq!(value.x.len(), value.y.len());
    assert!(value.x.windows(2).all(|w| w[0] < w[1]));
    assert!(value.y.contains(&499.0));
    assert!(value.y.contains(&-500.0));
    Ok(())
}
