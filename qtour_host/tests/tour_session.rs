use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use anyhow::{Context, Result};
use serde_json::Value;
use tempfile::tempdir;

fn run_qtour(args: &[&str]) -> Result<Output> {
    Command::new(env!("CARGO_BIN_EXE_qtour"))
        .args(args)
        .output()
        .context("executing qtour")
}

fn path_arg(path: &Path) -> Result<&str> {
    path.to_str().context("temp path is not valid UTF-8")
}

fn read_json(path: &Path) -> Result<Value> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))
}

fn event_names(transcript: &Value) -> Vec<String> {
    transcript["events"]
        .as_array()
        .map(|events| {
            events
                .iter()
                .filter_map(|event| event["event"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn default_tour_reaches_finish_once() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary directory for transcript")?;
    let transcript_path = temp_dir.path().join("tour.json");

    let output = run_qtour(&[
        "--frame-ms",
        "50",
        "--transcript-json",
        path_arg(&transcript_path)?,
    ])?;
    assert!(output.status.success(), "qtour exited with {:?}", output.status);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("[popup] Quantum processor (1/5)"),
        "first popup missing from output: {stdout}"
    );
    assert_eq!(stdout.matches("[finish]").count(), 1, "output: {stdout}");

    let transcript = read_json(&transcript_path)?;
    assert_eq!(transcript["outcome"]["tour"]["phase"]["phase"], "finished");
    assert_eq!(transcript["outcome"]["tour"]["finish_prompts"], 1);
    assert_eq!(transcript["outcome"]["tour"]["state"]["current_step_index"], 5);
    assert_eq!(transcript["scene"]["live_labels"].as_array().map(Vec::len), Some(0));

    let names = event_names(&transcript);
    assert_eq!(names.iter().filter(|name| *name == "popup_shown").count(), 5);
    assert_eq!(names.iter().filter(|name| *name == "finished").count(), 1);
    assert_eq!(names.last().map(String::as_str), Some("finished"));

    let titles: Vec<&str> = transcript["popups"]
        .as_array()
        .context("popups array")?
        .iter()
        .filter_map(|popup| popup["title"].as_str())
        .collect();
    assert_eq!(
        titles,
        vec![
            "Quantum processor",
            "1: Qubits",
            "1: Qubit Materials",
            "2: Quantum Logic Gates",
            "2: Entanglement",
        ]
    );
    Ok(())
}

#[test]
fn back_and_rapid_next_follow_the_catalog() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary directory for transcript")?;
    let transcript_path = temp_dir.path().join("tour.json");

    let output = run_qtour(&[
        "--viewport-width",
        "375",
        "--viewport-height",
        "667",
        "--script",
        "next,next,settle,next,settle,back,settle",
        "--transcript-json",
        path_arg(&transcript_path)?,
    ])?;
    assert!(output.status.success(), "qtour exited with {:?}", output.status);

    let transcript = read_json(&transcript_path)?;
    assert_eq!(transcript["viewport"], "compact");
    assert_eq!(transcript["ignored_actions"], 1);
    assert_eq!(transcript["outcome"]["tour"]["phase"]["phase"], "showing");
    assert_eq!(transcript["outcome"]["tour"]["phase"]["step"], 1);
    // Back from step 2 flies to step 0's destination
    assert_eq!(transcript["camera"]["position"][0].as_f64(), Some(0.25));

    let popups = transcript["popups"].as_array().context("popups array")?;
    let last = popups.last().context("at least one popup")?;
    assert_eq!(last["title"], "1: Qubits");
    assert_eq!(last["back"], true);
    assert_eq!(last["rect"]["y"].as_f64(), Some(527.0));
    // qubit labels are back in the scene
    assert_eq!(transcript["scene"]["live_labels"].as_array().map(Vec::len), Some(5));
    Ok(())
}

#[test]
fn custom_catalog_round_trips_through_dump() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary directory for catalog")?;
    let catalog_path = temp_dir.path().join("catalog.json");
    fs::write(
        &catalog_path,
        r#"{
            "steps": [
                { "title": "A", "camera": [1, 0, 0], "look_at": [0, 0, 0] },
                { "title": "B", "camera": [0, 1, 0], "look_at": [0, 0, 0], "decoration": "qubit_labels" },
                { "title": "C", "camera": [0, 0, 1], "look_at": [0, 0, 0] }
            ]
        }"#,
    )
    .context("writing catalog")?;
    let dump_path = temp_dir.path().join("dump.json");

    let output = run_qtour(&[
        "--catalog",
        path_arg(&catalog_path)?,
        "--dump-catalog",
        path_arg(&dump_path)?,
    ])?;
    assert!(output.status.success(), "qtour exited with {:?}", output.status);

    let dumped = read_json(&dump_path)?;
    let steps = dumped["steps"].as_array().context("steps array")?;
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[1]["decoration"], "qubit_labels");
    assert!(dumped["labels"]["qubit_labels"].is_object());

    let transcript_path = temp_dir.path().join("tour.json");
    let output = run_qtour(&[
        "--catalog",
        path_arg(&dump_path)?,
        "--frame-ms",
        "100",
        "--transcript-json",
        path_arg(&transcript_path)?,
    ])?;
    assert!(output.status.success(), "qtour exited with {:?}", output.status);
    let transcript = read_json(&transcript_path)?;
    assert_eq!(transcript["outcome"]["tour"]["finish_prompts"], 1);
    Ok(())
}

#[test]
fn explore_focus_and_close_returns_to_overview() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary directory for transcript")?;
    let transcript_path = temp_dir.path().join("explore.json");

    let output = run_qtour(&[
        "--mode",
        "explore",
        "--touch",
        "--script",
        "focus:3,dismiss,focus:3,settle,close,settle",
        "--transcript-json",
        path_arg(&transcript_path)?,
    ])?;
    assert!(output.status.success(), "qtour exited with {:?}", output.status);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Tap on markers to view annotations."),
        "touch onboarding missing: {stdout}"
    );
    assert!(stdout.contains("[popup] marker 3: Qubit Signal Amplifiers"));

    let transcript = read_json(&transcript_path)?;
    assert_eq!(transcript["ignored_actions"], 1);
    assert_eq!(transcript["outcome"]["explore"]["phase"]["phase"], "browsing");
    assert_eq!(
        transcript["outcome"]["explore"]["gate"]["markers_clickable"],
        true
    );
    assert_eq!(transcript["camera"]["position"][2].as_f64(), Some(-18.0));

    let names = event_names(&transcript);
    assert!(names.contains(&"marker_popup_shown".to_string()));
    assert_eq!(names.last().map(String::as_str), Some("returned_to_overview"));
    // seven numbered marker labels stay in the scene
    assert_eq!(transcript["scene"]["live_labels"].as_array().map(Vec::len), Some(7));
    Ok(())
}

#[test]
fn explore_action_in_tour_mode_fails() -> Result<()> {
    let output = run_qtour(&["--script", "dismiss"])?;
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("dismiss is not available in tour mode"),
        "unexpected error output: {stderr}"
    );
    Ok(())
}
