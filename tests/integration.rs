use std::fs;
use std::process::Command;

use serde_json::Value;

fn forcelayout() -> Command {
    Command::new(env!("CARGO_BIN_EXE_forcelayout"))
}

fn read_layout(path: &std::path::Path) -> Value {
    let content = fs::read_to_string(path).expect("Failed to read layout output");
    serde_json::from_str(&content).expect("Layout output is not JSON")
}

#[test]
fn lays_out_fixture_graph_for_fixed_ticks() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("layout.json");

    let status = forcelayout()
        .args(["layout", "--input", "tests/fixtures/tree.json", "--ticks", "30", "--output"])
        .arg(&output)
        .status()
        .expect("Failed to execute forcelayout");
    assert!(status.success(), "forcelayout exited with error");

    let layout = read_layout(&output);
    assert_eq!(layout["ticks"], 30);

    let nodes = layout["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 9);
    for node in nodes {
        assert!(node["x"].as_f64().unwrap().is_finite());
        assert!(node["y"].as_f64().unwrap().is_finite());
        assert!(node.get("z").is_none(), "2D layout should not emit z");
    }

    // Pinned root stays at the origin
    assert_eq!(nodes[0]["id"], "root");
    assert_eq!(nodes[0]["x"], 0.0);
    assert_eq!(nodes[0]["y"], 0.0);
}

#[test]
fn runs_to_convergence_in_3d() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("layout.json");

    let status = forcelayout()
        .args([
            "layout",
            "-i",
            "tests/fixtures/tree.json",
            "--preset",
            "sparse",
            "--three-d",
            "-o",
        ])
        .arg(&output)
        .status()
        .expect("Failed to execute forcelayout");
    assert!(status.success());

    let layout = read_layout(&output);
    assert!(layout["alpha"].as_f64().unwrap() < 0.001);
    let nodes = layout["nodes"].as_array().unwrap();
    assert!(nodes.iter().all(|n| n["z"].as_f64().is_some_and(f64::is_finite)));
}

#[test]
fn same_seed_same_layout() {
    let run = |seed: &str| {
        let output = forcelayout()
            .args(["layout", "-i", "tests/fixtures/tree.json", "-t", "20", "--seed", seed])
            .output()
            .expect("Failed to execute forcelayout");
        assert!(output.status.success());
        String::from_utf8(output.stdout).unwrap()
    };

    assert_eq!(run("5"), run("5"));
    assert_ne!(run("5"), run("6"));
}

#[test]
fn applies_configuration_overrides() {
    let output = forcelayout()
        .args([
            "validate",
            "--preset",
            "dense",
            "--config",
            "tests/fixtures/overrides.yaml",
        ])
        .output()
        .expect("Failed to execute forcelayout");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.trim(), "link.distance must be within [10, 500], got 5");
}

#[test]
fn rejects_unknown_preset() {
    let output = forcelayout()
        .args(["layout", "-i", "tests/fixtures/tree.json", "--preset", "spiral"])
        .output()
        .expect("Failed to execute forcelayout");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown preset"));
}

#[test]
fn reports_missing_graph() {
    let output = forcelayout()
        .args(["layout", "-i", "tests/fixtures/absent.json"])
        .output()
        .expect("Failed to execute forcelayout");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read graph"));
}

#[test]
fn lists_builtin_presets() {
    let output = forcelayout()
        .arg("presets")
        .output()
        .expect("Failed to execute forcelayout");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    insta::assert_snapshot!(stdout.trim_end());
}

#[test]
fn prints_preset_configuration() {
    let output = forcelayout()
        .args(["presets", "radial"])
        .output()
        .expect("Failed to execute forcelayout");
    assert!(output.status.success());

    let config: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["radial"]["enabled"], true);
    assert_eq!(config["radial"]["radius"], 200.0);
    assert_eq!(config["center"]["enabled"], false);
}
