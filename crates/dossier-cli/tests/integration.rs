#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn render_site(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("render-site").unwrap();
    cmd.current_dir(dir.path()).env_remove("RENDER_SITE_WORKSPACE");
    cmd
}

fn write(root: &Path, rel: &str, body: &str) {
    let p = root.join(rel);
    std::fs::create_dir_all(p.parent().unwrap()).unwrap();
    std::fs::write(p, body).unwrap();
}

fn workspace(dir: &TempDir) {
    write(dir.path(), "resources/index.md", "# Research\n\nAgreed sources.\n");
    write(dir.path(), "engagement.md", "# Acme Engagement\n");
    write(dir.path(), "projects/wm-acme/brief.agreed.md", "# Acme Retail\n");
}

/// Stand-in tools available on any unix box: `cat` echoes markdown and `cp`
/// "renders" a diagram by copying its source.
fn coreutils_config(dir: &TempDir) {
    write(
        dir.path(),
        "render-site.yaml",
        "title: Acme\nmarkdown:\n  program: cat\n  args: []\ndiagrams:\n  program: cp\n  args: [\"{input}\", \"{output}\"]\n",
    );
}

// ---------------------------------------------------------------------------
// preconditions
// ---------------------------------------------------------------------------

#[test]
fn missing_workspace_fails() {
    let dir = TempDir::new().unwrap();
    render_site(&dir)
        .arg("does-not-exist")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("workspace not found"));
}

#[test]
fn missing_research_gate_fails_without_output() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "projects/wm-acme/brief.agreed.md", "# Acme\n");
    render_site(&dir)
        .arg(dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("resources/index.md"));
    assert!(!dir.path().join("site").exists());
}

#[test]
fn missing_tool_fails_without_output() {
    let dir = TempDir::new().unwrap();
    workspace(&dir);
    write(
        dir.path(),
        "render-site.yaml",
        "markdown:\n  program: no-such-markdown-tool-4c1e\n",
    );
    render_site(&dir)
        .arg(dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no-such-markdown-tool-4c1e"));
    assert!(!dir.path().join("site").exists());
}

#[test]
fn empty_path_means_missing_tools() {
    let dir = TempDir::new().unwrap();
    workspace(&dir);
    render_site(&dir)
        .arg(dir.path())
        .env("PATH", "")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("required tool not found"));
    assert!(!dir.path().join("site").exists());
}

#[test]
fn invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    workspace(&dir);
    write(dir.path(), "render-site.yaml", "diagrams:\n  width: 0\n");
    render_site(&dir)
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));
}

#[test]
fn unknown_config_key_fails() {
    let dir = TempDir::new().unwrap();
    workspace(&dir);
    write(dir.path(), "render-site.yaml", "colour: blue\n");
    render_site(&dir)
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("render-site.yaml"));
}

#[test]
fn output_inside_projects_is_refused() {
    let dir = TempDir::new().unwrap();
    workspace(&dir);
    render_site(&dir)
        .arg(dir.path())
        .arg("--out")
        .arg(dir.path().join("projects/site"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("overlaps"));
}

// ---------------------------------------------------------------------------
// --gates
// ---------------------------------------------------------------------------

#[test]
fn gates_prints_stage_table() {
    let dir = TempDir::new().unwrap();
    workspace(&dir);
    render_site(&dir)
        .arg(dir.path())
        .arg("--gates")
        .env("PATH", "")
        .assert()
        .success()
        .stdout(predicate::str::contains("research gate: agreed"))
        .stdout(predicate::str::contains("wm-acme"))
        .stdout(predicate::str::contains("1/7"))
        .stdout(predicate::str::contains("needs"));
    assert!(!dir.path().join("site").exists());
}

#[test]
fn gates_json_reports_artifacts() {
    let dir = TempDir::new().unwrap();
    workspace(&dir);
    std::fs::create_dir_all(dir.path().join("projects/misc")).unwrap();
    let out = render_site(&dir)
        .arg(dir.path())
        .args(["--gates", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["research_gate"], true);
    assert_eq!(value["projects"][0]["slug"], "wm-acme");
    assert_eq!(value["projects"][0]["completion"]["kind"], "wardley_map");
    let brief = &value["projects"][0]["completion"]["stages"][0];
    assert_eq!(brief["id"], "brief");
    assert!(brief["artifact"].is_string());
    assert!(value["projects"][0]["completion"]["stages"][1]["artifact"].is_null());
    assert_eq!(value["skipped"][0]["slug"], "misc");
}

#[test]
fn workspace_from_env() {
    let dir = TempDir::new().unwrap();
    workspace(&dir);
    render_site(&dir)
        .env("RENDER_SITE_WORKSPACE", dir.path())
        .arg("--gates")
        .assert()
        .success()
        .stdout(predicate::str::contains("wm-acme"));
}

// ---------------------------------------------------------------------------
// compile
// ---------------------------------------------------------------------------

#[cfg(unix)]
#[test]
fn compiles_with_configured_tools() {
    let dir = TempDir::new().unwrap();
    workspace(&dir);
    coreutils_config(&dir);
    write(dir.path(), "projects/wm-acme/evolve/map.agreed.mmd", "graph LR\n");

    render_site(&dir)
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("projects:"));

    let site = dir.path().join("site");
    assert!(site.join("style.css").is_file());
    assert!(site.join("resources.html").is_file());
    let index = std::fs::read_to_string(site.join("index.html")).unwrap();
    assert!(index.contains("wm-acme/index.html"));
    assert!(index.contains("<title>Acme</title>"));
    assert!(site.join("wm-acme/analysis/brief.html").is_file());
    assert!(site.join("wm-acme/analysis/evolve.html").is_file());
    assert!(site.join("wm-acme/figures/evolve/map.agreed.svg").is_file());
    assert!(dir.path().join("projects/wm-acme/evolve/map.agreed.svg").is_file());
}

#[cfg(unix)]
#[test]
fn json_report_counts_cache_hits_on_rerun() {
    let dir = TempDir::new().unwrap();
    workspace(&dir);
    coreutils_config(&dir);
    write(dir.path(), "projects/wm-acme/evolve/map.agreed.mmd", "graph LR\n");

    render_site(&dir).arg(dir.path()).assert().success();
    let out = render_site(&dir)
        .arg(dir.path())
        .arg("-j")
        .output()
        .unwrap();
    assert!(out.status.success());
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["diagrams_rendered"], 0);
    assert!(report["diagram_cache_hits"].as_u64().unwrap() > 0);
    assert_eq!(report["projects_rendered"][0], "wm-acme");
}

#[cfg(unix)]
#[test]
fn custom_out_dir() {
    let dir = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    workspace(&dir);
    coreutils_config(&dir);
    render_site(&dir)
        .arg(dir.path())
        .arg("--out")
        .arg(out.path().join("public"))
        .assert()
        .success();
    assert!(out.path().join("public/index.html").is_file());
    assert!(!dir.path().join("site").exists());
}
