use crate::output::{print_json, print_summary, print_table};
use anyhow::Context;
use dossier_core::compile::{CompileReport, SiteCompiler};
use dossier_core::config::SiteConfig;
use dossier_core::tool_runner::Toolchain;
use std::path::{Path, PathBuf};

pub fn run(workspace: &Path, out: Option<PathBuf>, config_path: &Path, json: bool) -> anyhow::Result<()> {
    let config = SiteConfig::load_or_default(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    // Preconditions first, then tools: neither writes anything.
    let mut compiler = SiteCompiler::new(workspace, out, config.clone());
    compiler.validate()?;
    let tools = Toolchain::detect(&config)?;

    let report = compiler
        .compile(&tools)
        .with_context(|| format!("failed to compile {}", workspace.display()))?;

    if json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &CompileReport) {
    print_summary(&[
        ("output", report.output_dir.display().to_string()),
        ("projects", report.projects_rendered.len().to_string()),
        ("pages", report.pages_written.to_string()),
        ("figures", report.figures_copied.to_string()),
        (
            "diagrams",
            format!(
                "{} rendered, {} cached",
                report.diagrams_rendered, report.diagram_cache_hits
            ),
        ),
    ]);
    if !report.projects_skipped.is_empty() {
        println!();
        let rows: Vec<Vec<String>> = report
            .projects_skipped
            .iter()
            .map(|s| vec![s.slug.clone(), s.reason.clone()])
            .collect();
        print_table(&["SKIPPED", "REASON"], &rows);
    }
}
