use crate::output::{print_json, print_table};
use dossier_core::compile::{survey, GateSurvey};
use std::path::Path;

pub fn run(workspace: &Path, json: bool) -> anyhow::Result<()> {
    let survey = survey(workspace)?;
    if json {
        print_json(&survey)?;
    } else {
        print_survey(&survey);
    }
    Ok(())
}

fn print_survey(survey: &GateSurvey) {
    let research = if survey.research_gate {
        "agreed"
    } else {
        "missing"
    };
    println!("research gate: {research}");
    println!();

    if survey.projects.is_empty() {
        println!("No projects.");
    } else {
        let rows: Vec<Vec<String>> = survey
            .projects
            .iter()
            .map(|p| {
                let done: Vec<&str> = p.completion.completed().map(|s| s.stage.id).collect();
                let next = p
                    .completion
                    .stages
                    .iter()
                    .find(|s| !s.is_complete())
                    .map(|s| s.stage.id)
                    .unwrap_or("-");
                vec![
                    p.slug.clone(),
                    p.completion.kind.to_string(),
                    format!("{}/{}", done.len(), p.completion.stages.len()),
                    if done.is_empty() {
                        "-".to_string()
                    } else {
                        done.join(", ")
                    },
                    next.to_string(),
                ]
            })
            .collect();
        print_table(&["PROJECT", "KIND", "DONE", "STAGES", "NEXT"], &rows);
    }

    for skipped in &survey.skipped {
        println!("skipped {}: {}", skipped.slug, skipped.reason);
    }
}
