use crate::error::Result;
use crate::glob;
use crate::project::Project;
use crate::types::ProjectKind;
use serde::Serialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// StageDef
// ---------------------------------------------------------------------------

/// A pipeline stage and the artifact whose existence marks it complete.
///
/// `gate` is a project-relative path; `*` may appear inside a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageDef {
    pub id: &'static str,
    pub title: &'static str,
    pub gate: &'static str,
}

pub const ATLAS_STAGE: &str = "atlas";
pub const PRESENTATIONS_STAGE: &str = "presentations";

const WARDLEY_STAGES: &[StageDef] = &[
    StageDef {
        id: "brief",
        title: "Brief",
        gate: "brief.agreed.md",
    },
    StageDef {
        id: "needs",
        title: "User Needs",
        gate: "needs/needs.agreed.md",
    },
    StageDef {
        id: "chain",
        title: "Value Chain",
        gate: "chain/chain.agreed.md",
    },
    StageDef {
        id: "evolve",
        title: "Evolution",
        gate: "evolve/map.agreed.*",
    },
    StageDef {
        id: "strategy",
        title: "Strategy",
        gate: "strategy/strategy.agreed.md",
    },
    StageDef {
        id: ATLAS_STAGE,
        title: "Atlas",
        gate: "atlas/*/analysis.md",
    },
    StageDef {
        id: PRESENTATIONS_STAGE,
        title: "Presentations",
        gate: "presentations/*/manifest.md",
    },
];

const CANVAS_STAGES: &[StageDef] = &[
    StageDef {
        id: "brief",
        title: "Brief",
        gate: "brief.agreed.md",
    },
    StageDef {
        id: "segments",
        title: "Customer Segments",
        gate: "segments/segments.agreed.md",
    },
    StageDef {
        id: "canvas",
        title: "Canvas",
        gate: "canvas/canvas.agreed.*",
    },
    StageDef {
        id: "fit",
        title: "Value Fit",
        gate: "fit/fit.agreed.md",
    },
    StageDef {
        id: PRESENTATIONS_STAGE,
        title: "Presentations",
        gate: "presentations/*/manifest.md",
    },
];

/// Stages of `kind` in pipeline (and navigation) order.
pub fn stages_for(kind: ProjectKind) -> &'static [StageDef] {
    match kind {
        ProjectKind::WardleyMap => WARDLEY_STAGES,
        ProjectKind::BusinessCanvas => CANVAS_STAGES,
    }
}

/// The stage whose terminal artifact is the project's headline diagram.
pub fn hero_stage(kind: ProjectKind) -> &'static str {
    match kind {
        ProjectKind::WardleyMap => "evolve",
        ProjectKind::BusinessCanvas => "canvas",
    }
}

/// Stages rendered as plain analysis pages (everything but the two tiers).
pub fn is_analysis_stage(id: &str) -> bool {
    id != ATLAS_STAGE && id != PRESENTATIONS_STAGE
}

// ---------------------------------------------------------------------------
// Kind resolution
// ---------------------------------------------------------------------------

/// A fn-pointer rule mapping a project to its kind. First match wins.
pub struct KindRule {
    pub id: &'static str,
    pub matches: fn(slug: &str, root: &Path) -> bool,
    pub kind: ProjectKind,
}

/// Naming-convention rules first, then kind-distinguishing directories.
pub fn default_kind_rules() -> Vec<KindRule> {
    vec![
        KindRule {
            id: "prefix-wm",
            matches: |slug, _| slug.starts_with("wm-"),
            kind: ProjectKind::WardleyMap,
        },
        KindRule {
            id: "prefix-bmc",
            matches: |slug, _| slug.starts_with("bmc-"),
            kind: ProjectKind::BusinessCanvas,
        },
        KindRule {
            id: "dir-evolve-chain",
            matches: |_, root| root.join("evolve").is_dir() || root.join("chain").is_dir(),
            kind: ProjectKind::WardleyMap,
        },
        KindRule {
            id: "dir-canvas-segments",
            matches: |_, root| root.join("canvas").is_dir() || root.join("segments").is_dir(),
            kind: ProjectKind::BusinessCanvas,
        },
    ]
}

pub fn resolve_kind_with(rules: &[KindRule], slug: &str, root: &Path) -> Option<ProjectKind> {
    rules.iter().find(|r| (r.matches)(slug, root)).map(|r| {
        tracing::debug!(slug, rule = r.id, kind = %r.kind, "resolved project kind");
        r.kind
    })
}

pub fn resolve_kind(slug: &str, root: &Path) -> Option<ProjectKind> {
    resolve_kind_with(&default_kind_rules(), slug, root)
}

// ---------------------------------------------------------------------------
// StageCompletionVector
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageStatus {
    #[serde(flatten)]
    pub stage: StageDef,
    /// First artifact matching the gate, when the stage is complete.
    pub artifact: Option<PathBuf>,
}

impl StageStatus {
    pub fn is_complete(&self) -> bool {
        self.artifact.is_some()
    }
}

/// Per-stage completion for one project, in stage order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageCompletionVector {
    pub kind: ProjectKind,
    pub stages: Vec<StageStatus>,
}

impl StageCompletionVector {
    pub fn is_complete(&self, id: &str) -> bool {
        self.status(id).is_some_and(StageStatus::is_complete)
    }

    pub fn status(&self, id: &str) -> Option<&StageStatus> {
        self.stages.iter().find(|s| s.stage.id == id)
    }

    pub fn artifact(&self, id: &str) -> Option<&Path> {
        self.status(id).and_then(|s| s.artifact.as_deref())
    }

    pub fn completed(&self) -> impl Iterator<Item = &StageStatus> {
        self.stages.iter().filter(|s| s.is_complete())
    }

    pub fn completed_count(&self) -> usize {
        self.completed().count()
    }
}

/// Derive stage completion purely from what exists on disk.
pub fn detect(project: &Project) -> Result<StageCompletionVector> {
    detect_in(project.kind, &project.root)
}

pub fn detect_in(kind: ProjectKind, root: &Path) -> Result<StageCompletionVector> {
    let stages = stages_for(kind)
        .iter()
        .map(|stage| -> Result<StageStatus> {
            Ok(StageStatus {
                stage: *stage,
                artifact: glob::first_match(root, stage.gate)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(StageCompletionVector { kind, stages })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
