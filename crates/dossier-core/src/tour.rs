//! Tour composition: manifest rows grouped by order base, with transition
//! documents interleaved by position.
//!
//! Transition files pair with groups by index after a lexical sort of their
//! filenames. Nothing ties a transition to a group by name, so authors keep
//! `transitions/NN-*.md` in the same order as the manifest groups.

use crate::error::Result;
use crate::manifest::{self, ManifestRow, OrderKey};
use crate::paths;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopDepth {
    Primary,
    Sub,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TourStop {
    pub order: String,
    pub title: String,
    pub depth: StopDepth,
    /// Existing diagram files, in manifest order.
    pub diagrams: Vec<PathBuf>,
    pub analysis: Option<PathBuf>,
    /// Heading rows carry a title and nothing else.
    pub is_heading: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TourGroup {
    pub base: String,
    pub stops: Vec<TourStop>,
    pub transition: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tour {
    pub opening: Option<PathBuf>,
    pub groups: Vec<TourGroup>,
}

/// The files making up one `presentations/{name}/` directory.
#[derive(Debug, Clone, PartialEq)]
pub struct TourSource {
    pub name: String,
    pub manifest: PathBuf,
    pub opening: Option<PathBuf>,
    pub transitions: Vec<PathBuf>,
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Tours under `presentations/`, by name. Directories without a manifest are
/// not tours.
pub fn discover_tours(project_root: &Path) -> Result<Vec<TourSource>> {
    let dirs = crate::io::sorted_entries(&paths::presentations_dir(project_root), |p| {
        p.join(paths::MANIFEST_MD).is_file()
    })?;
    dirs.into_iter()
        .map(|dir| -> Result<TourSource> {
            let opening = dir.join(paths::OPENING_MD);
            Ok(TourSource {
                name: dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                manifest: dir.join(paths::MANIFEST_MD),
                opening: opening.is_file().then_some(opening),
                transitions: crate::io::markdown_files(&dir.join(paths::TRANSITIONS_DIR))?,
            })
        })
        .collect()
}

impl TourSource {
    pub fn rows(&self) -> Result<Vec<ManifestRow>> {
        let text = std::fs::read_to_string(&self.manifest)?;
        Ok(manifest::parse(&text))
    }

    pub fn compose(&self, project_root: &Path) -> Result<Tour> {
        Ok(compose(
            &self.rows()?,
            &self.transitions,
            self.opening.clone(),
            project_root,
        ))
    }
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// Group `rows` by contiguous order base (manifest order is kept, never
/// re-sorted) and pair each group with the next transition by position.
pub fn compose(
    rows: &[ManifestRow],
    transitions: &[PathBuf],
    opening: Option<PathBuf>,
    project_root: &Path,
) -> Tour {
    let mut groups: Vec<TourGroup> = Vec::new();
    for row in rows {
        let key = OrderKey::parse(&row.order);
        let stop = resolve_stop(row, &key, project_root);
        match groups.last_mut() {
            Some(group) if group.base == key.base => group.stops.push(stop),
            _ => groups.push(TourGroup {
                base: key.base,
                stops: vec![stop],
                transition: None,
            }),
        }
    }

    let mut sorted = transitions.to_vec();
    sorted.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));
    if sorted.len() > groups.len() {
        tracing::warn!(
            groups = groups.len(),
            transitions = sorted.len(),
            "more transitions than manifest groups; extras are not shown"
        );
    }
    for (group, transition) in groups.iter_mut().zip(sorted) {
        group.transition = Some(transition);
    }

    Tour { opening, groups }
}

fn resolve_stop(row: &ManifestRow, key: &OrderKey, project_root: &Path) -> TourStop {
    let depth = if key.has_suffix() {
        StopDepth::Sub
    } else {
        StopDepth::Primary
    };
    let Some(source) = row.source_dir.as_deref() else {
        return TourStop {
            order: row.order.clone(),
            title: row.title.clone(),
            depth,
            diagrams: Vec::new(),
            analysis: None,
            is_heading: true,
        };
    };

    if escapes_root(source) || row.map_files.iter().any(|f| escapes_root(f)) {
        tracing::warn!(order = %row.order, source, "manifest path leaves the project; showing title only");
        return TourStop {
            order: row.order.clone(),
            title: row.title.clone(),
            depth,
            diagrams: Vec::new(),
            analysis: None,
            is_heading: false,
        };
    }

    let dir = project_root.join(source);
    let candidates: Vec<PathBuf> = if row.map_files.is_empty() {
        vec![dir.join(paths::DEFAULT_MAP_FILE)]
    } else {
        row.map_files.iter().map(|f| dir.join(f)).collect()
    };
    let diagrams = candidates
        .into_iter()
        .filter(|p| {
            let exists = p.is_file();
            if !exists {
                tracing::debug!(path = %p.display(), order = %row.order, "diagram not found; skipping");
            }
            exists
        })
        .collect();
    let analysis = dir.join(paths::ANALYSIS_MD);

    TourStop {
        order: row.order.clone(),
        title: row.title.clone(),
        depth,
        diagrams,
        analysis: analysis.is_file().then_some(analysis),
        is_heading: false,
    }
}

fn escapes_root(rel: &str) -> bool {
    Path::new(rel)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
