use crate::gate::{is_analysis_stage, StageCompletionVector};
use crate::paths;
use serde::Serialize;

/// Identifier of the project home entry in a project nav.
pub const OVERVIEW: &str = "overview";
/// Identifiers of the fixed workspace-level entries.
pub const HOME: &str = "home";
pub const RESOURCES: &str = "resources";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub id: String,
    pub title: String,
    pub href: String,
    pub active: bool,
}

/// An entry before depth and active marking are applied. `href` is relative
/// to the directory the nav is rooted at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub id: String,
    pub title: String,
    pub href: String,
}

impl NavEntry {
    pub fn new(id: impl Into<String>, title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            href: href.into(),
        }
    }
}

/// Prefix each href with `depth` levels of `../` and mark the entry whose id
/// equals `active`.
pub fn static_nav(entries: &[NavEntry], active: &str, depth: usize) -> Vec<NavLink> {
    let prefix = paths::depth_prefix(depth);
    entries
        .iter()
        .map(|e| NavLink {
            id: e.id.clone(),
            title: e.title.clone(),
            href: format!("{prefix}{}", e.href),
            active: e.id == active,
        })
        .collect()
}

/// Site-wide links: home, shared resources, then one per project.
///
/// `projects` is `(slug, title)`; hrefs are relative to the site root.
pub fn workspace_nav(projects: &[(String, String)], active: &str, depth: usize) -> Vec<NavLink> {
    let mut entries = vec![
        NavEntry::new(HOME, "Home", paths::INDEX_HTML),
        NavEntry::new(RESOURCES, "Resources", paths::RESOURCES_HTML),
    ];
    entries.extend(
        projects
            .iter()
            .map(|(slug, title)| NavEntry::new(slug, title, format!("{slug}/{}", paths::INDEX_HTML))),
    );
    static_nav(&entries, active, depth)
}

/// Project links derived from stage completion: Overview, then each complete
/// stage in stage order. Hrefs are relative to `site/{slug}/`.
pub fn project_nav(vector: &StageCompletionVector, active: &str, depth: usize) -> Vec<NavLink> {
    let mut entries = vec![NavEntry::new(OVERVIEW, "Overview", paths::INDEX_HTML)];
    for status in vector.completed() {
        let stage = status.stage;
        let href = if is_analysis_stage(stage.id) {
            format!("{}/{}.html", paths::ANALYSIS_DIR, stage.id)
        } else {
            format!("{}/{}", stage.id, paths::INDEX_HTML)
        };
        entries.push(NavEntry::new(stage.id, stage.title, href));
    }
    static_nav(&entries, active, depth)
}

// ---------------------------------------------------------------------------
// Breadcrumbs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub title: String,
    /// `None` for the current page.
    pub href: Option<String>,
}

impl Crumb {
    pub fn link(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: Some(href.into()),
        }
    }

    pub fn here(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
