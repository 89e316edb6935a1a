use crate::error::{Result, SiteError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Workspace layout (read-only input)
// ---------------------------------------------------------------------------

pub const RESOURCES_DIR: &str = "resources";
pub const RESEARCH_GATE: &str = "resources/index.md";
pub const ENGAGEMENT_MD: &str = "engagement.md";
pub const PROJECTS_DIR: &str = "projects";
pub const CONFIG_FILE: &str = "render-site.yaml";

pub const OVERVIEW_MD: &str = "overview.md";
pub const ATLAS_DIR: &str = "atlas";
pub const PRESENTATIONS_DIR: &str = "presentations";
pub const ANALYSIS_MD: &str = "analysis.md";
pub const MANIFEST_MD: &str = "manifest.md";
pub const OPENING_MD: &str = "opening.md";
pub const TRANSITIONS_DIR: &str = "transitions";
pub const DEFAULT_MAP_FILE: &str = "map.svg";

// ---------------------------------------------------------------------------
// Site layout (output)
// ---------------------------------------------------------------------------

pub const STYLE_CSS: &str = "style.css";
pub const INDEX_HTML: &str = "index.html";
pub const RESOURCES_HTML: &str = "resources.html";
pub const ANALYSIS_DIR: &str = "analysis";
pub const FIGURES_DIR: &str = "figures";

/// Section pages named like this would overwrite the section index.
pub const INDEX_STEM: &str = "index";

/// Project slugs taken by fixed site entries: the home nav id and the
/// `resources/` subpage directory.
pub const RESERVED_PROJECT_SLUGS: &[&str] = &["home", "resources"];

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn research_gate(workspace: &Path) -> PathBuf {
    workspace.join(RESEARCH_GATE)
}

pub fn resources_dir(workspace: &Path) -> PathBuf {
    workspace.join(RESOURCES_DIR)
}

pub fn engagement_md(workspace: &Path) -> PathBuf {
    workspace.join(ENGAGEMENT_MD)
}

pub fn projects_dir(workspace: &Path) -> PathBuf {
    workspace.join(PROJECTS_DIR)
}

pub fn project_dir(workspace: &Path, slug: &str) -> PathBuf {
    projects_dir(workspace).join(slug)
}

pub fn config_path(workspace: &Path) -> PathBuf {
    workspace.join(CONFIG_FILE)
}

pub fn atlas_dir(project_root: &Path) -> PathBuf {
    project_root.join(ATLAS_DIR)
}

pub fn presentations_dir(project_root: &Path) -> PathBuf {
    project_root.join(PRESENTATIONS_DIR)
}

/// `site/{slug}/`.
pub fn site_project_dir(site: &Path, slug: &str) -> PathBuf {
    site.join(slug)
}

/// Where a project file is copied so pages can link it:
/// `site/{slug}/figures/{project-relative path}`.
pub fn site_figure_path(site: &Path, slug: &str, project_relative: &Path) -> PathBuf {
    site_project_dir(site, slug)
        .join(FIGURES_DIR)
        .join(project_relative)
}

/// `../` repeated `depth` times; the empty string at the site root.
pub fn depth_prefix(depth: usize) -> String {
    "../".repeat(depth)
}

/// Render a relative path with forward slashes for use in an href.
pub fn href(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

// ---------------------------------------------------------------------------
// Slug validation
// ---------------------------------------------------------------------------

static SLUG_RE: OnceLock<Regex> = OnceLock::new();

fn slug_re() -> &'static Regex {
    SLUG_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() || slug.len() > 64 || !slug_re().is_match(slug) {
        return Err(SiteError::InvalidSlug(slug.to_string()));
    }
    if RESERVED_PROJECT_SLUGS.contains(&slug) {
        return Err(SiteError::ReservedSlug(slug.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_slugs() {
        for slug in ["wm-acme", "a", "bmc-retail-2024", "x1"] {
            validate_slug(slug).unwrap_or_else(|_| panic!("expected valid: {slug}"));
        }
    }

    #[test]
    fn invalid_slugs() {
        for slug in ["", "-acme", "acme-", "has spaces", "UPPER", "a_b"] {
            assert!(validate_slug(slug).is_err(), "expected invalid: {slug}");
        }
    }

    #[test]
    fn site_entry_names_are_reserved() {
        for slug in ["home", "resources"] {
            assert!(matches!(validate_slug(slug), Err(SiteError::ReservedSlug(_))));
        }
        validate_slug("resources-2024").unwrap();
    }

    #[test]
    fn path_helpers() {
        let ws = Path::new("/tmp/ws");
        assert_eq!(
            research_gate(ws),
            PathBuf::from("/tmp/ws/resources/index.md")
        );
        assert_eq!(
            project_dir(ws, "wm-acme"),
            PathBuf::from("/tmp/ws/projects/wm-acme")
        );
        assert_eq!(
            site_figure_path(Path::new("/out"), "wm-acme", Path::new("atlas/a/map.svg")),
            PathBuf::from("/out/wm-acme/figures/atlas/a/map.svg")
        );
    }

    #[test]
    fn depth_prefix_repeats() {
        assert_eq!(depth_prefix(0), "");
        assert_eq!(depth_prefix(2), "../../");
    }

    #[test]
    fn href_uses_forward_slashes() {
        assert_eq!(href(Path::new("atlas/a/map.svg")), "atlas/a/map.svg");
    }
}
