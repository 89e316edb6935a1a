use crate::error::{Result, SiteError};
use crate::gate;
use crate::paths;
use crate::types::ProjectKind;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub slug: String,
    pub kind: ProjectKind,
    pub root: PathBuf,
}

impl Project {
    /// Resolve a project directory. Fails with `UnknownProjectKind` when no
    /// kind rule matches.
    pub fn resolve(root: &Path) -> Result<Self> {
        let slug = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        paths::validate_slug(&slug)?;
        let kind =
            gate::resolve_kind(&slug, root).ok_or_else(|| SiteError::UnknownProjectKind(slug.clone()))?;
        Ok(Self {
            slug,
            kind,
            root: root.to_path_buf(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedProject {
    pub slug: String,
    pub reason: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ProjectScan {
    pub projects: Vec<Project>,
    pub skipped: Vec<SkippedProject>,
}

/// List `projects/*` in slug order. Directories that cannot be resolved are
/// reported in `skipped` with a warning, never as an error.
pub fn discover(workspace: &Path) -> Result<ProjectScan> {
    let dirs = crate::io::sorted_entries(&paths::projects_dir(workspace), |p| p.is_dir())?;
    let mut scan = ProjectScan::default();
    for dir in dirs {
        match Project::resolve(&dir) {
            Ok(project) => scan.projects.push(project),
            Err(e) => {
                let slug = dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                tracing::warn!(project = %slug, error = %e, "skipping project");
                scan.skipped.push(SkippedProject {
                    slug,
                    reason: e.to_string(),
                });
            }
        }
    }
    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn discover_resolves_and_skips() {
        let dir = TempDir::new().unwrap();
        let projects = dir.path().join("projects");
        std::fs::create_dir_all(projects.join("wm-acme")).unwrap();
        std::fs::create_dir_all(projects.join("bmc-shop")).unwrap();
        std::fs::create_dir_all(projects.join("misc")).unwrap();
        std::fs::create_dir_all(projects.join("Bad Name")).unwrap();
        std::fs::write(projects.join("notes.md"), "not a project").unwrap();

        let scan = discover(dir.path()).unwrap();
        let slugs: Vec<_> = scan.projects.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["bmc-shop", "wm-acme"]);
        assert_eq!(scan.projects[0].kind, ProjectKind::BusinessCanvas);

        let skipped: Vec<_> = scan.skipped.iter().map(|s| s.slug.as_str()).collect();
        assert_eq!(skipped, vec!["Bad Name", "misc"]);
        assert!(scan.skipped[1].reason.contains("project kind"));
    }

    #[test]
    fn reserved_slugs_are_skipped() {
        let dir = TempDir::new().unwrap();
        let projects = dir.path().join("projects");
        std::fs::create_dir_all(projects.join("resources/evolve")).unwrap();
        std::fs::create_dir_all(projects.join("home/canvas")).unwrap();
        std::fs::create_dir_all(projects.join("wm-acme")).unwrap();

        let scan = discover(dir.path()).unwrap();
        assert_eq!(scan.projects.len(), 1);
        assert_eq!(scan.projects[0].slug, "wm-acme");
        let skipped: Vec<_> = scan.skipped.iter().map(|s| s.slug.as_str()).collect();
        assert_eq!(skipped, vec!["home", "resources"]);
        assert!(scan.skipped[1].reason.contains("reserved"));
    }

    #[test]
    fn missing_projects_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let scan = discover(dir.path()).unwrap();
        assert!(scan.projects.is_empty());
        assert!(scan.skipped.is_empty());
    }
}
