use dossier_core::paths;
use std::path::{Path, PathBuf};

/// Make the workspace path absolute against the current directory.
///
/// Existence is not checked here; the compiler reports a missing workspace
/// as its first precondition.
pub fn resolve_workspace(explicit: &Path) -> PathBuf {
    if explicit.is_absolute() {
        return explicit.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(explicit),
        Err(_) => explicit.to_path_buf(),
    }
}

/// `--config` when given, else `render-site.yaml` in the workspace.
pub fn config_path(workspace: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(p) => p.to_path_buf(),
        None => paths::config_path(workspace),
    }
}
