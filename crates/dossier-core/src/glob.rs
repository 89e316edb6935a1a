//! Wildcard patterns for gate paths and view-name tables.

use crate::error::{Result, SiteError};
use globset::{Glob, GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Any-of set over bare names such as atlas view directories.
pub fn name_set(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).map_err(|e| invalid(pattern, e))?);
    }
    builder
        .build()
        .map_err(|e| invalid(&patterns.join(", "), e))
}

/// Matcher for a `/`-separated path relative to a project root. `*` stays
/// inside one segment.
pub fn path_matcher(pattern: &str) -> Result<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|e| invalid(pattern, e))
}

fn invalid(pattern: &str, err: globset::Error) -> SiteError {
    SiteError::InvalidPattern {
        pattern: pattern.to_string(),
        detail: err.to_string(),
    }
}

/// First file under `root` matching `pattern`, visiting each directory in
/// lexical order.
pub fn first_match(root: &Path, pattern: &str) -> Result<Option<PathBuf>> {
    if !root.is_dir() {
        return Ok(None);
    }
    let matcher = path_matcher(pattern)?;
    let depth = pattern.split('/').filter(|s| !s.is_empty()).count();

    for entry in WalkDir::new(root)
        .min_depth(depth)
        .max_depth(depth)
        .sort_by_file_name()
    {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.path().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        if matcher.is_match(rel) {
            return Ok(Some(entry.into_path()));
        }
    }
    Ok(None)
}
