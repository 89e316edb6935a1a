use crate::error::Result;
use crate::glob;
use crate::paths;
use crate::types::Category;
use globset::GlobSet;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Category rules
// ---------------------------------------------------------------------------

/// One row of the view-name table: any pattern matching assigns `category`.
pub struct CategoryRule {
    pub patterns: &'static [&'static str],
    pub category: Category,
}

/// Checked top to bottom; first match wins.
pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        patterns: &["play-*"],
        category: Category::Strategic,
    },
    CategoryRule {
        patterns: &[
            "overview",
            "layers",
            "anchors",
            "components",
            "value-chain",
            "*-landscape",
        ],
        category: Category::Structural,
    },
    CategoryRule {
        patterns: &[
            "bottlenecks",
            "dependencies",
            "coupling",
            "shared-*",
            "*-flows",
        ],
        category: Category::Connectivity,
    },
    CategoryRule {
        patterns: &[
            "evolution",
            "movement",
            "inertia",
            "forecast-*",
            "*-trajectory",
        ],
        category: Category::Dynamic,
    },
];

impl CategoryRule {
    pub fn name_set(&self) -> Result<GlobSet> {
        glob::name_set(self.patterns)
    }
}

/// Unmatched views land in the broadest bucket.
pub const DEFAULT_CATEGORY: Category = Category::Strategic;

pub fn classify(view_name: &str) -> Category {
    static RULES: OnceLock<Vec<(GlobSet, Category)>> = OnceLock::new();
    let rules = RULES.get_or_init(|| {
        CATEGORY_RULES
            .iter()
            .map(|r| (r.name_set().unwrap(), r.category))
            .collect()
    });
    first_category(rules, view_name)
}

pub fn classify_with(rules: &[CategoryRule], view_name: &str) -> Result<Category> {
    let compiled = rules
        .iter()
        .map(|r| Ok((r.name_set()?, r.category)))
        .collect::<Result<Vec<_>>>()?;
    Ok(first_category(&compiled, view_name))
}

fn first_category(rules: &[(GlobSet, Category)], view_name: &str) -> Category {
    rules
        .iter()
        .find(|(set, _)| set.is_match(view_name))
        .map(|(_, category)| *category)
        .unwrap_or(DEFAULT_CATEGORY)
}

// ---------------------------------------------------------------------------
// AtlasView
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtlasView {
    pub name: String,
    pub dir: PathBuf,
    pub analysis: PathBuf,
    /// Diagram sources that need rendering before the view can be shown.
    pub sources: Vec<PathBuf>,
    /// Images already present in the view directory.
    pub images: Vec<PathBuf>,
    pub category: Category,
}

impl AtlasView {
    pub fn title(&self) -> String {
        crate::text::file_title(&self.analysis)
            .unwrap_or_else(|| crate::text::titleize(&self.name))
    }
}

/// Views under `atlas/`, sorted by name. A directory is a view only if it
/// holds an analysis document.
pub fn discover_views(project_root: &Path, source_extension: &str) -> Result<Vec<AtlasView>> {
    let dirs = crate::io::sorted_entries(&paths::atlas_dir(project_root), |p| {
        p.join(paths::ANALYSIS_MD).is_file()
    })?;

    let mut views = Vec::new();
    for dir in dirs {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let sources = crate::io::sorted_entries(&dir, |p| {
            p.is_file()
                && p.extension()
                    .is_some_and(|e| e.to_string_lossy() == source_extension)
        })?;
        let images = crate::io::sorted_entries(&dir, |p| p.is_file() && is_image(p))?;
        views.push(AtlasView {
            category: classify(&name),
            analysis: dir.join(paths::ANALYSIS_MD),
            name,
            dir,
            sources,
            images,
        });
    }
    Ok(views)
}

/// Raster or vector image by extension.
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|e| matches!(e.as_str(), "svg" | "png" | "jpg" | "jpeg" | "gif" | "webp"))
}

/// Views bucketed by category, in category order; empty buckets omitted.
pub fn group_by_category(views: &[AtlasView]) -> Vec<(Category, Vec<&AtlasView>)> {
    let mut buckets: BTreeMap<Category, Vec<&AtlasView>> = BTreeMap::new();
    for view in views {
        buckets.entry(view.category).or_default().push(view);
    }
    buckets.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn classify_table() {
        assert_eq!(classify("layers"), Category::Structural);
        assert_eq!(classify("retail-landscape"), Category::Structural);
        assert_eq!(classify("bottlenecks"), Category::Connectivity);
        assert_eq!(classify("data-flows"), Category::Connectivity);
        assert_eq!(classify("movement"), Category::Dynamic);
        assert_eq!(classify("forecast-2027"), Category::Dynamic);
        assert_eq!(classify("play-open-source"), Category::Strategic);
        assert_eq!(classify("doctrine"), Category::Strategic);
    }

    #[test]
    fn first_match_wins() {
        // Matches both play-* and *-flows; the earlier rule decides.
        assert_eq!(classify("play-data-flows"), Category::Strategic);
    }

    #[test]
    fn custom_rules_fall_back_to_default() {
        let rules = [CategoryRule {
            patterns: &["x-*"],
            category: Category::Dynamic,
        }];
        assert_eq!(classify_with(&rules, "x-1").unwrap(), Category::Dynamic);
        assert_eq!(classify_with(&rules, "layers").unwrap(), DEFAULT_CATEGORY);
    }

    #[test]
    fn builtin_patterns_compile() {
        for rule in CATEGORY_RULES {
            assert!(rule.name_set().is_ok(), "{:?}", rule.patterns);
        }
    }

    #[test]
    fn discover_requires_analysis() {
        let dir = TempDir::new().unwrap();
        let atlas = dir.path().join("atlas");
        std::fs::create_dir_all(atlas.join("bottlenecks")).unwrap();
        std::fs::create_dir_all(atlas.join("sketches")).unwrap();
        std::fs::write(
            atlas.join("bottlenecks/analysis.md"),
            "# Where work queues\n",
        )
        .unwrap();
        std::fs::write(atlas.join("bottlenecks/map.mmd"), "graph TD").unwrap();
        std::fs::write(atlas.join("bottlenecks/extra.png"), "png").unwrap();
        std::fs::write(atlas.join("sketches/map.mmd"), "graph TD").unwrap();

        let views = discover_views(dir.path(), "mmd").unwrap();
        assert_eq!(views.len(), 1);
        let v = &views[0];
        assert_eq!(v.name, "bottlenecks");
        assert_eq!(v.category, Category::Connectivity);
        assert_eq!(v.sources, vec![atlas.join("bottlenecks/map.mmd")]);
        assert_eq!(v.images, vec![atlas.join("bottlenecks/extra.png")]);
        assert_eq!(v.title(), "Where work queues");
    }

    #[test]
    fn grouping_orders_categories() {
        let view = |name: &str| AtlasView {
            name: name.to_string(),
            dir: PathBuf::from(name),
            analysis: PathBuf::from(name).join("analysis.md"),
            sources: Vec::new(),
            images: Vec::new(),
            category: classify(name),
        };
        let views = vec![view("movement"), view("bottlenecks"), view("layers"), view("coupling")];
        let groups = group_by_category(&views);
        let cats: Vec<_> = groups.iter().map(|(c, _)| *c).collect();
        assert_eq!(
            cats,
            vec![Category::Structural, Category::Connectivity, Category::Dynamic]
        );
        assert_eq!(groups[1].1.len(), 2);
        assert_eq!(view("x").title(), "X");
    }
}
