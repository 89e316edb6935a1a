use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ProjectKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectKind {
    WardleyMap,
    BusinessCanvas,
}

impl ProjectKind {
    pub fn all() -> &'static [ProjectKind] {
        &[ProjectKind::WardleyMap, ProjectKind::BusinessCanvas]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProjectKind::WardleyMap => "wardley_map",
            ProjectKind::BusinessCanvas => "business_canvas",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProjectKind::WardleyMap => "Wardley Map",
            ProjectKind::BusinessCanvas => "Business Model Canvas",
        }
    }
}

impl fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProjectKind {
    type Err = crate::error::SiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wardley_map" => Ok(ProjectKind::WardleyMap),
            "business_canvas" => Ok(ProjectKind::BusinessCanvas),
            _ => Err(crate::error::SiteError::UnknownProjectKind(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Index bucket for an atlas view. Declaration order is index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Structural,
    Connectivity,
    Strategic,
    Dynamic,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Structural => "structural",
            Category::Connectivity => "connectivity",
            Category::Strategic => "strategic",
            Category::Dynamic => "dynamic",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Category::Structural => "Structural",
            Category::Connectivity => "Connectivity",
            Category::Strategic => "Strategic",
            Category::Dynamic => "Dynamic",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
