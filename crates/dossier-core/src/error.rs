use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("workspace not found: {0}")]
    WorkspaceNotFound(PathBuf),

    #[error("shared research gate missing: {0} (agree resources/index.md first)")]
    ResearchGateMissing(PathBuf),

    #[error("required tool not found on PATH: {0}")]
    ToolNotFound(String),

    #[error("{tool} failed: {detail}")]
    ToolFailed { tool: String, detail: String },

    #[error("failed to spawn {tool}: {source}")]
    ToolSpawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("diagram render failed for {source_path}: {detail}")]
    DiagramRender { source_path: PathBuf, detail: String },

    #[error("output directory {0} overlaps the workspace sources")]
    UnsafeOutputDir(PathBuf),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot resolve project kind for '{0}'")]
    UnknownProjectKind(String),

    #[error("invalid slug '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidSlug(String),

    #[error("project slug '{0}' is reserved for the site layout")]
    ReservedSlug(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid pattern '{pattern}': {detail}")]
    InvalidPattern { pattern: String, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SiteError {
    /// Whether this error must abort the whole compile rather than just the
    /// project it surfaced in.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SiteError::WorkspaceNotFound(_)
                | SiteError::ResearchGateMissing(_)
                | SiteError::ToolNotFound(_)
                | SiteError::DiagramRender { .. }
                | SiteError::UnsafeOutputDir(_)
                | SiteError::Write { .. }
                | SiteError::InvalidConfig(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SiteError>;
