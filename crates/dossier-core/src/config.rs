use crate::error::{Result, SiteError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// MarkdownToolConfig
// ---------------------------------------------------------------------------

/// The markdown-to-HTML converter. Markdown is fed on stdin, HTML read from
/// stdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkdownToolConfig {
    #[serde(default = "default_markdown_program")]
    pub program: String,
    #[serde(default = "default_markdown_args")]
    pub args: Vec<String>,
}

fn default_markdown_program() -> String {
    "pandoc".to_string()
}

fn default_markdown_args() -> Vec<String> {
    ["--from", "gfm", "--to", "html5"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for MarkdownToolConfig {
    fn default() -> Self {
        Self {
            program: default_markdown_program(),
            args: default_markdown_args(),
        }
    }
}

// ---------------------------------------------------------------------------
// DiagramToolConfig
// ---------------------------------------------------------------------------

/// The diagram-source-to-SVG renderer. `args` may reference `{input}`,
/// `{output}`, `{width}` and `{height}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiagramToolConfig {
    #[serde(default = "default_diagram_program")]
    pub program: String,
    #[serde(default = "default_diagram_args")]
    pub args: Vec<String>,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Extension (without dot) that marks a file as a diagram source.
    #[serde(default = "default_source_extension")]
    pub source_extension: String,
}

fn default_diagram_program() -> String {
    "mmdc".to_string()
}

fn default_diagram_args() -> Vec<String> {
    [
        "-i", "{input}", "-o", "{output}", "-w", "{width}", "-H", "{height}",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_width() -> u32 {
    1600
}

fn default_height() -> u32 {
    1000
}

fn default_source_extension() -> String {
    "mmd".to_string()
}

impl Default for DiagramToolConfig {
    fn default() -> Self {
        Self {
            program: default_diagram_program(),
            args: default_diagram_args(),
            width: default_width(),
            height: default_height(),
            source_extension: default_source_extension(),
        }
    }
}

impl DiagramToolConfig {
    /// Expand the args template for one render.
    pub fn expand_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        let width = self.width.to_string();
        let height = self.height.to_string();
        self.args
            .iter()
            .map(|a| {
                a.replace("{input}", &input)
                    .replace("{output}", &output)
                    .replace("{width}", &width)
                    .replace("{height}", &height)
            })
            .collect()
    }

    pub fn is_source(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|e| e.to_string_lossy() == self.source_extension)
    }
}

// ---------------------------------------------------------------------------
// SiteConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    #[serde(default = "default_title")]
    pub title: String,
    /// Output directory, relative to the workspace unless absolute.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub markdown: MarkdownToolConfig,
    #[serde(default)]
    pub diagrams: DiagramToolConfig,
}

fn default_title() -> String {
    "Engagement".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("site")
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            output_dir: default_output_dir(),
            markdown: MarkdownToolConfig::default(),
            diagrams: DiagramToolConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load `path`, or fall back to defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: SiteConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn output_path(&self, workspace: &Path) -> PathBuf {
        if self.output_dir.is_absolute() {
            self.output_dir.clone()
        } else {
            workspace.join(&self.output_dir)
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut error = |message: String| {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message,
            })
        };

        if self.markdown.program.trim().is_empty() {
            error("markdown.program is empty".to_string());
        }
        if self.diagrams.program.trim().is_empty() {
            error("diagrams.program is empty".to_string());
        }
        for placeholder in ["{input}", "{output}"] {
            if !self.diagrams.args.iter().any(|a| a.contains(placeholder)) {
                error(format!("diagrams.args never references {placeholder}"));
            }
        }
        if self.diagrams.width == 0 || self.diagrams.height == 0 {
            error("diagrams.width and diagrams.height must be non-zero".to_string());
        }
        if self.diagrams.source_extension.eq_ignore_ascii_case("svg") {
            error("diagrams.source_extension cannot be the rendered extension 'svg'".to_string());
        }

        if self.title.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "title is empty; pages will have bare section titles".to_string(),
            });
        }
        warnings
    }

    /// Fold `validate()` into a hard error when any warning is `Error` level.
    pub fn check(&self) -> Result<Vec<ConfigWarning>> {
        let warnings = self.validate();
        let errors: Vec<&str> = warnings
            .iter()
            .filter(|w| w.level == WarnLevel::Error)
            .map(|w| w.message.as_str())
            .collect();
        if !errors.is_empty() {
            return Err(SiteError::InvalidConfig(errors.join("; ")));
        }
        Ok(warnings)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
