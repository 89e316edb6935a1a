//! Detection and subprocess invocation for the two external tools.
//!
//! - The markdown converter reads markdown on stdin and writes an HTML
//!   fragment to stdout (default: `pandoc --from gfm --to html5`).
//! - The diagram renderer turns a source file into an SVG at a fixed size
//!   (default: `mmdc -i {input} -o {output} -w {width} -H {height}`).
//!
//! Both must be present before any output is written; [`Toolchain::detect`]
//! checks that up front.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::{DiagramToolConfig, MarkdownToolConfig, SiteConfig};
use crate::diagram::DiagramRenderer;
use crate::error::{Result, SiteError};

/// Turns markdown text into an HTML fragment.
pub trait MarkdownConverter {
    fn to_html(&self, markdown: &str) -> Result<String>;
}

/// Resolve `program` against PATH (or as a literal path).
pub fn locate(program: &str) -> Result<PathBuf> {
    which::which(program).map_err(|_| SiteError::ToolNotFound(program.to_string()))
}

// ---------------------------------------------------------------------------
// ExternalConverter
// ---------------------------------------------------------------------------

pub struct ExternalConverter {
    program: PathBuf,
    args: Vec<String>,
}

impl ExternalConverter {
    pub fn detect(config: &MarkdownToolConfig) -> Result<Self> {
        Ok(Self {
            program: locate(&config.program)?,
            args: config.args.clone(),
        })
    }
}

impl MarkdownConverter for ExternalConverter {
    fn to_html(&self, markdown: &str) -> Result<String> {
        let tool = self.program.display().to_string();
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SiteError::ToolSpawn {
                tool: tool.clone(),
                source,
            })?;

        // Stdin is fed from its own thread: a tool that streams can fill
        // stdout before it has read all of its input. The writer drops stdin
        // when done so the tool sees EOF.
        let stdin = child.stdin.take();
        let (output, written) = std::thread::scope(|scope| {
            let writer = stdin.map(|mut stdin| {
                scope.spawn(move || stdin.write_all(markdown.as_bytes()))
            });
            let output = child.wait_with_output();
            (output, writer.map(|w| w.join()))
        });

        let output = output.map_err(|source| SiteError::ToolSpawn {
            tool: tool.clone(),
            source,
        })?;
        match written {
            // A tool that exits before reading reports through its exit status.
            Some(Ok(Err(e))) if e.kind() != std::io::ErrorKind::BrokenPipe => {
                return Err(SiteError::ToolSpawn { tool, source: e });
            }
            Some(Err(_)) => {
                return Err(SiteError::ToolFailed {
                    tool,
                    detail: "stdin writer panicked".to_string(),
                });
            }
            _ => {}
        }
        if !output.status.success() {
            return Err(SiteError::ToolFailed {
                tool,
                detail: failure_detail(&output),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

// ---------------------------------------------------------------------------
// ExternalRenderer
// ---------------------------------------------------------------------------

pub struct ExternalRenderer {
    program: PathBuf,
    config: DiagramToolConfig,
}

impl ExternalRenderer {
    pub fn detect(config: &DiagramToolConfig) -> Result<Self> {
        Ok(Self {
            program: locate(&config.program)?,
            config: config.clone(),
        })
    }
}

impl DiagramRenderer for ExternalRenderer {
    fn render(&self, source: &Path, output: &Path) -> Result<()> {
        let result = Command::new(&self.program)
            .args(self.config.expand_args(source, output))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| SiteError::DiagramRender {
                source_path: source.to_path_buf(),
                detail: format!("failed to spawn {}: {e}", self.program.display()),
            })?;
        if !result.status.success() {
            return Err(SiteError::DiagramRender {
                source_path: source.to_path_buf(),
                detail: failure_detail(&result),
            });
        }
        Ok(())
    }
}

fn failure_detail(output: &std::process::Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let hint: String = stderr.trim().chars().take(500).collect();
    match output.status.code() {
        Some(code) if hint.is_empty() => format!("exit code {code}"),
        Some(code) => format!("exit code {code}: {hint}"),
        None => format!("terminated by signal: {hint}"),
    }
}

// ---------------------------------------------------------------------------
// Toolchain
// ---------------------------------------------------------------------------

/// The converter and renderer a compile runs with.
pub struct Toolchain {
    pub markdown: Box<dyn MarkdownConverter>,
    pub diagrams: Box<dyn DiagramRenderer>,
}

impl Toolchain {
    /// Locate both external tools. A missing tool is a fatal precondition.
    pub fn detect(config: &SiteConfig) -> Result<Self> {
        let markdown = ExternalConverter::detect(&config.markdown)?;
        let diagrams = ExternalRenderer::detect(&config.diagrams)?;
        tracing::debug!(
            markdown = %markdown.program.display(),
            diagrams = %diagrams.program.display(),
            "external tools located"
        );
        Ok(Self {
            markdown: Box::new(markdown),
            diagrams: Box::new(diagrams),
        })
    }
}
