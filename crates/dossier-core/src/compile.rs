//! One-shot compile of a workspace into a static site.
//!
//! A run moves through `Init → WorkspaceValidated → ClientPagesRendered →
//! ProjectsRendered → Done`. Preconditions are all checked before the output
//! directory is touched, so a failed precondition leaves no output behind.
//! Projects are rendered into memory first; a project that fails with a
//! recoverable error is skipped whole and never linked from the site.

use crate::config::{ConfigWarning, SiteConfig};
use crate::contribution::{Block, Builder, Figure, Link, ProjectContribution, SectionBody};
use crate::diagram::{DiagramCache, DiagramRenderer};
use crate::error::{Result, SiteError};
use crate::gate::{self, StageCompletionVector};
use crate::nav::{self, Crumb, NavEntry};
use crate::page::{BodyRenderer, Page, PageAssembler};
use crate::paths;
use crate::project::{self, Project, SkippedProject};
use crate::text;
use crate::tool_runner::{MarkdownConverter, Toolchain};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// CompileState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompileState {
    Init,
    WorkspaceValidated,
    ClientPagesRendered,
    ProjectsRendered,
    Done,
}

impl CompileState {
    pub fn as_str(self) -> &'static str {
        match self {
            CompileState::Init => "init",
            CompileState::WorkspaceValidated => "workspace_validated",
            CompileState::ClientPagesRendered => "client_pages_rendered",
            CompileState::ProjectsRendered => "projects_rendered",
            CompileState::Done => "done",
        }
    }

    pub fn next(self) -> Option<CompileState> {
        match self {
            CompileState::Init => Some(CompileState::WorkspaceValidated),
            CompileState::WorkspaceValidated => Some(CompileState::ClientPagesRendered),
            CompileState::ClientPagesRendered => Some(CompileState::ProjectsRendered),
            CompileState::ProjectsRendered => Some(CompileState::Done),
            CompileState::Done => None,
        }
    }
}

impl fmt::Display for CompileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CompileReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct CompileReport {
    pub output_dir: PathBuf,
    pub projects_rendered: Vec<String>,
    pub projects_skipped: Vec<SkippedProject>,
    pub pages_written: usize,
    pub figures_copied: usize,
    pub diagrams_rendered: usize,
    pub diagram_cache_hits: usize,
    pub warnings: Vec<ConfigWarning>,
}

// ---------------------------------------------------------------------------
// Gate survey
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ProjectGates {
    pub slug: String,
    pub title: String,
    pub completion: StageCompletionVector,
}

#[derive(Debug, Default, Serialize)]
pub struct GateSurvey {
    pub research_gate: bool,
    pub projects: Vec<ProjectGates>,
    pub skipped: Vec<SkippedProject>,
}

/// Stage completion for every project, without tools and without writing.
pub fn survey(workspace: &Path) -> Result<GateSurvey> {
    if !workspace.is_dir() {
        return Err(SiteError::WorkspaceNotFound(workspace.to_path_buf()));
    }
    let scan = project::discover(workspace)?;
    let mut survey = GateSurvey {
        research_gate: paths::research_gate(workspace).is_file(),
        skipped: scan.skipped,
        ..Default::default()
    };
    for project in scan.projects {
        match gate::detect(&project) {
            Ok(completion) => survey.projects.push(ProjectGates {
                title: project_title(&project, &completion),
                slug: project.slug,
                completion,
            }),
            Err(e) => {
                tracing::warn!(project = %project.slug, error = %e, "skipping project");
                survey.skipped.push(SkippedProject {
                    slug: project.slug,
                    reason: e.to_string(),
                });
            }
        }
    }
    Ok(survey)
}

fn project_title(project: &Project, vector: &StageCompletionVector) -> String {
    vector
        .artifact("brief")
        .and_then(text::file_title)
        .unwrap_or_else(|| text::titleize(&project.slug))
}

// ---------------------------------------------------------------------------
// SiteCompiler
// ---------------------------------------------------------------------------

pub struct SiteCompiler {
    workspace: PathBuf,
    output: PathBuf,
    config: SiteConfig,
    state: CompileState,
    warnings: Vec<ConfigWarning>,
}

/// A project fully rendered in memory, ready to be written.
struct RenderedProject {
    slug: String,
    title: String,
    kind_label: &'static str,
    completed: usize,
    total: usize,
    /// `(site-relative path, page)`; the workspace nav is filled in at write
    /// time, once the set of rendered projects is final.
    pages: Vec<(String, Page)>,
    figures: Vec<Figure>,
}

impl SiteCompiler {
    /// `output` overrides the configured output directory.
    pub fn new(workspace: impl Into<PathBuf>, output: Option<PathBuf>, config: SiteConfig) -> Self {
        let workspace = workspace.into();
        let output = output.unwrap_or_else(|| config.output_path(&workspace));
        Self {
            workspace,
            output,
            config,
            state: CompileState::Init,
            warnings: Vec::new(),
        }
    }

    pub fn state(&self) -> CompileState {
        self.state
    }

    pub fn output_dir(&self) -> &Path {
        &self.output
    }

    fn advance(&mut self, to: CompileState) {
        debug_assert_eq!(self.state.next(), Some(to), "compile states advance in order");
        tracing::debug!(from = %self.state, to = %to, "compile state");
        self.state = to;
    }

    /// Check every workspace precondition. Nothing is written.
    ///
    /// Tool detection is separate (see [`Toolchain::detect`]) so callers can
    /// validate, then locate tools, then compile.
    pub fn validate(&mut self) -> Result<()> {
        if self.state != CompileState::Init {
            return Ok(());
        }
        if !self.workspace.is_dir() {
            return Err(SiteError::WorkspaceNotFound(self.workspace.clone()));
        }
        let gate = paths::research_gate(&self.workspace);
        if !gate.is_file() {
            return Err(SiteError::ResearchGateMissing(gate));
        }
        self.warnings = self.config.check()?;
        for w in &self.warnings {
            tracing::warn!(level = ?w.level, "{}", w.message);
        }
        check_output_dir(&self.workspace, &self.output)?;
        self.advance(CompileState::WorkspaceValidated);
        Ok(())
    }

    pub fn compile(&mut self, tools: &Toolchain) -> Result<CompileReport> {
        self.compile_with(tools.markdown.as_ref(), tools.diagrams.as_ref())
    }

    pub fn compile_with(
        &mut self,
        converter: &dyn MarkdownConverter,
        renderer: &dyn DiagramRenderer,
    ) -> Result<CompileReport> {
        self.validate()?;
        if self.state != CompileState::WorkspaceValidated {
            return Err(SiteError::InvalidConfig(format!(
                "compiler already ran (state {})",
                self.state
            )));
        }

        let cache = DiagramCache::new(renderer);
        let body = BodyRenderer { converter };
        let mut report = CompileReport {
            output_dir: self.output.clone(),
            warnings: self.warnings.clone(),
            ..Default::default()
        };

        // Render projects into memory so a recoverable failure never leaves a
        // half-written project or a dangling nav link.
        let scan = project::discover(&self.workspace)?;
        report.projects_skipped = scan.skipped;
        let mut rendered = Vec::new();
        let mut contributions = Vec::new();
        for project in &scan.projects {
            match self.build_project(project, &cache) {
                Ok(contribution) => contributions.push(contribution),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => skip(&mut report, &project.slug, e),
            }
        }
        for (contribution, vector) in &contributions {
            match render_project(contribution, vector, &body) {
                Ok(project) => rendered.push(project),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => skip(&mut report, &contribution.slug, e),
            }
        }
        let listing: Vec<(String, String)> = rendered
            .iter()
            .map(|p| (p.slug.clone(), p.title.clone()))
            .collect();

        crate::io::reset_dir(&self.output)?;
        let assembler = PageAssembler::new(&self.output, self.config.title.clone());
        assembler.write_stylesheet()?;
        self.write_client_pages(&assembler, &body, &rendered, &listing)?;
        self.advance(CompileState::ClientPagesRendered);

        for project in &rendered {
            for (rel, page) in &project.pages {
                let page = Page {
                    nav: nav::workspace_nav(&listing, &project.slug, page.depth),
                    ..page.clone()
                };
                assembler.write(rel, &page)?;
            }
            report.figures_copied += publish_figures(&self.output, &project.slug, &project.figures)?;
            tracing::info!(
                project = %project.slug,
                pages = project.pages.len(),
                stages = project.completed,
                "project rendered"
            );
            report.projects_rendered.push(project.slug.clone());
        }
        self.advance(CompileState::ProjectsRendered);

        report.pages_written = assembler.pages_written();
        report.diagrams_rendered = cache.renders();
        report.diagram_cache_hits = cache.hits();
        self.advance(CompileState::Done);
        tracing::info!(
            output = %self.output.display(),
            pages = report.pages_written,
            projects = report.projects_rendered.len(),
            skipped = report.projects_skipped.len(),
            "site compiled"
        );
        Ok(report)
    }

    fn build_project(
        &self,
        project: &Project,
        cache: &DiagramCache<'_>,
    ) -> Result<(ProjectContribution, StageCompletionVector)> {
        let vector = gate::detect(project)?;
        let builder = Builder {
            cache,
            diagrams: &self.config.diagrams,
        };
        let contribution = builder.build(project, &vector)?;
        Ok((contribution, vector))
    }

    // -----------------------------------------------------------------------
    // Client pages
    // -----------------------------------------------------------------------

    fn write_client_pages(
        &self,
        assembler: &PageAssembler,
        body: &BodyRenderer<'_>,
        projects: &[RenderedProject],
        listing: &[(String, String)],
    ) -> Result<()> {
        // Home: engagement summary, then the project list.
        let mut blocks = Vec::new();
        let engagement = paths::engagement_md(&self.workspace);
        if engagement.is_file() {
            blocks.push(Block::Markdown { path: engagement });
        }
        if !projects.is_empty() {
            blocks.push(Block::Heading {
                level: 2,
                text: "Projects".to_string(),
            });
            blocks.push(Block::Links {
                items: projects
                    .iter()
                    .map(|p| Link {
                        title: p.title.clone(),
                        href: format!("{}/{}", p.slug, paths::INDEX_HTML),
                        note: Some(format!(
                            "{} · {} of {} stages",
                            p.kind_label, p.completed, p.total
                        )),
                    })
                    .collect(),
            });
        }
        assembler.write(
            paths::INDEX_HTML,
            &Page {
                title: self.config.title.clone(),
                depth: 0,
                nav: nav::workspace_nav(listing, nav::HOME, 0),
                body: body.blocks(&blocks, "")?,
                ..Default::default()
            },
        )?;

        // Resources: the agreed research index plus one page per document.
        let docs: Vec<(String, String, PathBuf)> =
            crate::io::markdown_files(&paths::resources_dir(&self.workspace))?
                .into_iter()
                .filter(|p| !p.ends_with(paths::RESEARCH_GATE))
                .filter_map(|p| {
                    let stem = p.file_stem()?.to_string_lossy().into_owned();
                    let title = text::file_title(&p).unwrap_or_else(|| text::titleize(&stem));
                    Some((stem, title, p))
                })
                .collect();

        let mut blocks = vec![Block::Markdown {
            path: paths::research_gate(&self.workspace),
        }];
        if !docs.is_empty() {
            blocks.push(Block::Links {
                items: docs
                    .iter()
                    .map(|(stem, title, _)| Link {
                        title: title.clone(),
                        href: format!("{}/{stem}.html", paths::RESOURCES_DIR),
                        note: None,
                    })
                    .collect(),
            });
        }
        assembler.write(
            paths::RESOURCES_HTML,
            &Page {
                title: "Resources".to_string(),
                depth: 0,
                nav: nav::workspace_nav(listing, nav::RESOURCES, 0),
                body: body.blocks(&blocks, "")?,
                ..Default::default()
            },
        )?;

        let entries: Vec<NavEntry> = docs
            .iter()
            .map(|(stem, title, _)| NavEntry::new(stem.clone(), title.clone(), format!("{stem}.html")))
            .collect();
        for (stem, title, path) in &docs {
            assembler.write(
                &format!("{}/{stem}.html", paths::RESOURCES_DIR),
                &Page {
                    title: title.clone(),
                    depth: 1,
                    nav: nav::workspace_nav(listing, nav::RESOURCES, 1),
                    localnav: nav::static_nav(&entries, stem, 0),
                    breadcrumb: vec![
                        Crumb::link("Home", format!("../{}", paths::INDEX_HTML)),
                        Crumb::link("Resources", format!("../{}", paths::RESOURCES_HTML)),
                        Crumb::here(title.clone()),
                    ],
                    body: body.markdown_file(path)?,
                    ..Default::default()
                },
            )?;
        }
        Ok(())
    }
}

fn skip(report: &mut CompileReport, slug: &str, e: SiteError) {
    tracing::warn!(project = %slug, error = %e, "skipping project");
    report.projects_skipped.push(SkippedProject {
        slug: slug.to_string(),
        reason: e.to_string(),
    });
}

// ---------------------------------------------------------------------------
// Project pages
// ---------------------------------------------------------------------------

fn render_project(
    c: &ProjectContribution,
    vector: &StageCompletionVector,
    body: &BodyRenderer<'_>,
) -> Result<RenderedProject> {
    let slug = c.slug.as_str();
    let mut pages = Vec::new();
    let mut figures = Vec::new();
    collect_figures(&c.overview, &mut figures);
    if let Some(hero) = &c.hero {
        figures.push(hero.clone());
    }

    let crumbs = |depth: usize, trail: &[(&str, &str)], here: &str| {
        let prefix = paths::depth_prefix(depth);
        let mut out = vec![Crumb::link("Home", format!("{prefix}{}", paths::INDEX_HTML))];
        out.extend(
            trail
                .iter()
                .map(|(title, href)| Crumb::link(*title, format!("{prefix}{slug}/{href}"))),
        );
        out.push(Crumb::here(here));
        out
    };

    // Project home: hero map, overview, section links.
    let mut html = String::new();
    if let Some(hero) = &c.hero {
        html.push_str("<div class=\"hero\">\n");
        html.push_str(&crate::page::figure(hero, &format!("{}/", paths::FIGURES_DIR)));
        html.push_str("</div>\n");
    }
    html.push_str(&body.blocks(&c.overview, &format!("{}/", paths::FIGURES_DIR))?);
    pages.push((
        format!("{slug}/{}", paths::INDEX_HTML),
        Page {
            title: c.title.clone(),
            depth: 1,
            subnav: nav::project_nav(vector, nav::OVERVIEW, 0),
            breadcrumb: crumbs(1, &[], c.title.as_str()),
            body: html,
            ..Default::default()
        },
    ));

    let figures_href = format!("../{}/", paths::FIGURES_DIR);
    let project_href = paths::INDEX_HTML;
    for section in &c.sections {
        let section_pages = section.pages();
        for page in &section_pages {
            collect_figures(&page.blocks, &mut figures);
        }

        if section.has_index {
            let mut blocks = Vec::new();
            match &section.body {
                SectionBody::Groups(groups) => {
                    for group in groups {
                        blocks.push(Block::Heading {
                            level: 2,
                            text: group.title.clone(),
                        });
                        blocks.push(Block::Links {
                            items: group.pages.iter().map(local_link).collect(),
                        });
                    }
                }
                SectionBody::Pages(list) => blocks.push(Block::Links {
                    items: list.iter().map(local_link).collect(),
                }),
            }
            pages.push((
                format!("{slug}/{}/{}", section.dir, paths::INDEX_HTML),
                Page {
                    title: section.title.clone(),
                    depth: 2,
                    subnav: nav::project_nav(vector, section.id, 1),
                    breadcrumb: crumbs(2, &[(c.title.as_str(), project_href)], section.title.as_str()),
                    body: body.blocks(&blocks, &figures_href)?,
                    ..Default::default()
                },
            ));
        }

        // Sibling navigation only for sections that list several pages.
        let entries: Vec<NavEntry> = if section.has_index {
            section_pages
                .iter()
                .map(|p| NavEntry::new(p.slug.clone(), p.title.clone(), format!("{}.html", p.slug)))
                .collect()
        } else {
            Vec::new()
        };
        let section_href = format!("{}/{}", section.dir, paths::INDEX_HTML);
        for page in section_pages {
            let trail: Vec<(&str, &str)> = if section.has_index {
                vec![(c.title.as_str(), project_href), (section.title.as_str(), section_href.as_str())]
            } else {
                vec![(c.title.as_str(), project_href)]
            };
            pages.push((
                format!("{slug}/{}", section.page_href(page)),
                Page {
                    title: page.title.clone(),
                    depth: 2,
                    subnav: nav::project_nav(vector, section.id, 1),
                    localnav: nav::static_nav(&entries, &page.slug, 0),
                    breadcrumb: crumbs(2, &trail, page.title.as_str()),
                    body: body.blocks(&page.blocks, &figures_href)?,
                    ..Default::default()
                },
            ));
        }
    }

    Ok(RenderedProject {
        slug: c.slug.clone(),
        title: c.title.clone(),
        kind_label: c.kind.label(),
        completed: vector.completed_count(),
        total: vector.stages.len(),
        pages,
        figures,
    })
}

fn local_link(page: &crate::contribution::ContentPage) -> Link {
    Link {
        title: page.title.clone(),
        href: format!("{}.html", page.slug),
        note: None,
    }
}

fn collect_figures(blocks: &[Block], out: &mut Vec<Figure>) {
    out.extend(blocks.iter().filter_map(|b| match b {
        Block::Figure(f) => Some(f.clone()),
        _ => None,
    }));
}

/// Copy each figure once to `site/{slug}/figures/{project-relative path}`.
fn publish_figures(site: &Path, slug: &str, figures: &[Figure]) -> Result<usize> {
    let unique: BTreeMap<&Path, &Path> = figures
        .iter()
        .map(|f| (f.project_relative.as_path(), f.path.as_path()))
        .collect();
    for (rel, src) in &unique {
        crate::io::copy_file(src, &paths::site_figure_path(site, slug, rel))?;
    }
    Ok(unique.len())
}

// ---------------------------------------------------------------------------
// Output directory safety
// ---------------------------------------------------------------------------

/// Absolute, symlink-resolved form of `path`, resolving the longest existing
/// ancestor when `path` itself does not exist yet.
fn resolve(path: &Path) -> PathBuf {
    if let Ok(p) = path.canonicalize() {
        return p;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => resolve(parent).join(name),
        _ => match std::env::current_dir() {
            Ok(cwd) if path.is_relative() => cwd.join(path),
            _ => path.to_path_buf(),
        },
    }
}

/// The output tree is wiped on every run, so it must not contain the
/// workspace or live inside its source directories.
fn check_output_dir(workspace: &Path, output: &Path) -> Result<()> {
    let ws = resolve(workspace);
    let out = resolve(output);
    let unsafe_dir = ws.starts_with(&out)
        || out.starts_with(ws.join(paths::RESOURCES_DIR))
        || out.starts_with(ws.join(paths::PROJECTS_DIR));
    if unsafe_dir {
        return Err(SiteError::UnsafeOutputDir(output.to_path_buf()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
