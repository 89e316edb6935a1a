//! What a project contributes to the site, independent of how it is drawn.
//!
//! Nothing in this module produces markup: blocks reference source files and
//! figures, and `page` turns them into HTML.

use crate::atlas::{self, AtlasView};
use crate::config::DiagramToolConfig;
use crate::diagram::DiagramCache;
use crate::error::Result;
use crate::gate::{self, StageCompletionVector, StageStatus, ATLAS_STAGE, PRESENTATIONS_STAGE};
use crate::paths;
use crate::project::Project;
use crate::text;
use crate::tour::{self, StopDepth, Tour, TourSource};
use crate::types::ProjectKind;
use serde::Serialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    /// Existing image on disk.
    pub path: PathBuf,
    /// `path` relative to the project root; also its location under
    /// `site/{slug}/figures/`.
    pub project_relative: PathBuf,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub title: String,
    /// Relative to the project's site directory.
    pub href: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading { level: u8, text: String },
    Markdown { path: PathBuf },
    Figure(Figure),
    Links { items: Vec<Link> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentPage {
    pub slug: String,
    pub title: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageGroup {
    pub title: String,
    pub pages: Vec<ContentPage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionBody {
    Pages(Vec<ContentPage>),
    Groups(Vec<PageGroup>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSection {
    pub id: &'static str,
    pub title: String,
    /// Output subdirectory under `site/{slug}/`.
    pub dir: &'static str,
    /// Sections with an index page link to `{dir}/index.html`; the rest link
    /// straight to their single page.
    pub has_index: bool,
    pub body: SectionBody,
}

impl ProjectSection {
    pub fn pages(&self) -> Vec<&ContentPage> {
        match &self.body {
            SectionBody::Pages(pages) => pages.iter().collect(),
            SectionBody::Groups(groups) => groups.iter().flat_map(|g| g.pages.iter()).collect(),
        }
    }

    /// Project-relative href of the section's landing page.
    pub fn href(&self) -> String {
        if self.has_index {
            return format!("{}/{}", self.dir, paths::INDEX_HTML);
        }
        match self.pages().first() {
            Some(page) => self.page_href(page),
            None => format!("{}/{}", self.dir, paths::INDEX_HTML),
        }
    }

    pub fn page_href(&self, page: &ContentPage) -> String {
        format!("{}/{}.html", self.dir, page.slug)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectContribution {
    pub slug: String,
    pub title: String,
    pub kind: ProjectKind,
    pub hero: Option<Figure>,
    pub overview: Vec<Block>,
    pub sections: Vec<ProjectSection>,
}

impl ProjectContribution {
    pub fn section(&self, id: &str) -> Option<&ProjectSection> {
        self.sections.iter().find(|s| s.id == id)
    }
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

pub struct Builder<'a> {
    pub cache: &'a DiagramCache<'a>,
    pub diagrams: &'a DiagramToolConfig,
}

impl Builder<'_> {
    pub fn build(
        &self,
        project: &Project,
        vector: &StageCompletionVector,
    ) -> Result<ProjectContribution> {
        let mut sections = Vec::new();
        for status in vector.completed() {
            let section = match status.stage.id {
                ATLAS_STAGE => self.atlas_section(project, status)?,
                PRESENTATIONS_STAGE => self.presentations_section(project, status)?,
                _ => self.analysis_section(project, status)?,
            };
            sections.push(section);
        }

        let hero = match vector.artifact(gate::hero_stage(project.kind)) {
            Some(artifact) => self.figure(project, artifact, "Headline map")?,
            None => None,
        };

        let mut overview = Vec::new();
        let overview_md = project.root.join(paths::OVERVIEW_MD);
        if overview_md.is_file() {
            overview.push(Block::Markdown { path: overview_md });
        }
        if !sections.is_empty() {
            overview.push(Block::Links {
                items: sections
                    .iter()
                    .map(|s| Link {
                        title: s.title.clone(),
                        href: s.href(),
                        note: None,
                    })
                    .collect(),
            });
        }

        let title = vector
            .artifact("brief")
            .and_then(text::file_title)
            .unwrap_or_else(|| text::titleize(&project.slug));

        Ok(ProjectContribution {
            slug: project.slug.clone(),
            title,
            kind: project.kind,
            hero,
            overview,
            sections,
        })
    }

    /// An existing image, or a diagram source rendered through the cache.
    /// Anything else, or anything outside the project, is not a figure.
    fn figure(&self, project: &Project, path: &Path, caption: &str) -> Result<Option<Figure>> {
        let image = if self.diagrams.is_source(path) {
            self.cache.ensure_rendered(path)?
        } else if atlas::is_image(path) {
            path.to_path_buf()
        } else {
            return Ok(None);
        };
        let Ok(rel) = image.strip_prefix(&project.root) else {
            tracing::warn!(path = %image.display(), "figure outside project root; skipping");
            return Ok(None);
        };
        Ok(Some(Figure {
            project_relative: rel.to_path_buf(),
            path: image,
            caption: caption.to_string(),
        }))
    }

    fn analysis_section(&self, project: &Project, status: &StageStatus) -> Result<ProjectSection> {
        let stage = status.stage;
        let mut blocks = Vec::new();
        if let Some(artifact) = status.artifact.as_deref() {
            if is_markdown(artifact) {
                blocks.push(Block::Markdown {
                    path: artifact.to_path_buf(),
                });
            } else if let Some(fig) = self.figure(project, artifact, stage.title)? {
                blocks.push(Block::Figure(fig));
            }

            // Supporting documents that sit beside a nested gate artifact.
            if let Some(dir) = artifact.parent().filter(|d| *d != project.root) {
                for doc in crate::io::markdown_files(dir)? {
                    if doc != artifact {
                        blocks.push(Block::Markdown { path: doc });
                    }
                }
            }
        }

        Ok(ProjectSection {
            id: stage.id,
            title: stage.title.to_string(),
            dir: paths::ANALYSIS_DIR,
            has_index: false,
            body: SectionBody::Pages(vec![ContentPage {
                slug: stage.id.to_string(),
                title: stage.title.to_string(),
                blocks,
            }]),
        })
    }

    fn atlas_section(&self, project: &Project, status: &StageStatus) -> Result<ProjectSection> {
        let views: Vec<AtlasView> =
            atlas::discover_views(&project.root, &self.diagrams.source_extension)?
                .into_iter()
                .filter(|v| !takes_index_slot(project, paths::ATLAS_DIR, &v.name))
                .collect();
        let mut groups = Vec::new();
        for (category, members) in atlas::group_by_category(&views) {
            let pages = members
                .into_iter()
                .map(|view| self.view_page(project, view))
                .collect::<Result<Vec<_>>>()?;
            groups.push(PageGroup {
                title: category.title().to_string(),
                pages,
            });
        }
        Ok(ProjectSection {
            id: ATLAS_STAGE,
            title: status.stage.title.to_string(),
            dir: paths::ATLAS_DIR,
            has_index: true,
            body: SectionBody::Groups(groups),
        })
    }

    fn view_page(&self, project: &Project, view: &AtlasView) -> Result<ContentPage> {
        let title = view.title();
        let mut images = Vec::new();
        for source in &view.sources {
            images.push(self.cache.ensure_rendered(source)?);
        }
        images.extend(view.images.iter().cloned());
        images.sort();
        images.dedup();

        let mut blocks = Vec::new();
        for image in images {
            if let Some(fig) = self.figure(project, &image, &title)? {
                blocks.push(Block::Figure(fig));
            }
        }
        blocks.push(Block::Markdown {
            path: view.analysis.clone(),
        });
        Ok(ContentPage {
            slug: view.name.clone(),
            title,
            blocks,
        })
    }

    fn presentations_section(
        &self,
        project: &Project,
        status: &StageStatus,
    ) -> Result<ProjectSection> {
        let mut pages = Vec::new();
        for source in tour::discover_tours(&project.root)? {
            if takes_index_slot(project, paths::PRESENTATIONS_DIR, &source.name) {
                continue;
            }
            self.prerender_sources(project, &source)?;
            let composed = source.compose(&project.root)?;
            pages.push(self.tour_page(project, &source, &composed)?);
        }
        Ok(ProjectSection {
            id: PRESENTATIONS_STAGE,
            title: status.stage.title.to_string(),
            dir: paths::PRESENTATIONS_DIR,
            has_index: true,
            body: SectionBody::Pages(pages),
        })
    }

    /// Render every diagram source in each referenced atlas directory so the
    /// composer sees up-to-date images.
    fn prerender_sources(&self, project: &Project, source: &TourSource) -> Result<()> {
        for row in source.rows()? {
            let Some(dir) = row.source_dir.as_deref() else {
                continue;
            };
            let dir = project.root.join(dir);
            if !dir.starts_with(&project.root) || dir.components().any(|c| c.as_os_str() == "..") {
                continue;
            }
            for src in crate::io::sorted_entries(&dir, |p| p.is_file() && self.diagrams.is_source(p))? {
                self.cache.ensure_rendered(&src)?;
            }
        }
        Ok(())
    }

    fn tour_page(&self, project: &Project, source: &TourSource, tour: &Tour) -> Result<ContentPage> {
        let mut blocks = Vec::new();
        if let Some(opening) = &tour.opening {
            blocks.push(Block::Markdown {
                path: opening.clone(),
            });
        }
        for group in &tour.groups {
            for stop in &group.stops {
                blocks.push(Block::Heading {
                    level: match stop.depth {
                        StopDepth::Primary => 2,
                        StopDepth::Sub => 3,
                    },
                    text: stop.title.clone(),
                });
                for diagram in &stop.diagrams {
                    if let Some(fig) = self.figure(project, diagram, &stop.title)? {
                        blocks.push(Block::Figure(fig));
                    }
                }
                if let Some(analysis) = &stop.analysis {
                    blocks.push(Block::Markdown {
                        path: analysis.clone(),
                    });
                }
            }
            if let Some(transition) = &group.transition {
                blocks.push(Block::Markdown {
                    path: transition.clone(),
                });
            }
        }

        let title = source
            .opening
            .as_deref()
            .and_then(text::file_title)
            .unwrap_or_else(|| text::titleize(&source.name));
        Ok(ContentPage {
            slug: source.name.clone(),
            title,
            blocks,
        })
    }
}

/// A view or tour named `index` would overwrite its section index page.
fn takes_index_slot(project: &Project, section: &str, name: &str) -> bool {
    if name != paths::INDEX_STEM {
        return false;
    }
    tracing::warn!(
        project = %project.slug,
        section,
        name,
        "page name collides with the section index, skipping"
    );
    true
}

fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "md")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
