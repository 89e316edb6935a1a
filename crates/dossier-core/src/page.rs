//! Page shells: navigation, breadcrumb, title and stylesheet around a body
//! fragment that has already been converted to HTML.

use crate::contribution::{Block, Figure};
use crate::error::Result;
use crate::nav::{Crumb, NavLink};
use crate::paths;
use crate::text::escape_html;
use crate::tool_runner::MarkdownConverter;
use regex::{Captures, Regex};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const STYLESHEET: &str = include_str!("../assets/style.css");

pub fn default_template() -> &'static str {
    r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{TITLE}}</title>
<link rel="stylesheet" href="{{STYLESHEET}}">
</head>
<body>
<header class="site-header">
<a class="site-title" href="{{HOME}}">{{SITE_TITLE}}</a>
<nav class="primary">
{{NAV}}</nav>
</header>
{{SUBNAV}}{{BREADCRUMB}}{{LOCALNAV}}<main>
<h1>{{HEADING}}</h1>
{{BODY}}</main>
</body>
</html>
"#
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub title: String,
    /// Directory depth of the page below the site root.
    pub depth: usize,
    pub nav: Vec<NavLink>,
    pub subnav: Vec<NavLink>,
    /// Sibling pages within a section (tours, atlas views, resources).
    pub localnav: Vec<NavLink>,
    /// Rendered only for nested pages.
    pub breadcrumb: Vec<Crumb>,
    pub body: String,
}

fn nav_list(links: &[NavLink]) -> String {
    let mut out = String::from("<ul>\n");
    for link in links {
        let class = if link.active { " class=\"active\"" } else { "" };
        out.push_str(&format!(
            "<li{class}><a href=\"{}\">{}</a></li>\n",
            escape_html(&link.href),
            escape_html(&link.title)
        ));
    }
    out.push_str("</ul>\n");
    out
}

fn breadcrumb(crumbs: &[Crumb]) -> String {
    let parts: Vec<String> = crumbs
        .iter()
        .map(|c| match &c.href {
            Some(href) => format!(
                "<a href=\"{}\">{}</a>",
                escape_html(href),
                escape_html(&c.title)
            ),
            None => format!("<span>{}</span>", escape_html(&c.title)),
        })
        .collect();
    format!(
        "<nav class=\"breadcrumb\">{}</nav>\n",
        parts.join(" <span class=\"sep\">&rsaquo;</span> ")
    )
}

/// Fill the shell template for `page`.
pub fn render(page: &Page, site_title: &str) -> String {
    let prefix = paths::depth_prefix(page.depth);
    let title = if site_title.is_empty() || page.title == site_title {
        page.title.clone()
    } else {
        format!("{} · {}", page.title, site_title)
    };
    let subnav = if page.subnav.is_empty() {
        String::new()
    } else {
        format!("<nav class=\"secondary\">\n{}</nav>\n", nav_list(&page.subnav))
    };
    let localnav = if page.localnav.is_empty() {
        String::new()
    } else {
        format!("<nav class=\"local\">\n{}</nav>\n", nav_list(&page.localnav))
    };
    let crumbs = if page.depth > 0 && !page.breadcrumb.is_empty() {
        breadcrumb(&page.breadcrumb)
    } else {
        String::new()
    };

    let stylesheet = format!("{prefix}{}", paths::STYLE_CSS);
    let home = format!("{prefix}{}", paths::INDEX_HTML);
    let nav = nav_list(&page.nav);

    // One pass, so placeholders inside substituted text stay literal.
    placeholder_re()
        .replace_all(default_template(), |caps: &Captures| match &caps[1] {
            "TITLE" => escape_html(&title),
            "STYLESHEET" => stylesheet.clone(),
            "HOME" => home.clone(),
            "SITE_TITLE" => escape_html(site_title),
            "NAV" => nav.clone(),
            "SUBNAV" => subnav.clone(),
            "BREADCRUMB" => crumbs.clone(),
            "LOCALNAV" => localnav.clone(),
            "HEADING" => escape_html(&page.title),
            "BODY" => page.body.clone(),
            _ => caps[0].to_string(),
        })
        .into_owned()
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([A-Z_]+)\}\}").unwrap())
}

// ---------------------------------------------------------------------------
// PageAssembler
// ---------------------------------------------------------------------------

/// Writes finished pages under the site root.
pub struct PageAssembler {
    site_root: PathBuf,
    site_title: String,
    written: Cell<usize>,
}

impl PageAssembler {
    pub fn new(site_root: impl Into<PathBuf>, site_title: impl Into<String>) -> Self {
        Self {
            site_root: site_root.into(),
            site_title: site_title.into(),
            written: Cell::new(0),
        }
    }

    /// Wrap and write `page` at `rel` (relative to the site root). A write
    /// failure is fatal for the compile.
    pub fn write(&self, rel: &str, page: &Page) -> Result<()> {
        let path = self.site_root.join(rel);
        crate::io::atomic_write(&path, render(page, &self.site_title).as_bytes())?;
        self.written.set(self.written.get() + 1);
        tracing::debug!(page = rel, "wrote page");
        Ok(())
    }

    pub fn write_stylesheet(&self) -> Result<()> {
        crate::io::atomic_write(&self.site_root.join(paths::STYLE_CSS), STYLESHEET.as_bytes())
    }

    pub fn pages_written(&self) -> usize {
        self.written.get()
    }
}

// ---------------------------------------------------------------------------
// Body rendering
// ---------------------------------------------------------------------------

/// Turns contribution blocks into an HTML body fragment.
pub struct BodyRenderer<'a> {
    pub converter: &'a dyn MarkdownConverter,
}

impl BodyRenderer<'_> {
    pub fn markdown_file(&self, path: &Path) -> Result<String> {
        let text = std::fs::read_to_string(path)?;
        self.converter.to_html(&text)
    }

    /// `figures_href` is the href prefix under which figures were published
    /// for the page being rendered (e.g. `../figures/`).
    pub fn blocks(&self, blocks: &[Block], figures_href: &str) -> Result<String> {
        let mut out = String::new();
        for block in blocks {
            match block {
                Block::Heading { level, text } => {
                    let level = (*level).clamp(2, 6);
                    out.push_str(&format!("<h{level}>{}</h{level}>\n", escape_html(text)));
                }
                Block::Markdown { path } => {
                    out.push_str("<section class=\"doc\">\n");
                    out.push_str(&self.markdown_file(path)?);
                    out.push_str("</section>\n");
                }
                Block::Figure(fig) => out.push_str(&figure(fig, figures_href)),
                Block::Links { items } => {
                    out.push_str("<ul class=\"links\">\n");
                    for item in items {
                        out.push_str(&format!(
                            "<li><a href=\"{}\">{}</a>",
                            escape_html(&item.href),
                            escape_html(&item.title)
                        ));
                        if let Some(note) = &item.note {
                            out.push_str(&format!(" <span class=\"note\">{}</span>", escape_html(note)));
                        }
                        out.push_str("</li>\n");
                    }
                    out.push_str("</ul>\n");
                }
            }
        }
        Ok(out)
    }
}

pub fn figure(fig: &Figure, figures_href: &str) -> String {
    let src = format!("{figures_href}{}", paths::href(&fig.project_relative));
    format!(
        "<figure><img src=\"{}\" alt=\"{}\"><figcaption>{}</figcaption></figure>\n",
        escape_html(&src),
        escape_html(&fig.caption),
        escape_html(&fig.caption)
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::contribution::Link;
    use tempfile::TempDir;

    /// Wraps markdown in a marker element instead of converting it.
    pub(crate) struct EchoConverter;

    impl MarkdownConverter for EchoConverter {
        fn to_html(&self, markdown: &str) -> Result<String> {
            Ok(format!("<div class=\"md\">{}</div>\n", escape_html(markdown.trim())))
        }
    }

    fn link(id: &str, active: bool) -> NavLink {
        NavLink {
            id: id.to_string(),
            title: id.to_uppercase(),
            href: format!("{id}.html"),
            active,
        }
    }

    #[test]
    fn root_page_has_no_breadcrumb() {
        let page = Page {
            title: "Home".into(),
            depth: 0,
            nav: vec![link("home", true), link("resources", false)],
            breadcrumb: vec![Crumb::here("Home")],
            body: "<p>hi</p>\n".into(),
            ..Default::default()
        };
        let html = render(&page, "Acme");
        assert!(html.contains("<title>Home · Acme</title>"));
        assert!(html.contains("href=\"style.css\""));
        assert!(html.contains("<li class=\"active\"><a href=\"home.html\">HOME</a></li>"));
        assert!(html.contains("<li><a href=\"resources.html\">RESOURCES</a></li>"));
        assert!(!html.contains("breadcrumb"));
        assert!(html.contains("<p>hi</p>"));
    }

    #[test]
    fn nested_page_links_up() {
        let page = Page {
            title: "Brief".into(),
            depth: 2,
            breadcrumb: vec![
                Crumb::link("Home", "../../index.html"),
                Crumb::link("Acme", "../index.html"),
                Crumb::here("Brief"),
            ],
            subnav: vec![link("x", false)],
            localnav: vec![link("y", true)],
            ..Default::default()
        };
        let html = render(&page, "Acme");
        assert!(html.contains("href=\"../../style.css\""));
        assert!(html.contains("class=\"breadcrumb\""));
        assert!(html.contains("<a href=\"../index.html\">Acme</a>"));
        assert!(html.contains("<span>Brief</span>"));
        assert!(html.contains("class=\"secondary\""));
        assert!(html.contains("<nav class=\"local\">"));
        assert!(html.find("breadcrumb").unwrap() < html.find("class=\"local\"").unwrap());
    }

    #[test]
    fn titles_are_escaped() {
        let page = Page {
            title: "R&D <plan>".into(),
            ..Default::default()
        };
        let html = render(&page, "");
        assert!(html.contains("<title>R&amp;D &lt;plan&gt;</title>"));
    }

    #[test]
    fn placeholders_in_content_are_not_expanded() {
        let page = Page {
            title: "Using {{BODY}} templates".into(),
            nav: vec![NavLink {
                id: "p".into(),
                title: "{{NAV}} guide".into(),
                href: "p.html".into(),
                active: false,
            }],
            body: "<p>once</p>\n".into(),
            ..Default::default()
        };
        let html = render(&page, "Acme");
        assert_eq!(html.matches("<p>once</p>").count(), 1);
        assert!(html.contains("<h1>Using {{BODY}} templates</h1>"));
        assert!(html.contains(">{{NAV}} guide</a>"));
        assert_eq!(html.matches("<nav class=\"primary\">").count(), 1);
    }

    #[test]
    fn assembler_writes_and_counts() {
        let dir = TempDir::new().unwrap();
        let asm = PageAssembler::new(dir.path().join("site"), "Acme");
        asm.write_stylesheet().unwrap();
        asm.write("wm-acme/analysis/brief.html", &Page::default()).unwrap();
        assert!(dir.path().join("site/style.css").is_file());
        assert!(dir.path().join("site/wm-acme/analysis/brief.html").is_file());
        assert_eq!(asm.pages_written(), 1);
    }

    #[test]
    fn blocks_render_in_order() {
        let dir = TempDir::new().unwrap();
        let md = dir.path().join("a.md");
        std::fs::write(&md, "Body text").unwrap();
        let blocks = vec![
            Block::Heading {
                level: 3,
                text: "Sub".into(),
            },
            Block::Figure(Figure {
                path: dir.path().join("atlas/x/map.svg"),
                project_relative: PathBuf::from("atlas/x/map.svg"),
                caption: "Map".into(),
            }),
            Block::Markdown { path: md },
            Block::Links {
                items: vec![Link {
                    title: "Brief".into(),
                    href: "analysis/brief.html".into(),
                    note: Some("agreed".into()),
                }],
            },
        ];
        let html = BodyRenderer {
            converter: &EchoConverter,
        }
        .blocks(&blocks, "../figures/")
        .unwrap();
        let h3 = html.find("<h3>Sub</h3>").unwrap();
        let img = html.find("src=\"../figures/atlas/x/map.svg\"").unwrap();
        let body = html.find("Body text").unwrap();
        let links = html.find("analysis/brief.html").unwrap();
        assert!(h3 < img && img < body && body < links);
        assert!(html.contains("<span class=\"note\">agreed</span>"));
    }
}
