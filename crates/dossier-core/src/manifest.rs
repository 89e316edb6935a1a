//! Tour manifest parsing.
//!
//! A manifest is a markdown pipe table. Its column count and the position of
//! the atlas-source column vary between authors, so each body row is matched
//! against the known layouts by `(cell count, source column)`. Rows that fit
//! no layout still parse, as [`RowKind::Unrecognized`], so one odd row never
//! loses the whole tour.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Every content row points into the project's atlas.
pub const SOURCE_PREFIX: &str = "atlas/";

const IMAGE_SUFFIXES: &[&str] = &[".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// `| order | title | source | maps |`
    TitleSourceMap,
    /// `| order | title | maps | source |`
    TitleMapSource,
    /// `| order | title | purpose | source | maps |`
    TitlePurposeSourceMap,
}

impl Layout {
    fn detect(cells: usize, source_col: usize) -> Option<Layout> {
        match (cells, source_col) {
            (4, 2) => Some(Layout::TitleSourceMap),
            (4, 3) => Some(Layout::TitleMapSource),
            (5, 3) => Some(Layout::TitlePurposeSourceMap),
            _ => None,
        }
    }

    fn map_column(self) -> usize {
        match self {
            Layout::TitleSourceMap => 3,
            Layout::TitleMapSource => 2,
            Layout::TitlePurposeSourceMap => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "layout", rename_all = "snake_case")]
pub enum RowKind {
    /// No source column: a group heading with no content block.
    Heading,
    Content(Layout),
    /// Has a source column but matches no known layout.
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestRow {
    pub order: String,
    pub title: String,
    pub source_dir: Option<String>,
    pub map_files: Vec<String>,
    pub kind: RowKind,
}

impl ManifestRow {
    pub fn is_heading(&self) -> bool {
        self.source_dir.is_none()
    }
}

/// `order` split into its numeric base and optional letter suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    pub base: String,
    pub suffix: Option<String>,
}

impl OrderKey {
    pub fn parse(order: &str) -> Self {
        let trimmed = order.trim();
        let base = trimmed.trim_end_matches(|c: char| c.is_ascii_alphabetic());
        let suffix = &trimmed[base.len()..];
        Self {
            base: base.to_string(),
            suffix: (!suffix.is_empty()).then(|| suffix.to_string()),
        }
    }

    pub fn has_suffix(&self) -> bool {
        self.suffix.is_some()
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

static ORDER_RE: OnceLock<Regex> = OnceLock::new();

fn order_re() -> &'static Regex {
    ORDER_RE.get_or_init(|| Regex::new(r"^[0-9]+[A-Za-z]*$").unwrap())
}

pub fn parse(text: &str) -> Vec<ManifestRow> {
    let mut rows = Vec::new();
    let mut seen_header = false;

    for line in text.lines().map(str::trim) {
        if !line.starts_with('|') {
            continue;
        }
        let cells = split_cells(line);
        if is_separator(&cells) {
            continue;
        }
        if !seen_header {
            seen_header = true;
            continue;
        }
        match parse_row(&cells) {
            Some(row) => rows.push(row),
            None => tracing::warn!(row = line, "manifest row has no valid order; skipping"),
        }
    }
    rows
}

fn split_cells(line: &str) -> Vec<String> {
    let inner = line.strip_prefix('|').unwrap_or(line);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|c| c.trim().to_string()).collect()
}

fn is_separator(cells: &[String]) -> bool {
    cells.iter().any(|c| c.contains('-'))
        && cells
            .iter()
            .all(|c| c.chars().all(|ch| matches!(ch, '-' | ':' | ' ')))
}

fn parse_row(cells: &[String]) -> Option<ManifestRow> {
    let order = cells.first()?.clone();
    if !order_re().is_match(&order) {
        return None;
    }
    let title = cells.get(1).cloned().unwrap_or_default();

    let Some(source_col) = cells
        .iter()
        .skip(1)
        .position(|c| c.starts_with(SOURCE_PREFIX))
        .map(|i| i + 1)
    else {
        return Some(ManifestRow {
            order,
            title,
            source_dir: None,
            map_files: Vec::new(),
            kind: RowKind::Heading,
        });
    };

    let source_dir = Some(cells[source_col].trim_end_matches('/').to_string());
    let row = match Layout::detect(cells.len(), source_col) {
        Some(layout) => ManifestRow {
            order,
            title,
            source_dir,
            map_files: map_files(&cells[layout.map_column()]),
            kind: RowKind::Content(layout),
        },
        None => {
            tracing::debug!(order = %order, cells = cells.len(), source_col, "unrecognized manifest layout");
            ManifestRow {
                order,
                title,
                source_dir,
                map_files: Vec::new(),
                kind: RowKind::Unrecognized,
            }
        }
    };
    Some(row)
}

fn has_image_suffix(s: &str) -> bool {
    let lower = s.to_ascii_lowercase();
    IMAGE_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

/// Comma-separated image filenames; prose without an image suffix is dropped.
fn map_files(cell: &str) -> Vec<String> {
    let lower = cell.to_ascii_lowercase();
    if !IMAGE_SUFFIXES.iter().any(|s| lower.contains(s)) {
        return Vec::new();
    }
    cell.split(',')
        .map(|f| f.trim().trim_matches('`'))
        .filter(|f| has_image_suffix(f))
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_title_source_map() {
        let text = "\
# Investor tour

| # | Stop | Source | Map |
|---|------|--------|-----|
| 1 | Landscape | atlas/layers | layers.svg |
";
        let rows = parse(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Landscape");
        assert_eq!(rows[0].source_dir.as_deref(), Some("atlas/layers"));
        assert_eq!(rows[0].map_files, vec!["layers.svg"]);
        assert_eq!(rows[0].kind, RowKind::Content(Layout::TitleSourceMap));
    }

    #[test]
    fn layout_title_map_source() {
        let text = "\
| Order | Title | Maps | Atlas |
| --- | --- | --- | --- |
| 2 | Bottlenecks | map.svg, detail.png | atlas/bottlenecks/ |
";
        let rows = parse(text);
        assert_eq!(rows[0].title, "Bottlenecks");
        assert_eq!(rows[0].source_dir.as_deref(), Some("atlas/bottlenecks"));
        assert_eq!(rows[0].map_files, vec!["map.svg", "detail.png"]);
        assert_eq!(rows[0].kind, RowKind::Content(Layout::TitleMapSource));
    }

    #[test]
    fn layout_title_purpose_source_map() {
        let text = "\
| Order | Title | Purpose | Source | Map |
|:-----:|-------|---------|--------|-----|
| 3a | Plays | Why we move now | atlas/play-open | `play.svg` |
";
        let rows = parse(text);
        assert_eq!(rows[0].order, "3a");
        assert_eq!(rows[0].title, "Plays");
        assert_eq!(rows[0].map_files, vec!["play.svg"]);
        assert_eq!(
            rows[0].kind,
            RowKind::Content(Layout::TitlePurposeSourceMap)
        );
    }

    #[test]
    fn unknown_layout_degrades_without_maps() {
        let text = "\
| Order | Title | A | B | Source | Map |
|---|---|---|---|---|---|
| 4 | Odd row | x | y | atlas/movement | movement.svg |
";
        let rows = parse(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Odd row");
        assert_eq!(rows[0].kind, RowKind::Unrecognized);
        assert!(rows[0].map_files.is_empty());
        assert_eq!(rows[0].source_dir.as_deref(), Some("atlas/movement"));
    }

    #[test]
    fn rows_without_source_are_headings() {
        let text = "\
| # | Title | Source | Map |
|---|---|---|---|
| 1 | Where we are |  |  |
| 1a | Landscape | atlas/layers | |
";
        let rows = parse(text);
        assert_eq!(rows[0].kind, RowKind::Heading);
        assert!(rows[0].is_heading());
        assert_eq!(rows[0].title, "Where we are");
        assert!(!rows[1].is_heading());
        assert!(rows[1].map_files.is_empty());
    }

    #[test]
    fn prose_in_map_column_is_ignored() {
        let text = "\
| # | Title | Source | Notes |
|---|---|---|---|
| 1 | Landscape | atlas/layers | see the svg later, maybe |
";
        let rows = parse(text);
        assert!(rows[0].map_files.is_empty());
    }

    #[test]
    fn non_table_lines_and_bad_orders_skipped() {
        let text = "\
Intro prose.

| # | Title | Source | Map |
|---|---|---|---|
| one | Not an order | atlas/a | a.svg |
| 2 | Kept | atlas/b | b.svg |

Trailing prose | with a pipe.
";
        let rows = parse(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].order, "2");
    }

    #[test]
    fn order_key_split() {
        assert_eq!(
            OrderKey::parse("12"),
            OrderKey {
                base: "12".into(),
                suffix: None
            }
        );
        let k = OrderKey::parse("3ab");
        assert_eq!(k.base, "3");
        assert_eq!(k.suffix.as_deref(), Some("ab"));
        assert!(k.has_suffix());
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(parse("").is_empty());
        assert!(parse("| only | a | header |").is_empty());
    }
}
