use std::path::Path;

/// Escape text for HTML element content and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// `value-chain` → `Value Chain`.
pub fn titleize(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first level-one ATX heading.
pub fn first_heading(markdown: &str) -> Option<String> {
    markdown
        .lines()
        .filter_map(|l| l.trim_start().strip_prefix("# "))
        .map(|h| h.trim().trim_end_matches('#').trim().to_string())
        .find(|h| !h.is_empty())
}

/// First heading of the file at `path`, if it is readable and has one.
pub fn file_title(path: &Path) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|s| first_heading(&s))
}
