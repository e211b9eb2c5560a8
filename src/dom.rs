use eyre::Result;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::path::Path;

/// Stable structural marker the collaborator document view puts on the
/// root of the promise document subtree.
pub const DOCUMENT_MARKER_CLASS: &str = "documento-promesa";

/// Width handed to the text renderer. The extracted text is re-wrapped by
/// pagination anyway, so this only needs to be wide enough not to break
/// words the renderer would have kept together.
const RENDER_WIDTH: usize = 800;

/// A parsed DOM root the viewer hands to extraction and navigation.
/// Wraps the live tree so the callers never touch selectors directly.
pub struct HtmlRoot {
    html: Html,
}

impl HtmlRoot {
    pub fn parse(src: &str) -> Self {
        Self {
            html: Html::parse_document(src),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let src = std::fs::read_to_string(path)?;
        Ok(Self::parse(&src))
    }

    /// The single promise-document subtree under this root, located by its
    /// marker class. `None` when the viewer has not mounted it yet.
    fn document_subtree(&self) -> Option<ElementRef<'_>> {
        let selector = Selector::parse(&format!(".{DOCUMENT_MARKER_CLASS}")).ok()?;
        self.html.select(&selector).next()
    }

    /// Rendered visible text of the document subtree, with line breaks as
    /// the viewer shows them. `None` when the subtree is absent; callers
    /// treat that as a no-op.
    pub fn visible_text(&self) -> Option<String> {
        let subtree = self.document_subtree()?;
        let rendered = html2text::config::plain()
            .link_footnotes(false)
            .string_from_read(subtree.html().as_bytes(), RENDER_WIDTH)
            .ok()?;
        Some(normalize_rendered(&rendered))
    }

    /// `visible_text` split into lines, for row-addressed navigation.
    pub fn rendered_lines(&self) -> Option<Vec<String>> {
        Some(
            self.visible_text()?
                .lines()
                .map(str::to_string)
                .collect(),
        )
    }

    /// Look up an anchor element by id inside the document subtree.
    /// The id is CSS-escaped first; if an escaped selector still cannot be
    /// built, falls back to a plain attribute scan over the subtree.
    fn anchor_element<'a>(&'a self, id: &str) -> Option<ElementRef<'a>> {
        let subtree = self.document_subtree()?;
        if let Ok(selector) = Selector::parse(&format!("#{}", css_escape_id(id))) {
            if let Some(found) = subtree.select(&selector).next() {
                return Some(found);
            }
        }
        subtree
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().attr("id") == Some(id))
    }

    /// Row of the rendered text where the anchor's content begins.
    /// Follows the same word-prefix matching used for section rows: take
    /// the anchor's leading words (or, for empty anchors, the words of the
    /// first following element with text) and find the line containing
    /// them. `None` when the anchor or its text cannot be located.
    pub fn anchor_line(&self, id: &str) -> Option<usize> {
        let element = self.anchor_element(id)?;
        let search = anchor_search_text(element)?;
        let lines = self.rendered_lines()?;
        lines.iter().position(|line| line.contains(&search))
    }
}

/// Trim trailing spaces and collapse runs of blank lines left behind by
/// the renderer.
fn normalize_rendered(text: &str) -> String {
    let trimmed: Vec<&str> = text.lines().map(str::trim_end).collect();
    let joined = trimmed.join("\n");
    let blank_runs = Regex::new(r"\n{3,}").unwrap_or_else(|_| unreachable!());
    blank_runs
        .replace_all(&joined, "\n\n")
        .trim_end()
        .to_string()
}

/// Leading words used to locate an anchor in the rendered text. Empty
/// anchor elements borrow the text of the next sibling with content.
fn anchor_search_text(element: ElementRef<'_>) -> Option<String> {
    let own: String = element.text().collect::<Vec<_>>().join(" ");
    let text = if own.trim().is_empty() {
        let mut borrowed = None;
        for sibling in element.next_siblings() {
            if let Some(el) = ElementRef::wrap(sibling) {
                let t: String = el.text().collect::<Vec<_>>().join(" ");
                if !t.trim().is_empty() {
                    borrowed = Some(t);
                    break;
                }
            }
        }
        borrowed?
    } else {
        own
    };

    let words: Vec<&str> = text.split_whitespace().take(8).collect();
    let search = words.join(" ");
    if search.len() < 3 {
        return None;
    }
    Some(search)
}

/// Minimal CSS identifier escaping, matching what `CSS.escape` does for
/// the characters that can appear in anchor ids.
pub fn css_escape_id(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for (i, c) in id.chars().enumerate() {
        let plain = c.is_ascii_alphanumeric() || c == '-' || c == '_' || c as u32 >= 0x80;
        if i == 0 && c.is_ascii_digit() {
            out.push_str(&format!("\\{:x} ", c as u32));
        } else if plain {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <html><body>
        <div class="documento-promesa">
            <div id="inicio"></div>
            <h1>Promesa de Compraventa</h1>
            <p id="clausula-primera">PRIMERA. El promitente vendedor se obliga.</p>
            <p id="clausula-segunda">SEGUNDA. El precio pactado es fijo.</p>
            <div id="firmas"><p>Firmas de las partes</p></div>
        </div>
        </body></html>
    "#;

    #[test]
    fn test_visible_text_from_marked_subtree() {
        let root = HtmlRoot::parse(SAMPLE);
        let text = root.visible_text().unwrap();
        assert!(text.contains("Promesa de Compraventa"));
        assert!(text.contains("PRIMERA."));
        assert!(text.contains("Firmas de las partes"));
    }

    #[test]
    fn test_visible_text_missing_subtree() {
        let root = HtmlRoot::parse("<html><body><p>otro contenido</p></body></html>");
        assert_eq!(root.visible_text(), None);
        assert_eq!(root.anchor_line("inicio"), None);
    }

    #[test]
    fn test_anchor_line_with_own_text() {
        let root = HtmlRoot::parse(SAMPLE);
        let lines = root.rendered_lines().unwrap();
        let row = root.anchor_line("clausula-segunda").unwrap();
        assert!(lines[row].contains("SEGUNDA."));
    }

    #[test]
    fn test_anchor_line_empty_element_borrows_sibling_text() {
        let root = HtmlRoot::parse(SAMPLE);
        let lines = root.rendered_lines().unwrap();
        let row = root.anchor_line("inicio").unwrap();
        assert!(lines[row].contains("Promesa de Compraventa"));
    }

    #[test]
    fn test_anchor_line_unknown_id_is_none() {
        let root = HtmlRoot::parse(SAMPLE);
        assert_eq!(root.anchor_line("clausula-tercera"), None);
    }

    #[test]
    fn test_css_escape_passthrough() {
        assert_eq!(css_escape_id("clausula-primera"), "clausula-primera");
        assert_eq!(css_escape_id("firmas"), "firmas");
    }

    #[test]
    fn test_css_escape_special_characters() {
        assert_eq!(css_escape_id("a.b"), "a\\.b");
        assert_eq!(css_escape_id("a:b"), "a\\:b");
        assert_eq!(css_escape_id("1x"), "\\31 x");
    }

    #[test]
    fn test_anchor_lookup_with_special_id_does_not_panic() {
        let html = r#"<div class="documento-promesa"><p id="a.b">Texto con punto</p></div>"#;
        let root = HtmlRoot::parse(html);
        let row = root.anchor_line("a.b");
        assert!(row.is_some());
    }
}
