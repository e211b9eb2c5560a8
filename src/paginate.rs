use crate::models::{Page, PageGeometry, PaginatedDocument};

const PT_TO_MM: f32 = 0.352_778;

/// Text measurement supplied by the rendering backend. Widths are
/// millimeters at the given font size in points.
pub trait TextMeasure {
    fn text_width(&self, text: &str, font_size_pt: f32) -> f32;
}

/// Measurement backed by the standard Helvetica advance widths (AFM
/// values, thousandths of an em). Characters outside the table fall back
/// to the lowercase average.
#[derive(Debug, Default)]
pub struct HelveticaMetrics;

impl HelveticaMetrics {
    fn advance(c: char) -> u32 {
        match c {
            ' ' | ',' | '.' | '/' | ':' | ';' => 278,
            '!' => 278,
            '"' => 355,
            '\'' => 191,
            '(' | ')' | '[' | ']' => 333,
            '-' => 333,
            '*' => 389,
            '+' | '<' | '=' | '>' | '~' => 584,
            '?' => 556,
            '@' => 1015,
            '%' => 889,
            '&' => 667,
            '#' | '$' | '_' | '0'..='9' => 556,
            'i' | 'j' | 'l' => 222,
            'f' | 't' => 278,
            'r' => 333,
            'c' | 'k' | 's' | 'v' | 'x' | 'y' | 'z' => 500,
            'm' => 833,
            'w' => 722,
            'a' | 'b' | 'd' | 'e' | 'g' | 'h' | 'n' | 'o' | 'p' | 'q' | 'u' => 556,
            'I' => 278,
            'J' => 500,
            'L' => 556,
            'F' | 'T' | 'Z' => 611,
            'A' | 'B' | 'E' | 'K' | 'P' | 'S' | 'V' | 'X' | 'Y' => 667,
            'C' | 'D' | 'H' | 'N' | 'R' | 'U' => 722,
            'G' | 'O' | 'Q' => 778,
            'M' => 833,
            'W' => 944,
            'á' | 'é' | 'í' | 'ó' | 'ú' | 'ü' | 'ñ' => 556,
            'Á' | 'É' | 'Í' | 'Ó' | 'Ú' | 'Ü' | 'Ñ' => 700,
            '¿' | '¡' => 556,
            _ => 556,
        }
    }
}

impl TextMeasure for HelveticaMetrics {
    fn text_width(&self, text: &str, font_size_pt: f32) -> f32 {
        let thousandths: u32 = text.chars().map(Self::advance).sum();
        thousandths as f32 / 1000.0 * font_size_pt * PT_TO_MM
    }
}

/// Reflow `text` into pages of `geometry`-sized lines.
///
/// Greedy word wrap: a line accumulates whole words until the next word
/// would push its rendered width past the budget. Rendered line breaks in
/// the input are kept as paragraph boundaries. A word wider than the whole
/// budget is placed alone on its line, unsplit. Empty input still yields
/// one page holding one empty line.
pub fn paginate(
    text: &str,
    geometry: &PageGeometry,
    metrics: &dyn TextMeasure,
) -> PaginatedDocument {
    let max_width = geometry.max_line_width();
    let mut lines: Vec<String> = Vec::new();

    for paragraph in text.lines() {
        wrap_paragraph(paragraph, max_width, geometry.font_size, metrics, &mut lines);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }

    assemble_pages(lines, geometry.lines_per_page())
}

fn wrap_paragraph(
    paragraph: &str,
    max_width: f32,
    font_size: f32,
    metrics: &dyn TextMeasure,
    out: &mut Vec<String>,
) {
    let words: Vec<&str> = paragraph.split_whitespace().collect();
    if words.is_empty() {
        out.push(String::new());
        return;
    }

    let mut current = String::new();
    for word in words {
        if current.is_empty() {
            current = word.to_string();
            continue;
        }
        let candidate = format!("{current} {word}");
        if metrics.text_width(&candidate, font_size) <= max_width {
            current = candidate;
        } else {
            out.push(current);
            current = word.to_string();
        }
    }
    out.push(current);
}

fn assemble_pages(lines: Vec<String>, lines_per_page: usize) -> PaginatedDocument {
    let capacity = lines_per_page.max(1);
    let mut pages: Vec<Page> = vec![Page::default()];
    for line in lines {
        if pages
            .last()
            .map(|p| p.lines.len() >= capacity)
            .unwrap_or(false)
        {
            pages.push(Page::default());
        }
        if let Some(page) = pages.last_mut() {
            page.lines.push(line);
        }
    }
    PaginatedDocument { pages }
}
