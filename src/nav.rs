use crate::dom::HtmlRoot;
use crate::logging;

/// Anchor id of the document's opening.
pub const SECTION_INICIO: &str = "inicio";
/// Anchor id of the signature block at the end.
pub const SECTION_FIRMAS: &str = "firmas";

/// Spanish ordinal names used in clause anchor ids, in clause order.
pub const ORDINAL_NAMES: [&str; 12] = [
    "primera",
    "segunda",
    "tercera",
    "cuarta",
    "quinta",
    "sexta",
    "septima",
    "octava",
    "novena",
    "decima",
    "decima-primera",
    "decima-segunda",
];

/// Anchor id for clause `number` (1-based), e.g. 3 -> `clausula-tercera`.
pub fn clause_anchor(number: usize) -> Option<String> {
    if number == 0 || number > ORDINAL_NAMES.len() {
        return None;
    }
    Some(format!("clausula-{}", ORDINAL_NAMES[number - 1]))
}

/// The viewer's scroll position over the rendered document, addressed in
/// rendered-text rows. Scrolling aligns the target row with the top.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub top_line: usize,
    pub smooth: bool,
}

impl Viewport {
    fn scroll_into_view(&mut self, line: usize) {
        self.top_line = line;
        self.smooth = true;
    }
}

/// Scroll the viewport to a section anchor under `root`. A missing anchor
/// is a silent no-op: the viewport is left untouched and nothing is shown
/// to the user.
pub fn scroll_to(root: &HtmlRoot, viewport: &mut Viewport, section_id: &str) {
    match root.anchor_line(section_id) {
        Some(line) => viewport.scroll_into_view(line),
        None => logging::debug(format!("No anchor '{}' under root", section_id)),
    }
}
