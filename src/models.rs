/// Page geometry for the exported PDF. Immutable for the process lifetime;
/// all distances are millimeters except `font_size`, which is points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub line_height: f32,
    pub font_size: f32,
}

impl Default for PageGeometry {
    /// A4 portrait with 20 mm margins, 6 mm line pitch, 10 pt text.
    fn default() -> Self {
        Self {
            page_width: 210.0,
            page_height: 297.0,
            margin: 20.0,
            line_height: 6.0,
            font_size: 10.0,
        }
    }
}

impl PageGeometry {
    /// Horizontal budget available to a single line of text.
    pub fn max_line_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    /// Number of lines that fit on one page. Line `i` sits at
    /// `margin + i * line_height` from the top and must stay above
    /// `page_height - margin`.
    pub fn lines_per_page(&self) -> usize {
        let usable = self.page_height - 2.0 * self.margin;
        if usable < 0.0 || self.line_height <= 0.0 {
            return 1;
        }
        (usable / self.line_height) as usize + 1
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub lines: Vec<String>,
}

/// The finished artifact of pagination: an ordered sequence of pages,
/// never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginatedDocument {
    pub pages: Vec<Page>,
}

impl PaginatedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn line_count(&self) -> usize {
        self.pages.iter().map(|p| p.lines.len()).sum()
    }
}

/// One file held against a named requirement of the submission.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// A named requirement for exactly one uploaded file. `file` and `preview`
/// are always consistent: both `None` (Empty) or both `Some` (Populated).
#[derive(Debug, Clone, PartialEq)]
pub struct UploadSlot {
    pub key: String,
    pub file: Option<UploadedFile>,
    pub preview: Option<String>,
}

impl UploadSlot {
    pub fn empty(key: &str) -> Self {
        Self {
            key: key.to_string(),
            file: None,
            preview: None,
        }
    }

    pub fn is_populated(&self) -> bool {
        self.file.is_some()
    }
}

/// Lifecycle of one network submission. `Idle` is both the initial state
/// and the state a new attempt starts from; `Succeeded`/`Failed` stay
/// visible until the next attempt.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed(String),
}

impl SubmissionState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, SubmissionState::Submitting)
    }
}

/// Re-entrancy guard for PDF export; a second export while one is in
/// flight is refused by checking this flag, not by locking.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ExportState {
    #[default]
    Idle,
    Exporting,
}

/// Transient confirmation shown after a clipboard write. Reverts to Idle
/// on its own after a fixed delay.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CopyState {
    #[default]
    Idle,
    Copied,
}
