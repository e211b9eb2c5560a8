use crate::dom::HtmlRoot;
use crate::logging;
use crate::models::{ExportState, PageGeometry, PaginatedDocument};
use crate::paginate::{paginate, HelveticaMetrics};
use chrono::Local;
use eyre::Result;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const MM_TO_PT: f32 = 72.0 / 25.4;

static FONT_METRICS: OnceLock<HelveticaMetrics> = OnceLock::new();

/// Process-wide, idempotent initialization of the rendering backend,
/// performed once before the first export.
fn rendering_metrics() -> &'static HelveticaMetrics {
    FONT_METRICS.get_or_init(HelveticaMetrics::default)
}

/// Name of the exported artifact: `Promesa_<client>.pdf`, falling back to
/// `Documento` when no client name is known.
pub fn export_file_name(client_name: Option<&str>) -> String {
    let name = match client_name {
        Some(n) if !n.trim().is_empty() => n.trim(),
        _ => "Documento",
    };
    format!("Promesa_{name}.pdf")
}

/// Drives one PDF export at a time. The `Exporting` flag is the only
/// concurrency guard: a second call while one runs is refused, not queued.
#[derive(Debug, Default)]
pub struct Exporter {
    state: ExportState,
    geometry: PageGeometry,
}

impl Exporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ExportState {
        self.state
    }

    /// Extract, paginate, and save the document as a PDF under `out_dir`.
    /// Returns the written path, or `None` when nothing was exported
    /// (export already in flight, or the document subtree is absent).
    /// Any failure resets the state to Idle and leaves no partial file.
    pub fn export(
        &mut self,
        root: &HtmlRoot,
        client_name: Option<&str>,
        out_dir: &Path,
    ) -> Result<Option<PathBuf>> {
        if self.state == ExportState::Exporting {
            logging::debug("Export already in progress, ignoring request");
            return Ok(None);
        }
        self.state = ExportState::Exporting;
        let outcome = self.run_pipeline(root, client_name, out_dir);
        self.state = ExportState::Idle;
        match outcome {
            Ok(path) => Ok(path),
            Err(err) => {
                logging::error(format!("Error al exportar PDF: {err}"));
                Err(err)
            }
        }
    }

    fn run_pipeline(
        &self,
        root: &HtmlRoot,
        client_name: Option<&str>,
        out_dir: &Path,
    ) -> Result<Option<PathBuf>> {
        let Some(text) = root.visible_text() else {
            logging::warn("Document subtree not found, nothing to export");
            return Ok(None);
        };
        let paginated = paginate(&text, &self.geometry, rendering_metrics());
        let mut pdf = build_pdf(&paginated, &self.geometry)?;
        let path = out_dir.join(export_file_name(client_name));
        pdf.save(&path)?;
        logging::info(format!(
            "Exported {} page(s) to {}",
            paginated.page_count(),
            path.display()
        ));
        Ok(Some(path))
    }
}

/// Assemble the lopdf document: one content stream per page, Helvetica
/// Type1 with WinAnsi encoding, MediaBox from the geometry.
fn build_pdf(paginated: &PaginatedDocument, geometry: &PageGeometry) -> Result<Document> {
    let mut pdf = Document::with_version("1.5");

    let pages_id = pdf.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![],
        "Count" => 0,
    });
    let font_id = pdf.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = pdf.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let width_pt = geometry.page_width * MM_TO_PT;
    let height_pt = geometry.page_height * MM_TO_PT;

    let mut kids: Vec<Object> = Vec::with_capacity(paginated.pages.len());
    for page in &paginated.pages {
        let mut operations: Vec<Operation> = Vec::new();
        for (row, line) in page.lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let y_mm = geometry.page_height - geometry.margin - row as f32 * geometry.line_height;
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec!["F1".into(), geometry.font_size.into()],
            ));
            operations.push(Operation::new(
                "Td",
                vec![(geometry.margin * MM_TO_PT).into(), (y_mm * MM_TO_PT).into()],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(win_ansi_bytes(line), StringFormat::Literal)],
            ));
            operations.push(Operation::new("ET", vec![]));
        }

        let content = Content { operations };
        let stream_id = pdf.add_object(Stream::new(Dictionary::new(), content.encode()?));
        let page_id = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), width_pt.into(), height_pt.into()],
            "Contents" => stream_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len() as i64;
    let pages_dict = pdf
        .get_object_mut(pages_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| eyre::eyre!("Pages object is not a dictionary: {e}"))?;
    pages_dict.set("Kids", kids);
    pages_dict.set("Count", page_count);

    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = pdf.add_object(dictionary! {
        "Producer" => Object::string_literal("promesa"),
        "CreationDate" => Object::string_literal(Local::now().format("D:%Y%m%d%H%M%S").to_string()),
    });
    pdf.trailer.set("Root", catalog_id);
    pdf.trailer.set("Info", info_id);

    Ok(pdf)
}

/// Encode a rendered line for the WinAnsi (cp1252) font encoding.
/// Characters without a mapping degrade to '?'.
fn win_ansi_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{0}'..='\u{7f}' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u8,
            '\u{20ac}' => 0x80,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201c}' => 0x93,
            '\u{201d}' => 0x94,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Page;
    use tempfile::TempDir;

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name(Some("Maria Lopez")), "Promesa_Maria Lopez.pdf");
        assert_eq!(export_file_name(Some("  ")), "Promesa_Documento.pdf");
        assert_eq!(export_file_name(None), "Promesa_Documento.pdf");
    }

    #[test]
    fn test_win_ansi_spanish_characters() {
        let bytes = win_ansi_bytes("señaló");
        assert_eq!(bytes, vec![b's', b'e', 0xF1, b'a', b'l', 0xF3]);
        assert_eq!(win_ansi_bytes("漢"), vec![b'?']);
    }

    #[test]
    fn test_build_pdf_has_one_page_object_per_page() {
        let paginated = PaginatedDocument {
            pages: vec![
                Page {
                    lines: vec!["primera línea".to_string()],
                },
                Page {
                    lines: vec!["segunda página".to_string()],
                },
            ],
        };
        let pdf = build_pdf(&paginated, &PageGeometry::default()).unwrap();
        let page_objects = pdf
            .objects
            .values()
            .filter(|obj| {
                obj.as_dict()
                    .and_then(|d| d.get(b"Type"))
                    .and_then(Object::as_name)
                    .map(|n| n == b"Page".as_slice())
                    .unwrap_or(false)
            })
            .count();
        assert_eq!(page_objects, 2);
    }

    #[test]
    fn test_export_writes_named_pdf() {
        let html = r#"<div class="documento-promesa"><p>Contrato de promesa.</p></div>"#;
        let root = HtmlRoot::parse(html);
        let dir = TempDir::new().unwrap();
        let mut exporter = Exporter::new();
        let path = exporter
            .export(&root, Some("Prueba"), dir.path())
            .unwrap()
            .unwrap();
        assert_eq!(path.file_name().unwrap(), "Promesa_Prueba.pdf");
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert_eq!(exporter.state(), ExportState::Idle);
    }

    #[test]
    fn test_export_without_subtree_is_noop() {
        let root = HtmlRoot::parse("<p>nada</p>");
        let dir = TempDir::new().unwrap();
        let mut exporter = Exporter::new();
        let outcome = exporter.export(&root, None, dir.path()).unwrap();
        assert_eq!(outcome, None);
        assert_eq!(exporter.state(), ExportState::Idle);
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
