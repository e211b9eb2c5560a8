use crate::clipboard::{ClipboardBackend, ClipboardService};
use crate::config::Config;
use crate::dom::HtmlRoot;
use crate::export::Exporter;
use crate::logging;
use crate::models::{SubmissionState, UploadedFile};
use crate::nav::{self, Viewport};
use crate::submit::SubmissionController;
use crate::upload::{UploadRegistry, SLOT_PROMESA_FIRMADA};
use eyre::Result;
use std::path::{Path, PathBuf};

/// The signed-promise page controller: owns the upload registry and the
/// transient viewer state, and wires every user-facing operation. The
/// destination id comes from the page's route parameter; the client name
/// flows into the heading and the export filename.
pub struct PromesaPage {
    config: Config,
    pub registry: UploadRegistry,
    submission: SubmissionController,
    exporter: Exporter,
    clipboard: ClipboardService,
    viewport: Viewport,
    document: Option<HtmlRoot>,
    viewer_open: bool,
    destination_id: Option<String>,
    client_name: Option<String>,
}

impl PromesaPage {
    pub fn new(
        config: Config,
        clipboard_backend: Box<dyn ClipboardBackend>,
        destination_id: Option<String>,
        client_name: Option<String>,
    ) -> Self {
        Self {
            config,
            registry: UploadRegistry::new(&[SLOT_PROMESA_FIRMADA]),
            submission: SubmissionController::new(),
            exporter: Exporter::new(),
            clipboard: ClipboardService::new(clipboard_backend),
            viewport: Viewport::default(),
            document: None,
            viewer_open: false,
            destination_id,
            client_name,
        }
    }

    pub fn heading(&self) -> String {
        match self.client_name.as_deref() {
            Some(name) if !name.trim().is_empty() => format!("Promesa Firmada {}", name.trim()),
            _ => "Promesa Firmada".to_string(),
        }
    }

    /// Open the viewer modal over a rendered document.
    pub fn open_viewer(&mut self, root: HtmlRoot) {
        self.document = Some(root);
        self.viewer_open = true;
        self.viewport = Viewport::default();
    }

    pub fn open_viewer_from_file(&mut self, path: &Path) -> Result<()> {
        let root = HtmlRoot::from_file(path)?;
        self.open_viewer(root);
        Ok(())
    }

    pub fn close_viewer(&mut self) {
        self.viewer_open = false;
    }

    pub fn viewer_open(&self) -> bool {
        self.viewer_open
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn viewer_root(&self) -> Option<&HtmlRoot> {
        if self.viewer_open {
            self.document.as_ref()
        } else {
            None
        }
    }

    /// Canonical text of the open document, or `None` when the viewer is
    /// closed or the subtree is missing.
    pub fn document_text(&self) -> Option<String> {
        self.viewer_root()?.visible_text()
    }

    /// Scroll the open viewer to a section anchor; silent no-op when the
    /// viewer is closed or the anchor is absent.
    pub fn go_to_section(&mut self, section_id: &str) {
        let Some(root) = (if self.viewer_open {
            self.document.as_ref()
        } else {
            None
        }) else {
            return;
        };
        nav::scroll_to(root, &mut self.viewport, section_id);
    }

    pub fn copy_text(&mut self) {
        let Some(root) = (if self.viewer_open {
            self.document.as_ref()
        } else {
            None
        }) else {
            return;
        };
        self.clipboard.copy_visible_text(root);
    }

    pub fn copy_state(&self) -> crate::models::CopyState {
        self.clipboard.state()
    }

    /// Advance transient-state timers; called from the event loop.
    pub fn tick(&mut self) {
        self.clipboard.tick();
    }

    /// Export the open document as a paginated PDF into `out_dir`.
    pub fn export_pdf(&mut self, out_dir: &Path) -> Result<Option<PathBuf>> {
        let Some(root) = (if self.viewer_open {
            self.document.as_ref()
        } else {
            None
        }) else {
            logging::warn("Viewer is not open, nothing to export");
            return Ok(None);
        };
        self.exporter
            .export(root, self.client_name.as_deref(), out_dir)
    }

    /// Read a file from disk and drop it on the promise slot, inferring
    /// the MIME type from the extension as a picker would supply it.
    pub fn attach_file(&mut self, path: &Path) -> Result<()> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "documento".to_string());
        let mime = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("pdf") => "application/pdf",
            _ => "application/octet-stream",
        };
        let file = UploadedFile {
            name,
            mime: mime.to_string(),
            bytes,
        };
        self.registry.drag_over(SLOT_PROMESA_FIRMADA);
        self.registry.drop(SLOT_PROMESA_FIRMADA, file);
        Ok(())
    }

    pub fn can_submit(&self) -> bool {
        self.submission.can_submit(&self.registry)
    }

    pub fn submit(&mut self) -> SubmissionState {
        self.submission
            .submit(
                &mut self.registry,
                self.destination_id.as_deref(),
                self.config.api_base_url(),
            )
            .clone()
    }

    pub fn submission_state(&self) -> &SubmissionState {
        self.submission.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CopyState;
    use crate::submit::{MSG_MISSING_FILE, MSG_MISSING_ID};
    use eyre::Result as EyreResult;

    struct NullClipboard;

    impl ClipboardBackend for NullClipboard {
        fn set_text(&mut self, _text: String) -> EyreResult<()> {
            Ok(())
        }
    }

    const DOC: &str = r#"
        <div class="documento-promesa">
            <div id="inicio"></div>
            <h2>Promesa de Compraventa</h2>
            <p id="clausula-primera">PRIMERA. Obligaciones de las partes.</p>
            <div id="firmas"><p>Firmas</p></div>
        </div>
    "#;

    fn page(destination_id: Option<&str>) -> PromesaPage {
        PromesaPage::new(
            Config::for_tests("http://127.0.0.1:9"),
            Box::new(NullClipboard),
            destination_id.map(str::to_string),
            Some("Cliente Prueba".to_string()),
        )
    }

    #[test]
    fn test_heading_includes_client_name() {
        assert_eq!(page(None).heading(), "Promesa Firmada Cliente Prueba");
        let anonymous = PromesaPage::new(
            Config::for_tests("http://127.0.0.1:9"),
            Box::new(NullClipboard),
            None,
            None,
        );
        assert_eq!(anonymous.heading(), "Promesa Firmada");
    }

    #[test]
    fn test_viewer_gating() {
        let mut p = page(Some("abc"));
        assert_eq!(p.document_text(), None);
        p.open_viewer(HtmlRoot::parse(DOC));
        assert!(p.viewer_open());
        assert!(p.document_text().unwrap().contains("PRIMERA."));
        p.close_viewer();
        assert_eq!(p.document_text(), None);
    }

    #[test]
    fn test_navigation_updates_viewport() {
        let mut p = page(Some("abc"));
        p.open_viewer(HtmlRoot::parse(DOC));
        p.go_to_section("clausula-primera");
        assert!(p.viewport().smooth);
        // Unknown section: silent no-op.
        let before = p.viewport();
        p.go_to_section("clausula-novena");
        assert_eq!(p.viewport(), before);
    }

    #[test]
    fn test_copy_only_with_open_viewer() {
        let mut p = page(Some("abc"));
        p.copy_text();
        assert_eq!(p.copy_state(), CopyState::Idle);
        p.open_viewer(HtmlRoot::parse(DOC));
        p.copy_text();
        assert_eq!(p.copy_state(), CopyState::Copied);
    }

    #[test]
    fn test_attach_file_rejects_non_pdf() {
        let dir = tempfile::TempDir::new().unwrap();
        let bad = dir.path().join("foto.png");
        std::fs::write(&bad, b"png bytes").unwrap();
        let mut p = page(Some("abc"));
        p.attach_file(&bad).unwrap();
        assert_eq!(p.registry.uploaded_count(), 0);
        assert_eq!(p.registry.drag_target(), None);
        assert!(!p.can_submit());
    }

    #[test]
    fn test_attach_then_submit_precondition_flow() {
        let dir = tempfile::TempDir::new().unwrap();
        let pdf = dir.path().join("promesa.pdf");
        std::fs::write(&pdf, b"%PDF-1.5").unwrap();

        let mut missing_id = page(None);
        missing_id.attach_file(&pdf).unwrap();
        assert_eq!(
            missing_id.submit(),
            SubmissionState::Failed(MSG_MISSING_ID.to_string())
        );
        // Registry preserved for retry.
        assert_eq!(missing_id.registry.uploaded_count(), 1);

        let mut missing_file = page(Some("abc"));
        assert_eq!(
            missing_file.submit(),
            SubmissionState::Failed(MSG_MISSING_FILE.to_string())
        );
    }

    #[test]
    fn test_export_requires_open_viewer() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut p = page(Some("abc"));
        assert_eq!(p.export_pdf(dir.path()).unwrap(), None);
        p.open_viewer(HtmlRoot::parse(DOC));
        let path = p.export_pdf(dir.path()).unwrap().unwrap();
        assert_eq!(path.file_name().unwrap(), "Promesa_Cliente Prueba.pdf");
    }
}
