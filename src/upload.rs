use crate::logging;
use crate::models::{UploadSlot, UploadedFile};
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;

/// Slot key of the signed promise document.
pub const SLOT_PROMESA_FIRMADA: &str = "promesa_firmada";

/// Allow-list of accepted upload MIME types for this workflow.
pub const ACCEPTED_MIME_TYPES: &[&str] = &["application/pdf"];

pub fn is_valid_file(file: &UploadedFile) -> bool {
    ACCEPTED_MIME_TYPES.contains(&file.mime.as_str())
}

/// Data-URI rendering of an accepted file, for the slot preview.
fn data_uri(file: &UploadedFile) -> String {
    format!("data:{};base64,{}", file.mime, B64.encode(&file.bytes))
}

/// Ordered mapping of slot keys to their upload state. The set of slots is
/// fixed at construction; only slot contents change afterwards. At most
/// one slot carries the drag-over highlight at a time.
pub struct UploadRegistry {
    slots: Vec<UploadSlot>,
    drag_over: Option<String>,
}

impl UploadRegistry {
    pub fn new(keys: &[&str]) -> Self {
        Self {
            slots: keys.iter().map(|k| UploadSlot::empty(k)).collect(),
            drag_over: None,
        }
    }

    pub fn slot(&self, key: &str) -> Option<&UploadSlot> {
        self.slots.iter().find(|s| s.key == key)
    }

    pub fn drag_target(&self) -> Option<&str> {
        self.drag_over.as_deref()
    }

    pub fn total_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn uploaded_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_populated()).count()
    }

    pub fn all_uploaded(&self) -> bool {
        self.slots.iter().all(UploadSlot::is_populated)
    }

    /// Validate and store a file in its slot. The preview is derived
    /// before the transition so the slot becomes Populated with file and
    /// preview set together, never a file with a stale preview. Returns
    /// whether the file was accepted. Unknown keys and rejected MIME
    /// types leave the registry unchanged.
    pub fn accept(&mut self, key: &str, file: UploadedFile) -> bool {
        if !is_valid_file(&file) {
            logging::debug(format!(
                "Rejected upload for slot '{}': unsupported type '{}'",
                key, file.mime
            ));
            return false;
        }
        let preview = data_uri(&file);
        match self.slots.iter_mut().find(|s| s.key == key) {
            Some(slot) => {
                // Full slot replacement, never partial field mutation.
                *slot = UploadSlot {
                    key: slot.key.clone(),
                    file: Some(file),
                    preview: Some(preview),
                };
                true
            }
            None => false,
        }
    }

    /// Empty a slot; idempotent, succeeds whether or not it held a file.
    pub fn remove(&mut self, key: &str) {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.key == key) {
            *slot = UploadSlot::empty(key);
        }
    }

    /// Empty every slot (after a successful submission).
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            *slot = UploadSlot::empty(&slot.key.clone());
        }
    }

    pub fn drag_over(&mut self, key: &str) {
        self.drag_over = Some(key.to_string());
    }

    pub fn drag_leave(&mut self) {
        self.drag_over = None;
    }

    /// Complete a drag-and-drop. The highlight is cleared unconditionally;
    /// an invalid file is dropped silently with no other effect.
    pub fn drop(&mut self, key: &str, file: UploadedFile) {
        self.drag_over = None;
        if is_valid_file(&file) {
            self.accept(key, file);
        }
    }
}
