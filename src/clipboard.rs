use crate::dom::HtmlRoot;
use crate::logging;
use crate::models::CopyState;
use eyre::Result;
use std::time::{Duration, Instant};

/// How long the Copied confirmation stays up before reverting on its own.
pub const COPIED_REVERT_DELAY: Duration = Duration::from_millis(2000);

/// Seam over the system clipboard so the confirmation timer can be tested
/// against a recording fake.
pub trait ClipboardBackend {
    fn set_text(&mut self, text: String) -> Result<()>;
}

pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self> {
        Ok(Self {
            inner: arboard::Clipboard::new()?,
        })
    }
}

impl ClipboardBackend for SystemClipboard {
    fn set_text(&mut self, text: String) -> Result<()> {
        self.inner.set_text(text)?;
        Ok(())
    }
}

/// Backend for runs that never copy; avoids opening a clipboard handle.
pub struct NoopClipboard;

impl ClipboardBackend for NoopClipboard {
    fn set_text(&mut self, _text: String) -> Result<()> {
        Ok(())
    }
}

/// Copies the document's visible text and keeps the transient Copied
/// confirmation, reverting it 2000 ms after the most recent copy.
pub struct ClipboardService {
    backend: Box<dyn ClipboardBackend>,
    state: CopyState,
    copied_at: Option<Instant>,
}

impl ClipboardService {
    pub fn new(backend: Box<dyn ClipboardBackend>) -> Self {
        Self {
            backend,
            state: CopyState::Idle,
            copied_at: None,
        }
    }

    pub fn state(&self) -> CopyState {
        self.state
    }

    /// Copy the document's rendered text. Absent subtree: no-op. A failed
    /// clipboard write is swallowed; copying is best effort.
    pub fn copy_visible_text(&mut self, root: &HtmlRoot) {
        let Some(text) = root.visible_text() else {
            return;
        };
        match self.backend.set_text(text) {
            Ok(()) => {
                self.state = CopyState::Copied;
                // A repeat copy restarts the revert timer instead of
                // stacking a second one.
                self.copied_at = Some(Instant::now());
            }
            Err(err) => logging::debug(format!("Clipboard write failed: {err}")),
        }
    }

    /// Advance the revert timer; called from the event loop.
    pub fn tick(&mut self) {
        if self.state == CopyState::Copied {
            let expired = self
                .copied_at
                .map(|at| at.elapsed() >= COPIED_REVERT_DELAY)
                .unwrap_or(true);
            if expired {
                self.state = CopyState::Idle;
                self.copied_at = None;
            }
        }
    }

    #[cfg(test)]
    fn backdate_copy(&mut self, by: Duration) {
        if let Some(at) = self.copied_at {
            self.copied_at = Some(at - by);
        }
    }
}
