use crate::logging;
use crate::models::SubmissionState;
use crate::upload::{UploadRegistry, SLOT_PROMESA_FIRMADA};
use eyre::Result;
use reqwest::blocking::multipart::{Form, Part};
use serde_json::Value;
use std::time::Duration;

/// Fixed route suffix of the submission endpoint.
pub const SUBMIT_PATH: &str = "promesafirmada";
/// Multipart field name carrying the signed PDF.
pub const SUBMIT_FIELD: &str = "promesa_firmada";

pub const MSG_MISSING_ID: &str = "No se pudo obtener el ID de la URL. Por favor, asegúrate de \
    acceder al formulario desde el enlace correcto.";
pub const MSG_MISSING_FILE: &str = "Por favor, sube el documento requerido";
pub const MSG_SERVER_ERROR: &str = "Error en el servidor";
pub const MSG_UNKNOWN_ERROR: &str = "Ocurrió un error desconocido";
pub const MSG_CONFIRMATION: &str = "Documento enviado correctamente. Por favor revise su correo \
    electrónico, ya que se le notificará una vez el documento haya sido procesado.";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Classify an HTTP response. Any 2xx is success, with or without a JSON
/// body; otherwise the failure message comes from the body's `message`
/// field when present.
pub fn classify_response(status: u16, body: &str) -> Result<(), String> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| MSG_SERVER_ERROR.to_string());
    Err(message)
}

/// Sends the populated registry to the backend and owns the submission
/// lifecycle. One submission in flight at a time; the Submitting flag is
/// an idempotent guard, not a lock.
pub struct SubmissionController {
    state: SubmissionState,
}

impl SubmissionController {
    pub fn new() -> Self {
        Self {
            state: SubmissionState::Idle,
        }
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// Whether the submit control should be enabled.
    pub fn can_submit(&self, registry: &UploadRegistry) -> bool {
        registry.all_uploaded() && !self.state.is_submitting()
    }

    /// Run one submission attempt. Validation failures report immediately
    /// and never touch the network; transport/server failures leave the
    /// registry intact so the user can retry without re-uploading. Success
    /// resets every slot.
    pub fn submit(
        &mut self,
        registry: &mut UploadRegistry,
        destination_id: Option<&str>,
        api_base_url: &str,
    ) -> &SubmissionState {
        if self.state.is_submitting() {
            return &self.state;
        }
        // A fresh attempt leaves any prior Succeeded/Failed outcome behind.
        self.state = SubmissionState::Idle;

        if destination_id.map(str::trim).filter(|s| !s.is_empty()).is_none() {
            self.state = SubmissionState::Failed(MSG_MISSING_ID.to_string());
            return &self.state;
        }
        let populated = registry
            .slot(SLOT_PROMESA_FIRMADA)
            .and_then(|slot| slot.file.clone());
        let Some(file) = populated else {
            self.state = SubmissionState::Failed(MSG_MISSING_FILE.to_string());
            return &self.state;
        };

        self.state = SubmissionState::Submitting;
        logging::info(format!("Submitting '{}' to {SUBMIT_PATH}", file.name));

        self.state = match post_document(api_base_url, file.name, file.mime, file.bytes) {
            Ok(()) => {
                registry.reset();
                SubmissionState::Succeeded
            }
            Err(message) => {
                logging::error(format!("Error al enviar documento: {message}"));
                SubmissionState::Failed(message)
            }
        };
        &self.state
    }
}

impl Default for SubmissionController {
    fn default() -> Self {
        Self::new()
    }
}

/// Single multipart POST. The destination id travels via the page context
/// upstream, not in this call; the server links the upload on its side.
fn post_document(api_base_url: &str, name: String, mime: String, bytes: Vec<u8>) -> Result<(), String> {
    let attempt = || -> Result<(u16, String)> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("promesa")
            .build()?;
        let part = Part::bytes(bytes.clone())
            .file_name(name.clone())
            .mime_str(&mime)?;
        let form = Form::new().part(SUBMIT_FIELD, part);
        let url = format!("{}/{SUBMIT_PATH}", api_base_url.trim_end_matches('/'));
        let response = client.post(url).multipart(form).send()?;
        let status = response.status().as_u16();
        let body = response.text().unwrap_or_default();
        Ok((status, body))
    };

    match attempt() {
        Ok((status, body)) => classify_response(status, &body),
        Err(err) => {
            let description = err.to_string();
            if description.trim().is_empty() {
                Err(MSG_UNKNOWN_ERROR.to_string())
            } else {
                Err(description)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UploadedFile;

    fn registry_with_pdf() -> UploadRegistry {
        let mut reg = UploadRegistry::new(&[SLOT_PROMESA_FIRMADA]);
        reg.accept(
            SLOT_PROMESA_FIRMADA,
            UploadedFile {
                name: "promesa.pdf".to_string(),
                mime: "application/pdf".to_string(),
                bytes: vec![0x25, 0x50, 0x44, 0x46],
            },
        );
        reg
    }

    #[test]
    fn test_classify_success_with_and_without_body() {
        assert_eq!(classify_response(200, "{}"), Ok(()));
        assert_eq!(classify_response(201, ""), Ok(()));
        assert_eq!(classify_response(204, "not json"), Ok(()));
    }

    #[test]
    fn test_classify_failure_uses_body_message() {
        let outcome = classify_response(500, r#"{"message":"bad file"}"#);
        assert_eq!(outcome, Err("bad file".to_string()));
    }

    #[test]
    fn test_classify_failure_falls_back_to_generic_message() {
        assert_eq!(classify_response(500, ""), Err(MSG_SERVER_ERROR.to_string()));
        assert_eq!(
            classify_response(404, r#"{"error":"sin message"}"#),
            Err(MSG_SERVER_ERROR.to_string())
        );
    }

    #[test]
    fn test_classify_failure_ignores_parseable_body_on_error_status() {
        // A parseable body does not rescue a non-2xx status.
        let outcome = classify_response(502, r#"{"ok":true}"#);
        assert!(outcome.is_err());
    }

    #[test]
    fn test_submit_without_destination_id_fails_without_network() {
        let mut reg = registry_with_pdf();
        let mut controller = SubmissionController::new();
        let state = controller.submit(&mut reg, None, "http://invalid.test");
        assert_eq!(state, &SubmissionState::Failed(MSG_MISSING_ID.to_string()));
        // Registry untouched.
        assert_eq!(reg.uploaded_count(), 1);
    }

    #[test]
    fn test_submit_with_blank_destination_id_fails() {
        let mut reg = registry_with_pdf();
        let mut controller = SubmissionController::new();
        let state = controller.submit(&mut reg, Some("   "), "http://invalid.test");
        assert_eq!(state, &SubmissionState::Failed(MSG_MISSING_ID.to_string()));
    }

    #[test]
    fn test_submit_with_empty_slot_fails_without_network() {
        let mut reg = UploadRegistry::new(&[SLOT_PROMESA_FIRMADA]);
        let mut controller = SubmissionController::new();
        let state = controller.submit(&mut reg, Some("abc123"), "http://invalid.test");
        assert_eq!(state, &SubmissionState::Failed(MSG_MISSING_FILE.to_string()));
    }

    #[test]
    fn test_network_fault_preserves_registry_for_retry() {
        let mut reg = registry_with_pdf();
        let mut controller = SubmissionController::new();
        // Unroutable base URL: the send fails, classified as Failed.
        let state = controller.submit(&mut reg, Some("abc123"), "http://127.0.0.1:9");
        assert!(matches!(state, SubmissionState::Failed(_)));
        assert_eq!(reg.uploaded_count(), 1);
        assert!(controller.can_submit(&reg));
    }

    #[test]
    fn test_can_submit_gating() {
        let empty = UploadRegistry::new(&[SLOT_PROMESA_FIRMADA]);
        let full = registry_with_pdf();
        let mut controller = SubmissionController::new();
        assert!(!controller.can_submit(&empty));
        assert!(controller.can_submit(&full));
        controller.state = SubmissionState::Submitting;
        assert!(!controller.can_submit(&full));
    }

    #[test]
    fn test_submit_while_submitting_is_ignored() {
        let mut reg = registry_with_pdf();
        let mut controller = SubmissionController::new();
        controller.state = SubmissionState::Submitting;
        let state = controller.submit(&mut reg, Some("abc123"), "http://invalid.test");
        assert_eq!(state, &SubmissionState::Submitting);
        assert_eq!(reg.uploaded_count(), 1);
    }
}
