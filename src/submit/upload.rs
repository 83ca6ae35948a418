//! CSV upload flow: pre-flight validation, submission and redirect handling.

use super::{FormPayload, Outcome, RawResponse, SubmitControl, TransportError};
use crate::file_input::FileControl;
use crate::model::{FormKind, Locale, Message};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Validation failures caught before any network call.
#[derive(Debug, thiserror::Error)]
pub enum PreflightError {
    #[error("no file selected")]
    NoFileSelected,
    #[error("invalid file type: {0}")]
    InvalidFileType(String),
    #[error("upload form is missing its {0}")]
    MissingElement(&'static str),
    #[error("failed to read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Dedicated error region of the upload form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBanner {
    pub message: String,
    /// Move focus to the file control when the banner is shown.
    pub focus_file_control: bool,
}

/// What the UI does once an upload settles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UploadOutcome {
    Navigate { target: String },
    Error(ErrorBanner),
}

/// Upload form handles: file control, error banner and submit button.
#[derive(Debug, Clone)]
pub struct UploadForm {
    pub file: Option<FileControl>,
    pub field_name: String,
    pub banner: Option<ErrorBanner>,
    pub submit: SubmitControl,
    locale: Locale,
}

impl UploadForm {
    pub fn new(file: Option<FileControl>, field_name: impl Into<String>, locale: Locale) -> Self {
        Self {
            file,
            field_name: field_name.into(),
            banner: None,
            submit: SubmitControl::new(locale.upload_label(), locale.busy_label()),
            locale,
        }
    }

    /// Select a file. Any previously shown error is cleared immediately.
    pub fn select_file(&mut self, path: impl Into<PathBuf>) {
        self.banner = None;
        if let Some(file) = self.file.as_mut() {
            file.select(path);
        }
    }

    pub fn clear_file(&mut self) {
        if let Some(file) = self.file.as_mut() {
            file.clear();
        }
    }

    /// Validate the form without touching the network.
    pub fn preflight(&self) -> Result<PathBuf, PreflightError> {
        if self.field_name.trim().is_empty() {
            return Err(PreflightError::MissingElement("file field name"));
        }
        let file = self
            .file
            .as_ref()
            .ok_or(PreflightError::MissingElement("file control"))?;
        let path = file.selected().ok_or(PreflightError::NoFileSelected)?;
        if !has_csv_extension(path) {
            return Err(PreflightError::InvalidFileType(display_name(path)));
        }
        Ok(path.to_path_buf())
    }

    /// Validate and read the selected file into a multipart payload.
    pub async fn build_payload(&self) -> Result<FormPayload, PreflightError> {
        let path = self.preflight()?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| PreflightError::Unreadable {
                path: path.clone(),
                source,
            })?;
        Ok(FormPayload::default()
            .text("form_type", FormKind::Upload.form_type())
            .file(self.field_name.clone(), display_name(&path), bytes))
    }

    /// Show the banner for a failed pre-flight check.
    pub fn reject(&mut self, err: &PreflightError) {
        self.banner = Some(preflight_banner(err, self.locale));
    }

    /// Apply a settled outcome: an error fills the banner, navigation clears it.
    pub fn apply(&mut self, outcome: &UploadOutcome) {
        self.banner = match outcome {
            UploadOutcome::Error(banner) => Some(banner.clone()),
            UploadOutcome::Navigate { .. } => None,
        };
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.to_ascii_lowercase().ends_with(".csv"))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn preflight_banner(err: &PreflightError, locale: Locale) -> ErrorBanner {
    let (message, focus_file_control) = match err {
        PreflightError::NoFileSelected => (locale.message(Message::NoFileSelected).to_string(), true),
        PreflightError::InvalidFileType(_) => (locale.message(Message::InvalidFileType).to_string(), false),
        PreflightError::MissingElement(what) => {
            tracing::error!(element = what, "upload form is missing an expected element");
            (locale.message(Message::FormUnavailable).to_string(), false)
        }
        PreflightError::Unreadable { .. } => (format!("{err}"), true),
    };
    ErrorBanner {
        message,
        focus_file_control,
    }
}

/// Fields of an upload reply. Each is read on its own so one oddly typed
/// field does not discard the rest.
#[derive(Debug, Default)]
struct UploadReply {
    success: bool,
    redirect: Option<String>,
    error: bool,
    message: Option<String>,
}

impl UploadReply {
    fn from_json(body: &serde_json::Map<String, serde_json::Value>) -> Self {
        use serde_json::Value;
        let flag = |key: &str| match body.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        };
        let text = |key: &str| match body.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            Some(v @ (Value::Number(_) | Value::Bool(_))) => Some(v.to_string()),
            _ => None,
        };
        Self {
            success: flag("success"),
            redirect: text("redirect"),
            error: flag("error"),
            message: text("message"),
        }
    }
}

/// Classify the server's answer to an upload.
pub fn classify(raw: Result<RawResponse, TransportError>) -> Outcome<String> {
    let raw = match raw {
        Ok(raw) => raw,
        Err(e) => return Outcome::TransportError(e),
    };
    let reply = match serde_json::from_str::<serde_json::Value>(&raw.body) {
        Ok(serde_json::Value::Object(body)) => UploadReply::from_json(&body),
        Ok(_) => UploadReply::default(),
        Err(e) => {
            tracing::warn!(status = raw.status, error = %e, "upload response is not JSON");
            return Outcome::Malformed(format!("unparseable body: {e}"));
        }
    };
    if !raw.is_success() || reply.error {
        return Outcome::ServerError {
            status: raw.status,
            message: reply.message,
        };
    }
    match (reply.success, reply.redirect) {
        (true, Some(target)) => Outcome::Success(target),
        _ => {
            tracing::warn!(status = raw.status, "upload response has an unexpected shape");
            Outcome::Malformed("unexpected response shape".into())
        }
    }
}

/// Pure mapping from an outcome to what the UI shows.
pub fn render(outcome: Outcome<String>, locale: Locale) -> UploadOutcome {
    let banner = |message: String| {
        UploadOutcome::Error(ErrorBanner {
            message,
            focus_file_control: false,
        })
    };
    match outcome {
        Outcome::Success(target) => UploadOutcome::Navigate { target },
        Outcome::ServerError { message, .. } => {
            banner(message.unwrap_or_else(|| locale.message(Message::UploadFailed).to_string()))
        }
        Outcome::TransportError(e) => {
            tracing::warn!(error = %e, "upload request failed");
            banner(locale.message(Message::UploadFailed).to_string())
        }
        Outcome::Malformed(_) => banner(locale.message(Message::UnexpectedResponse).to_string()),
    }
}
