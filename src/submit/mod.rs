//! Submission workflow shared by the upload and manual-predict forms.
//!
//! A submission is one request/response cycle: the trigger control goes
//! in-flight, the payload is posted, the raw response is classified into an
//! [`Outcome`] and the control is restored. Rendering an outcome is a pure
//! function per flow (see [`upload`] and [`predict`]).

pub mod http;
pub mod predict;
pub mod upload;

use serde::Serialize;
use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubmissionState {
    Idle,
    InFlight,
}

/// A form's submit button.
#[derive(Debug, Clone)]
pub struct SubmitControl {
    label: String,
    busy_label: String,
    original_label: Option<String>,
    state: SubmissionState,
}

impl SubmitControl {
    pub fn new(label: impl Into<String>, busy_label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            busy_label: busy_label.into(),
            original_label: None,
            state: SubmissionState::Idle,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> SubmissionState {
        self.state
    }

    /// Disabled iff a submission is in flight.
    pub fn is_enabled(&self) -> bool {
        self.state == SubmissionState::Idle
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Enter the in-flight state. Returns `false` (and changes nothing) while disabled.
    pub fn begin(&mut self) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let busy = self.busy_label.clone();
        self.original_label = Some(std::mem::replace(&mut self.label, busy));
        self.state = SubmissionState::InFlight;
        true
    }

    /// Re-enable and restore the original label. Safe to call when idle.
    pub fn settle(&mut self) {
        if let Some(original) = self.original_label.take() {
            self.label = original;
        }
        self.state = SubmissionState::Idle;
    }

    /// Enter the in-flight state for the lifetime of the returned guard.
    pub fn try_begin(&mut self) -> Option<InFlight<'_>> {
        self.begin().then_some(InFlight { control: self })
    }
}

/// Restores its control when dropped, whichever way the submission ended.
pub struct InFlight<'a> {
    control: &'a mut SubmitControl,
}

impl InFlight<'_> {
    pub fn control(&self) -> &SubmitControl {
        self.control
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.control.settle();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    File { file_name: String, bytes: Vec<u8> },
}

/// Multipart body built from a form's current field values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPayload {
    pub fields: Vec<(String, FieldValue)>,
}

impl FormPayload {
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields
            .push((name.into(), FieldValue::Text(value.into())));
        self
    }

    pub fn file(mut self, name: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.fields.push((
            name.into(),
            FieldValue::File {
                file_name: file_name.into(),
                bytes,
            },
        ));
        self
    }

    #[cfg(test)]
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.fields.iter().find_map(|(n, v)| match v {
            FieldValue::Text(t) if n == name => Some(t.as_str()),
            _ => None,
        })
    }
}

/// Status and body of a settled HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("invalid target url {target:?}: {reason}")]
    InvalidUrl { target: String, reason: String },
    #[error("submission task failed: {0}")]
    Task(String),
}

/// Classified result of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Success(T),
    ServerError { status: u16, message: Option<String> },
    TransportError(TransportError),
    Malformed(String),
}

/// The single server endpoint, plus page fetches for navigation.
pub trait Transport: Send + Sync {
    fn post_form(
        &self,
        payload: FormPayload,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;

    /// GET `target`, resolved against the endpoint when relative.
    fn get_page(
        &self,
        target: &str,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

/// Run one submission against `control`.
///
/// Returns `None` without touching the network when the control is already
/// in flight. The control is restored before this returns on every path.
pub async fn submit_with_control<T, O, F>(
    control: &mut SubmitControl,
    transport: &T,
    payload: FormPayload,
    classify: F,
) -> Option<Outcome<O>>
where
    T: Transport,
    F: FnOnce(Result<RawResponse, TransportError>) -> Outcome<O>,
{
    let guard = control.try_begin()?;
    tracing::debug!(label = guard.control().label(), "submission in flight");
    let raw = transport.post_form(payload).await;
    let outcome = classify(raw);
    drop(guard);
    Some(outcome)
}
