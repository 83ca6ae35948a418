//! Submission controller.
//!
//! Receives commands from the UI thread, runs network work on the runtime and
//! reports every settled submission back as an [`AppEvent`].

use super::navigation::{load_page, PageSource};
use crate::model::{AppEvent, Locale};
use crate::submit::upload::{self, preflight_banner, UploadForm, UploadOutcome};
use crate::submit::{predict, FormPayload, Outcome, Transport, TransportError};
use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    SubmitUpload(UploadForm),
    SubmitManual(FormPayload),
    Load(PageSource),
    Quit,
}

/// Run `work` on its own task and always deliver an event: if the task dies,
/// `on_failure` builds the settle event instead so no control stays busy.
fn spawn_settled<F>(
    event_tx: UnboundedSender<AppEvent>,
    work: F,
    on_failure: impl FnOnce(TransportError) -> AppEvent + Send + 'static,
) where
    F: Future<Output = Vec<AppEvent>> + Send + 'static,
{
    tokio::spawn(async move {
        match tokio::spawn(work).await {
            Ok(events) => {
                for ev in events {
                    let _ = event_tx.send(ev);
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "submission task failed");
                let _ = event_tx.send(on_failure(TransportError::Task(e.to_string())));
            }
        }
    });
}

async fn run_upload<T: Transport>(transport: &T, form: UploadForm, locale: Locale) -> Vec<AppEvent> {
    let payload = match form.build_payload().await {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "upload rejected before sending");
            return vec![AppEvent::UploadSettled(UploadOutcome::Error(preflight_banner(
                &e, locale,
            )))];
        }
    };
    let outcome = upload::render(upload::classify(transport.post_form(payload).await), locale);
    let mut events = vec![AppEvent::UploadSettled(outcome.clone())];
    if let UploadOutcome::Navigate { target } = outcome {
        events.push(navigate(transport, PageSource::Remote(target)).await);
    }
    events
}

async fn navigate<T: Transport>(transport: &T, source: PageSource) -> AppEvent {
    match load_page(transport, &source).await {
        Ok(store) => AppEvent::PageLoaded { source, store },
        Err(e) => {
            tracing::warn!(error = %e, "results page load failed");
            AppEvent::Info(format!("Load failed: {e:#}"))
        }
    }
}

/// Serve UI commands until `Quit` or until the UI side hangs up.
pub(crate) async fn run_controller<T>(
    transport: Arc<T>,
    locale: Locale,
    event_tx: UnboundedSender<AppEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()>
where
    T: Transport + 'static,
{
    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            UiCommand::SubmitUpload(form) => {
                let t = transport.clone();
                spawn_settled(
                    event_tx.clone(),
                    async move { run_upload(t.as_ref(), form, locale).await },
                    move |e| AppEvent::UploadSettled(upload::render(Outcome::TransportError(e), locale)),
                );
            }
            UiCommand::SubmitManual(payload) => {
                let t = transport.clone();
                spawn_settled(
                    event_tx.clone(),
                    async move {
                        let raw = t.post_form(payload).await;
                        vec![AppEvent::PredictSettled(predict::render(
                            predict::classify(raw),
                            locale,
                        ))]
                    },
                    move |e| AppEvent::PredictSettled(predict::render(Outcome::TransportError(e), locale)),
                );
            }
            UiCommand::Load(source) => {
                let t = transport.clone();
                spawn_settled(
                    event_tx.clone(),
                    async move { vec![navigate(t.as_ref(), source).await] },
                    |e| AppEvent::Info(format!("Load failed: {e}")),
                );
            }
            UiCommand::Quit => break,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_input::FileControl;
    use crate::submit::predict::PredictionPanel;
    use crate::submit::testing::ScriptedTransport;
    use tokio::sync::mpsc;

    const PAGE: &str = r#"<table><tbody id="results-tbody">
<tr data-stress-level="2"><td>1</td><td>x</td></tr>
<tr data-stress-level="0"><td>2</td><td>y</td></tr></tbody></table>"#;

    #[tokio::test]
    async fn upload_redirect_loads_new_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.csv");
        std::fs::write(&path, "a\n1\n").unwrap();

        let t = ScriptedTransport::replying(200, r#"{"success":true,"redirect":"/results/42"}"#)
            .page("/results/42", PAGE);
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let ctrl = tokio::spawn(run_controller(Arc::new(t), Locale::En, event_tx, cmd_rx));

        let mut form = UploadForm::new(Some(FileControl::default()), "csv_file", Locale::En);
        form.select_file(&path);
        cmd_tx.send(UiCommand::SubmitUpload(form)).unwrap();

        match event_rx.recv().await.unwrap() {
            AppEvent::UploadSettled(UploadOutcome::Navigate { target }) => {
                assert_eq!(target, "/results/42")
            }
            other => panic!("unexpected {other:?}"),
        }
        match event_rx.recv().await.unwrap() {
            AppEvent::PageLoaded { source, store } => {
                assert_eq!(source, PageSource::Remote("/results/42".into()));
                assert_eq!(store.unwrap().len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }

        cmd_tx.send(UiCommand::Quit).unwrap();
        ctrl.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn manual_submit_always_settles() {
        let t = ScriptedTransport::failing(TransportError::Request("refused".into()));
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let ctrl = tokio::spawn(run_controller(Arc::new(t), Locale::En, event_tx, cmd_rx));

        cmd_tx
            .send(UiCommand::SubmitManual(FormPayload::default().text("form_type", "manual")))
            .unwrap();
        assert!(matches!(
            event_rx.recv().await.unwrap(),
            AppEvent::PredictSettled(PredictionPanel::Error { .. })
        ));
        drop(cmd_tx);
        ctrl.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn failed_task_still_emits_settle_event() {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        spawn_settled(
            event_tx,
            async {
                if true {
                    panic!("worker died");
                }
                Vec::<AppEvent>::new()
            },
            |e| AppEvent::PredictSettled(predict::render(Outcome::TransportError(e), Locale::En)),
        );
        assert!(matches!(
            event_rx.recv().await.unwrap(),
            AppEvent::PredictSettled(PredictionPanel::Error { .. })
        ));
    }
}
