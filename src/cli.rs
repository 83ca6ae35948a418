use crate::model::{ClientConfig, Locale};
use crate::orchestrator::{load_page, PageSource};
use crate::submit::http::HttpTransport;
use crate::submit::predict::{self, ManualForm};
use crate::submit::upload::{self, UploadForm, UploadOutcome};
use crate::submit::submit_with_control;
use crate::file_input::FileControl;
use crate::table::ResultsTable;
use crate::text_summary::{self, TextSummary};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortArg {
    Asc,
    Desc,
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "stress-predict-cli",
    version,
    about = "Stress-level prediction client with a paginated results table"
)]
pub struct Cli {
    /// Prediction endpoint (forms are POSTed here)
    #[arg(long, default_value = "http://127.0.0.1:5000/")]
    pub base_url: String,

    /// Results page to load at start (http(s) URL or local HTML file)
    #[arg(long)]
    pub results: Option<String>,

    /// Upload this CSV file
    #[arg(long)]
    pub upload: Option<PathBuf>,

    /// Submit a manual prediction built from --field values
    #[arg(long)]
    pub predict: bool,

    /// Manual form field as name=value (repeatable)
    #[arg(long = "field", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,

    /// Page of the results table to print
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub page: i64,

    /// Sort the results table by stress level before printing
    #[arg(long, value_enum)]
    pub sort: Option<SortArg>,

    /// Print JSON and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print text and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Language of labels and messages
    #[arg(long, value_enum, default_value_t = Locale::En)]
    pub locale: Locale,

    /// HTTP request timeout (none unless given)
    #[arg(long)]
    pub timeout: Option<humantime::Duration>,

    /// Multipart field name of the uploaded file
    #[arg(long, default_value = "csv_file")]
    pub upload_field: String,

    /// Write logs to this file (logging is off in the TUI otherwise)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn is_interactive(&self) -> bool {
        cfg!(feature = "tui") && !self.json && !self.text
    }
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got {raw:?}")),
    }
}

/// Build a `ClientConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> ClientConfig {
    ClientConfig {
        base_url: args.base_url.clone(),
        user_agent: format!("stress-predict-cli/{}", env!("CARGO_PKG_VERSION")),
        timeout: args.timeout.map(Into::into),
        locale: args.locale,
        upload_field: args.upload_field.clone(),
    }
}

/// Returns whether every requested submission succeeded.
pub async fn run(args: Cli) -> Result<bool> {
    if args.is_interactive() {
        #[cfg(feature = "tui")]
        {
            crate::tui::run(args).await?;
            return Ok(true);
        }
    }
    run_batch(args).await
}

/// Non-interactive mode: run the requested submissions in order and print each result.
async fn run_batch(args: Cli) -> Result<bool> {
    let cfg = build_config(&args);
    let transport = HttpTransport::new(&cfg)?;
    let (out_tx, out_handle) = spawn_output_writer();
    let emit = |summary: TextSummary| {
        for line in summary.lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    };
    let emit_json = |value: serde_json::Value| -> Result<()> {
        let _ = out_tx.send(OutputLine::Stdout(serde_json::to_string_pretty(&value)?));
        Ok(())
    };

    let mut all_ok = true;
    let mut results = args.results.as_deref().map(PageSource::from_arg);

    if let Some(path) = args.upload.as_ref() {
        let mut form = UploadForm::new(Some(FileControl::default()), cfg.upload_field.clone(), cfg.locale);
        form.select_file(path);
        let outcome = match form.build_payload().await {
            Ok(payload) => {
                let classified =
                    submit_with_control(&mut form.submit, &transport, payload, upload::classify)
                        .await
                        .context("upload control unexpectedly busy")?;
                upload::render(classified, cfg.locale)
            }
            Err(e) => {
                form.reject(&e);
                UploadOutcome::Error(form.banner.clone().context("preflight banner")?)
            }
        };
        form.apply(&outcome);
        match &outcome {
            UploadOutcome::Navigate { target } => {
                results = Some(PageSource::Remote(target.clone()));
            }
            UploadOutcome::Error(_) => all_ok = false,
        }
        if args.json {
            emit_json(serde_json::json!({ "upload": outcome }))?;
        } else {
            emit(text_summary::upload_summary(&outcome));
        }
    }

    if args.predict {
        let mut form = ManualForm::with_default_fields(cfg.locale);
        for (name, value) in &args.fields {
            form.set(name, value.clone());
        }
        let payload = form.payload();
        let classified = submit_with_control(&mut form.submit, &transport, payload, predict::classify)
            .await
            .context("predict control unexpectedly busy")?;
        form.show(predict::render(classified, cfg.locale));
        if let Some(panel) = form.panel.as_ref() {
            if matches!(panel, predict::PredictionPanel::Error { .. }) {
                all_ok = false;
            }
            if args.json {
                emit_json(serde_json::json!({ "prediction": panel }))?;
            } else {
                emit(text_summary::prediction_summary(panel, cfg.locale));
            }
        }
    }

    if let Some(source) = results {
        match load_page(&transport, &source).await? {
            Some(store) => {
                let mut table = ResultsTable::new(store, cfg.locale);
                let toggles = match args.sort {
                    None => 0,
                    Some(SortArg::Asc) => 1,
                    Some(SortArg::Desc) => 2,
                };
                for _ in 0..toggles {
                    table.toggle_sort();
                }
                table.render_page(args.page);
                let view = table.view();
                if args.json {
                    emit_json(serde_json::json!({ "results": view }))?;
                } else {
                    emit(text_summary::page_summary(&view));
                }
            }
            None => {
                let _ = out_tx.send(OutputLine::Stderr(format!(
                    "No results table in {}",
                    source.describe()
                )));
            }
        }
    }

    drop(out_tx);
    let _ = out_handle.await;
    Ok(all_ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_field_pairs() {
        let cli = Cli::try_parse_from([
            "stress-predict-cli",
            "--predict",
            "--field",
            "anxiety_level=14",
            "--field",
            "self_esteem=20",
            "--text",
        ])
        .unwrap();
        assert_eq!(
            cli.fields,
            vec![
                ("anxiety_level".to_string(), "14".to_string()),
                ("self_esteem".to_string(), "20".to_string())
            ]
        );
        assert!(!cli.is_interactive());
    }

    #[test]
    fn timeout_only_when_requested() {
        let cli = Cli::try_parse_from(["stress-predict-cli", "--timeout", "2m"]).unwrap();
        assert_eq!(
            build_config(&cli).timeout,
            Some(std::time::Duration::from_secs(120))
        );
    }

    #[test]
    fn rejects_field_without_value_separator() {
        assert!(Cli::try_parse_from(["stress-predict-cli", "--field", "oops"]).is_err());
        assert!(Cli::try_parse_from(["stress-predict-cli", "--field", "=1"]).is_err());
    }

    #[test]
    fn config_from_defaults() {
        let cli = Cli::try_parse_from(["stress-predict-cli", "--locale", "ru"]).unwrap();
        let cfg = build_config(&cli);
        assert_eq!(cfg.base_url, "http://127.0.0.1:5000/");
        assert_eq!(cfg.locale, Locale::Ru);
        assert_eq!(cfg.timeout, None);
        assert_eq!(cfg.upload_field, "csv_file");
        assert!(cfg.user_agent.starts_with("stress-predict-cli/"));
    }
}
