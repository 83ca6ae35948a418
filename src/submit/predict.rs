//! Manual single-record prediction flow.

use super::{FormPayload, Outcome, RawResponse, SubmitControl, TransportError};
use crate::model::{FormKind, Locale, Message, Severity};
use serde::Serialize;

/// Field names of the server's manual-entry form.
pub const DEFAULT_FIELDS: &[&str] = &[
    "anxiety_level",
    "self_esteem",
    "mental_health_history",
    "depression",
    "headache",
    "blood_pressure",
    "sleep_quality",
    "breathing_problem",
    "noise_level",
    "living_conditions",
    "safety",
    "basic_needs",
    "academic_performance",
    "study_load",
    "teacher_student_relationship",
    "future_career_concerns",
    "social_support",
    "peer_pressure",
    "extracurricular_activities",
    "bullying",
];

/// Content of the prediction results region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredictionPanel {
    Result {
        /// The value as the server sent it.
        prediction: String,
        severity: Severity,
        label: String,
        description: String,
        color: String,
    },
    Error {
        message: String,
    },
}

/// Manual-entry form: editable fields, submit button and results region.
#[derive(Debug, Clone)]
pub struct ManualForm {
    pub fields: Vec<(String, String)>,
    pub submit: SubmitControl,
    pub panel: Option<PredictionPanel>,
}

impl ManualForm {
    pub fn new(fields: Vec<(String, String)>, locale: Locale) -> Self {
        Self {
            fields,
            submit: SubmitControl::new(locale.predict_label(), locale.busy_label()),
            panel: None,
        }
    }

    /// Form with the server's default field names and empty values.
    pub fn with_default_fields(locale: Locale) -> Self {
        Self::new(
            DEFAULT_FIELDS
                .iter()
                .map(|name| (name.to_string(), String::new()))
                .collect(),
            locale,
        )
    }

    /// Set `name` to `value`, appending the field when it is not part of the form yet.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn payload(&self) -> FormPayload {
        self.fields.iter().fold(
            FormPayload::default().text("form_type", FormKind::Manual.form_type()),
            |p, (name, value)| p.text(name.clone(), value.clone()),
        )
    }

    /// Reveal the results region with `panel`.
    pub fn show(&mut self, panel: PredictionPanel) {
        self.panel = Some(panel);
    }
}

/// A `prediction` value from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    /// Integral class label, when the value is one.
    pub class: Option<i64>,
    pub raw: String,
}

impl Prediction {
    fn from_json(v: &serde_json::Value) -> Self {
        let class = match v {
            serde_json::Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i64)
            }),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        let raw = match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Self { class, raw }
    }

    /// Values that are not a known class label read as class 0.
    pub fn severity(&self) -> Severity {
        self.class.map_or(Severity::Low, Severity::from_prediction)
    }
}

/// Classify the server's answer to a manual prediction.
pub fn classify(raw: Result<RawResponse, TransportError>) -> Outcome<Prediction> {
    let raw = match raw {
        Ok(raw) => raw,
        Err(e) => return Outcome::TransportError(e),
    };
    if !raw.is_success() {
        return Outcome::ServerError {
            status: raw.status,
            message: None,
        };
    }
    let body: serde_json::Value = match serde_json::from_str(&raw.body) {
        Ok(v) => v,
        Err(e) => return Outcome::Malformed(format!("unparseable body: {e}")),
    };
    match body.get("prediction") {
        Some(v) => Outcome::Success(Prediction::from_json(v)),
        None => Outcome::Malformed("missing `prediction`".into()),
    }
}

/// Pure mapping from an outcome to the results panel.
pub fn render(outcome: Outcome<Prediction>, locale: Locale) -> PredictionPanel {
    match outcome {
        Outcome::Success(prediction) => {
            let severity = prediction.severity();
            PredictionPanel::Result {
                prediction: prediction.raw,
                severity,
                label: severity.headline(locale),
                description: severity.description(locale).to_string(),
                color: severity.color_hex().to_string(),
            }
        }
        other => {
            tracing::warn!(outcome = ?other, "prediction request failed");
            PredictionPanel::Error {
                message: locale.message(Message::PredictFailed).to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submit::submit_with_control;
    use crate::submit::testing::ScriptedTransport;

    async fn predict(t: &ScriptedTransport) -> ManualForm {
        let mut form = ManualForm::with_default_fields(Locale::En);
        form.set("anxiety_level", "14");
        let payload = form.payload();
        let outcome = submit_with_control(&mut form.submit, t, payload, classify)
            .await
            .expect("idle control");
        form.show(render(outcome, Locale::En));
        form
    }

    #[tokio::test]
    async fn medium_prediction_renders_medium() {
        let t = ScriptedTransport::replying(200, r#"{"prediction": 1}"#);
        let form = predict(&t).await;
        assert_eq!(
            form.panel,
            Some(PredictionPanel::Result {
                prediction: "1".into(),
                severity: Severity::Medium,
                label: "Medium stress level".into(),
                description: Severity::Medium.description(Locale::En).into(),
                color: "#f59e0b".into(),
            })
        );
        assert!(form.submit.is_enabled());
        assert_eq!(form.submit.label(), "Predict");
        let sent = t.sent.lock().unwrap();
        assert_eq!(sent[0].get_text("form_type"), Some("manual"));
        assert_eq!(sent[0].get_text("anxiety_level"), Some("14"));
    }

    #[tokio::test]
    async fn unknown_prediction_falls_back_to_class_zero() {
        let t = ScriptedTransport::replying(200, r#"{"prediction": 99}"#);
        let form = predict(&t).await;
        match form.panel {
            Some(PredictionPanel::Result {
                prediction,
                severity,
                color,
                ..
            }) => {
                assert_eq!(prediction, "99");
                assert_eq!(severity, Severity::Low);
                assert_eq!(color, "#10b981");
            }
            other => panic!("unexpected panel {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_shows_retry_message() {
        let t = ScriptedTransport::replying(500, r#"{"prediction": 2}"#);
        let form = predict(&t).await;
        assert_eq!(
            form.panel,
            Some(PredictionPanel::Error {
                message: "An error occurred while processing the request. Please try again.".into()
            })
        );
        assert!(form.submit.is_enabled());
    }

    #[tokio::test]
    async fn transport_error_shows_retry_message() {
        let t = ScriptedTransport::failing(TransportError::Request("timed out".into()));
        let form = predict(&t).await;
        assert!(matches!(form.panel, Some(PredictionPanel::Error { .. })));
        assert!(form.submit.is_enabled());
    }

    #[test]
    fn classify_shapes() {
        let ok = |body: &str| {
            Ok(RawResponse {
                status: 200,
                body: body.to_string(),
            })
        };
        assert_eq!(
            classify(ok(r#"{"prediction":"2"}"#)),
            Outcome::Success(Prediction {
                class: Some(2),
                raw: "2".into()
            })
        );
        assert!(matches!(classify(ok("not json")), Outcome::Malformed(_)));
        assert!(matches!(classify(ok(r#"{"result":1}"#)), Outcome::Malformed(_)));
    }

    #[test]
    fn integral_float_keeps_its_class() {
        let panel = render(
            classify(Ok(RawResponse {
                status: 200,
                body: r#"{"prediction": 2.0}"#.into(),
            })),
            Locale::En,
        );
        match panel {
            PredictionPanel::Result { severity, .. } => assert_eq!(severity, Severity::High),
            other => panic!("unexpected panel {other:?}"),
        }
    }

    #[test]
    fn odd_prediction_values_read_as_low() {
        for body in [
            r#"{"prediction": null}"#,
            r#"{"prediction": 1.5}"#,
            r#"{"prediction": "high"}"#,
            r#"{"prediction": [1]}"#,
        ] {
            let panel = render(
                classify(Ok(RawResponse {
                    status: 200,
                    body: body.into(),
                })),
                Locale::En,
            );
            match panel {
                PredictionPanel::Result {
                    severity, color, ..
                } => {
                    assert_eq!(severity, Severity::Low, "{body}");
                    assert_eq!(color, "#10b981");
                }
                other => panic!("{body}: unexpected panel {other:?}"),
            }
        }
    }

    #[test]
    fn set_appends_unknown_fields() {
        let mut form = ManualForm::new(Vec::new(), Locale::Ru);
        form.set("custom", "1");
        form.set("custom", "2");
        assert_eq!(form.fields, vec![("custom".to_string(), "2".to_string())]);
        assert_eq!(form.submit.label(), "Предсказать");
    }
}
