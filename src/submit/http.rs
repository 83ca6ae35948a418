use super::{FieldValue, FormPayload, RawResponse, Transport, TransportError};
use crate::model::ClientConfig;
use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Url;

/// Transport backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        let endpoint = Url::parse(&cfg.base_url)
            .with_context(|| format!("invalid base url {:?}", cfg.base_url))?;
        let mut builder = reqwest::Client::builder().user_agent(cfg.user_agent.clone());
        if let Some(timeout) = cfg.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("build http client")?;
        Ok(Self { http, endpoint })
    }

    /// Resolve a redirect target (absolute or relative) against the endpoint.
    pub fn resolve(&self, target: &str) -> Result<Url, TransportError> {
        self.endpoint
            .join(target)
            .map_err(|e| TransportError::InvalidUrl {
                target: target.to_string(),
                reason: e.to_string(),
            })
    }

    fn multipart(payload: FormPayload) -> Result<Form, TransportError> {
        payload
            .fields
            .into_iter()
            .try_fold(Form::new(), |form, (name, value)| match value {
                FieldValue::Text(text) => Ok(form.text(name, text)),
                FieldValue::File { file_name, bytes } => {
                    let part = Part::bytes(bytes)
                        .file_name(file_name)
                        .mime_str("text/csv")
                        .map_err(request_error)?;
                    Ok(form.part(name, part))
                }
            })
    }

    async fn settle(resp: reqwest::Response) -> Result<RawResponse, TransportError> {
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(request_error)?;
        Ok(RawResponse { status, body })
    }
}

fn request_error(e: reqwest::Error) -> TransportError {
    TransportError::Request(e.to_string())
}

impl Transport for HttpTransport {
    async fn post_form(&self, payload: FormPayload) -> Result<RawResponse, TransportError> {
        let form = Self::multipart(payload)?;
        tracing::info!(url = %self.endpoint, "POST form");
        let resp = self
            .http
            .post(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await
            .map_err(request_error)?;
        tracing::debug!(status = %resp.status(), "form response");
        Self::settle(resp).await
    }

    async fn get_page(&self, target: &str) -> Result<RawResponse, TransportError> {
        let url = self.resolve(target)?;
        tracing::info!(url = %url, "GET page");
        let resp = self.http.get(url).send().await.map_err(request_error)?;
        Self::settle(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Locale;
    use std::time::Duration;

    fn transport(base: &str) -> HttpTransport {
        HttpTransport::new(&ClientConfig {
            base_url: base.into(),
            user_agent: "test".into(),
            timeout: None,
            locale: Locale::En,
            upload_field: "csv_file".into(),
        })
        .unwrap()
    }

    #[test]
    fn relative_redirects_resolve_against_endpoint() {
        let t = transport("http://127.0.0.1:5000/");
        assert_eq!(
            t.resolve("/results/42").unwrap().as_str(),
            "http://127.0.0.1:5000/results/42"
        );
        assert_eq!(
            t.resolve("https://example.com/r").unwrap().as_str(),
            "https://example.com/r"
        );
    }

    #[test]
    fn bad_base_url_is_rejected() {
        let err = HttpTransport::new(&ClientConfig {
            base_url: "not a url".into(),
            user_agent: "test".into(),
            timeout: Some(Duration::from_secs(1)),
            locale: Locale::En,
            upload_field: "csv_file".into(),
        })
        .unwrap_err();
        assert!(format!("{err:#}").contains("invalid base url"));
    }

    #[test]
    fn multipart_accepts_files_and_text() {
        let payload = FormPayload::default()
            .text("form_type", "upload")
            .file("csv_file", "a.csv", b"x,y\n".to_vec());
        assert!(HttpTransport::multipart(payload).is_ok());
    }
}
