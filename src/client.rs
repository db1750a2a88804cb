//! HTTP analysis client.
//!
//! One `submit` per analysis: POST the multipart payload, measure the
//! wall-clock round trip, parse the response. Transport problems and
//! malformed responses are distinct failure kinds; neither is retried here.

use std::time::Instant;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::debug;

use crate::export;
use crate::model::{AnalysisResponse, ResultSet, RunConfig};
use crate::request::RequestPayload;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The request could not be sent or no usable response arrived:
    /// connection refused, request timeout, interrupted body.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    /// A response arrived but does not match the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

pub struct AnalysisClient {
    http: reqwest::Client,
    endpoint: String,
}

impl AnalysisClient {
    /// The timeout covers the whole round trip; expiry surfaces through the
    /// same `Transport` path as a connection failure.
    pub fn new(cfg: &RunConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.request_timeout)
            .build()
            .context("build HTTP client")?;
        Ok(Self {
            http,
            endpoint: cfg.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Submit one analysis request. `total_secs` on the returned set is the
    /// elapsed time observed here, from just before send to full parse of
    /// the received body.
    pub async fn submit(&self, payload: RequestPayload) -> Result<ResultSet, AnalysisError> {
        debug!(
            fields = payload.field_count(),
            documents = payload.document_count(),
            endpoint = %self.endpoint,
            "submitting analysis request"
        );
        let started = Instant::now();

        let form = payload.into_form()?;
        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AnalysisError::MalformedResponse(format!(
                "unexpected status {status}"
            )));
        }

        let parsed: AnalysisResponse = serde_json::from_str(&body).map_err(|e| {
            AnalysisError::MalformedResponse(format!("undecodable body: {e}"))
        })?;
        let export_text = export::decode_csv_field(&parsed.csv)
            .map_err(|e| AnalysisError::MalformedResponse(format!("csv field: {e:#}")))?;

        let total = started.elapsed();
        debug!(
            documents = parsed.results.len(),
            classification_secs = parsed.classification_duration,
            total_secs = total.as_secs_f64(),
            "analysis response received"
        );
        Ok(ResultSet::from_response(parsed, export_text, total))
    }
}
