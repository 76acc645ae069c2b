//! Event classifier HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use tracing::debug;

use vwatch_media::CapturedFrame;
use vwatch_models::{DetectionEvent, KeyMoment};

use crate::error::{ClassifierError, ClassifierResult};
use crate::types::{strip_code_fence, ClassifyRequest, ClassifyResponse, SummaryRequest, SummaryResponse};

/// Turns one captured frame into zero or more detection events.
#[async_trait]
pub trait EventClassifier: Send + Sync {
    async fn classify(&self, frame: &CapturedFrame) -> ClassifierResult<Vec<DetectionEvent>>;
}

/// Produces a prose summary of saved key moments.
#[async_trait]
pub trait MomentSummarizer: Send + Sync {
    async fn summarize(&self, moments: &[KeyMoment]) -> ClassifierResult<String>;
}

/// Configuration for the classifier client.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Base URL of the classification service
    pub base_url: String,
    /// Optional bearer token
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            api_key: None,
            timeout: Duration::from_secs(60),
        }
    }
}

impl ClassifierConfig {
    /// Create config from environment variables. `CLASSIFIER_URL` is required.
    pub fn from_env() -> ClassifierResult<Self> {
        let base_url = std::env::var("CLASSIFIER_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ClassifierError::Config("CLASSIFIER_URL not set".to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: std::env::var("CLASSIFIER_API_KEY")
                .ok()
                .filter(|s| !s.is_empty()),
            timeout: Duration::from_secs(
                std::env::var("CLASSIFIER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
        })
    }
}

/// Client for the external classification service.
#[derive(Debug, Clone)]
pub struct HttpEventClassifier {
    http: Client,
    config: ClassifierConfig,
}

impl HttpEventClassifier {
    /// Create a new classifier client.
    pub fn new(config: ClassifierConfig) -> ClassifierResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClassifierError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClassifierResult<Self> {
        Self::new(ClassifierConfig::from_env()?)
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    fn post(&self, endpoint: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint);
        debug!("Sending classifier request to {}", url);
        let request = self.http.post(url);
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> ClassifierResult<String> {
        let response: Response = request.send().await.map_err(|e| self.map_network(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_network(e))?;
        if !status.is_success() {
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    fn map_network(&self, e: reqwest::Error) -> ClassifierError {
        if e.is_timeout() {
            ClassifierError::Timeout(self.config.timeout)
        } else {
            ClassifierError::Network(e)
        }
    }
}

/// Parse a classify response body, tolerating a Markdown code fence.
pub fn parse_events(body: &str) -> ClassifierResult<Vec<DetectionEvent>> {
    let parsed: ClassifyResponse = serde_json::from_str(strip_code_fence(body))
        .map_err(|e| ClassifierError::Malformed(e.to_string()))?;
    Ok(parsed.events)
}

#[async_trait]
impl EventClassifier for HttpEventClassifier {
    async fn classify(&self, frame: &CapturedFrame) -> ClassifierResult<Vec<DetectionEvent>> {
        let request = ClassifyRequest {
            image: frame.to_data_url(),
            offset_seconds: frame.offset.seconds(),
        };
        let body = self.send(self.post("classify").json(&request)).await?;
        let events = parse_events(&body)?;
        debug!(offset = frame.offset.seconds(), events = events.len(), "Frame classified");
        Ok(events)
    }
}

#[async_trait]
impl MomentSummarizer for HttpEventClassifier {
    async fn summarize(&self, moments: &[KeyMoment]) -> ClassifierResult<String> {
        let request = SummaryRequest {
            key_moments: moments.to_vec(),
        };
        let body = self.send(self.post("summary").json(&request)).await?;
        let reply: SummaryResponse = serde_json::from_str(strip_code_fence(&body))
            .map_err(|e| ClassifierError::Malformed(e.to_string()))?;

        match reply {
            SummaryResponse { error: Some(error), .. } => Err(ClassifierError::Rejected(error)),
            SummaryResponse { summary: Some(summary), .. } => Ok(summary),
            _ => Err(ClassifierError::Malformed("summary missing".to_string())),
        }
    }
}
