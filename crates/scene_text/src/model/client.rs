//! Model client for scene text inference using the Gemini API

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::request::{mime_type_for_path, GenerateContentRequest, RequestBuilder, DEFAULT_TOP_P};
use super::response::{GenerateContentResponse, TextResponse};
use crate::batch::BatchDispatcher;
use crate::config::{default_templates, is_supported_model, SCENE_TEXT_PROMPT};
use crate::error::{Result, SceneTextError};
use crate::scene::{DescriptionTemplates, PredictionResult, SceneTexts};

/// Default API endpoint root
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model name
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable overriding the model name
pub const MODEL_ENV: &str = "GEMINI_MODEL";

/// Environment variable overriding the endpoint root
pub const BASE_URL_ENV: &str = "GEMINI_BASE_URL";

/// Configuration for the Gemini model
#[derive(Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub base_url: String,
    #[serde(default, skip_serializing)]
    pub api_key: String,
    pub model_name: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub prompt: String,
    /// Overrides the MIME label derived from the file extension
    pub mime_type: Option<String>,
    /// Timeout for a single HTTP request
    pub request_timeout: Option<Duration>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            model_name: DEFAULT_MODEL.to_string(),
            max_tokens: 4096,
            temperature: 1e-4,
            top_p: DEFAULT_TOP_P,
            prompt: SCENE_TEXT_PROMPT.to_string(),
            mime_type: None,
            request_timeout: None,
        }
    }
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model_name", &self.model_name)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("prompt", &self.prompt)
            .field("mime_type", &self.mime_type)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl ModelConfig {
    /// Create a new ModelConfig with custom settings
    pub fn new(api_key: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model_name: model_name.into(),
            ..Default::default()
        }
    }

    /// Build a config from `GEMINI_API_KEY`, `GEMINI_MODEL` and `GEMINI_BASE_URL`
    pub fn from_env() -> Result<Self> {
        let api_key = env::var(API_KEY_ENV)
            .map_err(|_| SceneTextError::Config(format!("{} is not set", API_KEY_ENV)))?;

        let mut config = Self::new(api_key, DEFAULT_MODEL);
        if let Ok(model_name) = env::var(MODEL_ENV) {
            config.model_name = model_name;
        }
        if let Ok(base_url) = env::var(BASE_URL_ENV) {
            config.base_url = base_url;
        }
        Ok(config)
    }

    /// Set the endpoint root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the maximum number of output tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    /// Set the prompt sent with every image
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Check the config before any request is made
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(SceneTextError::Config(format!(
                "API key is empty (set {})",
                API_KEY_ENV
            )));
        }
        if !is_supported_model(&self.model_name) {
            return Err(SceneTextError::UnsupportedModel(self.model_name.clone()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(SceneTextError::Config(format!(
                "base URL must start with http:// or https://, got {:?}",
                self.base_url
            )));
        }
        if self.max_tokens == 0 {
            return Err(SceneTextError::Config("max_tokens must be positive".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(SceneTextError::Config(format!(
                "temperature must be within [0, 2], got {}",
                self.temperature
            )));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(SceneTextError::Config(format!(
                "top_p must be within (0, 1], got {}",
                self.top_p
            )));
        }
        Ok(())
    }

    /// URL of the `generateContent` endpoint, without the key
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model_name
        )
    }
}

/// Client for the Gemini multimodal API
#[derive(Debug, Clone)]
pub struct ModelClient {
    config: ModelConfig,
    templates: DescriptionTemplates,
    client: reqwest::Client,
}

impl ModelClient {
    /// Create a new ModelClient, validating the config eagerly
    pub fn new(config: ModelConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            config,
            templates: default_templates(),
            client,
        })
    }

    /// Replace the description templates
    pub fn with_templates(mut self, templates: DescriptionTemplates) -> Self {
        self.templates = templates;
        self
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn templates(&self) -> &DescriptionTemplates {
        &self.templates
    }

    /// Send a request and decode the raw response
    pub async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let start_time = Instant::now();

        let response = self
            .client
            .post(self.config.endpoint())
            .query(&[("key", self.config.api_key.as_str())])
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(redact_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(redact_transport)?;
        debug!(
            "generateContent returned {} in {:.3}s ({} bytes)",
            status,
            start_time.elapsed().as_secs_f64(),
            body.len()
        );

        if !status.is_success() {
            return Err(SceneTextError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Send a text-only prompt
    pub async fn generate_text(&self, prompt: &str) -> Result<TextResponse> {
        let request = RequestBuilder::build(
            prompt,
            None,
            self.config.max_tokens,
            self.config.temperature,
            self.config.top_p,
        );
        TextResponse::try_from(self.generate(&request).await?)
    }

    /// Test connection to the model API by sending a simple request
    pub async fn test_connection(&self) -> Result<()> {
        let request = RequestBuilder::build("Hi", None, 5, 0.0, self.config.top_p);
        let response = self.generate(&request).await?;

        if response.candidates.is_empty() {
            return Err(SceneTextError::MissingField("candidates"));
        }

        Ok(())
    }

    /// Describe the scene text in an image
    pub async fn predict(&self, image: &[u8], mime_type: &str) -> Result<PredictionResult> {
        let request = RequestBuilder::build(
            &self.config.prompt,
            Some((image, mime_type)),
            self.config.max_tokens,
            self.config.temperature,
            self.config.top_p,
        );
        let response = self.generate(&request).await?;

        let scene_texts = SceneTexts::from_model_output(response.first_text()?)?;
        let usage = response.usage()?.clone();
        PredictionResult::from_scene_texts(scene_texts, usage, &self.templates)
    }

    /// Describe the scene text in an image file
    pub async fn predict_file(&self, path: impl AsRef<Path>) -> Result<PredictionResult> {
        let path = path.as_ref();
        let image = tokio::fs::read(path).await?;
        let mime_type = self
            .config
            .mime_type
            .as_deref()
            .unwrap_or_else(|| mime_type_for_path(path));

        debug!(
            "Predicting {} ({}, {} bytes)",
            path.display(),
            mime_type,
            image.len()
        );
        self.predict(&image, mime_type).await
    }

    /// Like `predict`, but any failure yields `PredictionResult::empty()`
    pub async fn predict_or_empty(&self, image: &[u8], mime_type: &str) -> PredictionResult {
        self.predict(image, mime_type)
            .await
            .unwrap_or_else(|e| fallback("image", e))
    }

    /// Like `predict_file`, but any failure yields `PredictionResult::empty()`
    pub async fn predict_file_or_empty(&self, path: impl AsRef<Path>) -> PredictionResult {
        let path = path.as_ref();
        self.predict_file(path)
            .await
            .unwrap_or_else(|e| fallback(&path.display().to_string(), e))
    }

    /// Predict a batch of image files, one typed result per input, in input order
    pub async fn batch_predict<P: AsRef<Path>>(
        &self,
        paths: &[P],
        dispatcher: &BatchDispatcher,
    ) -> Vec<Result<PredictionResult>> {
        let start_time = Instant::now();
        info!(
            "Predicting {} images with concurrency {}",
            paths.len(),
            dispatcher.concurrency()
        );

        let results = dispatcher
            .run(paths.iter(), |path| self.predict_file(path))
            .await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(
            "Batch finished in {:.3}s ({} ok, {} failed)",
            start_time.elapsed().as_secs_f64(),
            results.len() - failed,
            failed
        );
        results
    }

    /// Predict a batch, replacing each failed slot with `PredictionResult::empty()`
    pub async fn batch_predict_or_empty<P: AsRef<Path>>(
        &self,
        paths: &[P],
        dispatcher: &BatchDispatcher,
    ) -> Vec<PredictionResult> {
        self.batch_predict(paths, dispatcher)
            .await
            .into_iter()
            .zip(paths)
            .map(|(result, path)| {
                result.unwrap_or_else(|e| fallback(&path.as_ref().display().to_string(), e))
            })
            .collect()
    }
}

/// Drop the request URL from transport errors; its query carries the API key
fn redact_transport(error: reqwest::Error) -> SceneTextError {
    SceneTextError::Transport(error.without_url())
}

fn fallback(source: &str, error: SceneTextError) -> PredictionResult {
    warn!("Prediction failed for {}: {}", source, error);
    PredictionResult::empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_config_default() {
        let config = ModelConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model_name, "gemini-1.5-pro");
        assert_eq!(config.max_tokens, 4096);
        assert_eq!(config.top_p, 0.95);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn test_model_config_builder() {
        let config = ModelConfig::new("test-key", "gemini-1.5-flash")
            .with_base_url("http://localhost:9000/v1beta/")
            .with_max_tokens(256)
            .with_temperature(0.3)
            .with_prompt("read the signs")
            .with_mime_type("image/jpeg");

        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.max_tokens, 256);
        assert_eq!(config.prompt, "read the signs");
        assert_eq!(config.mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(
            config.endpoint(),
            "http://localhost:9000/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_validate_accepts_default_with_key() {
        assert!(ModelConfig::new("key", DEFAULT_MODEL).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_key() {
        let err = ModelConfig::new("  ", DEFAULT_MODEL).validate().unwrap_err();
        assert!(matches!(err, SceneTextError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_unsupported_model() {
        let err = ModelConfig::new("key", "gpt-4o-mini").validate().unwrap_err();
        assert!(matches!(err, SceneTextError::UnsupportedModel(ref m) if m == "gpt-4o-mini"));
    }

    #[test]
    fn test_validate_rejects_bad_sampling() {
        let base = ModelConfig::new("key", DEFAULT_MODEL);
        assert!(base.clone().with_max_tokens(0).validate().is_err());
        assert!(base.clone().with_temperature(-0.1).validate().is_err());
        assert!(base.clone().with_temperature(2.5).validate().is_err());
        assert!(base.clone().with_top_p(0.0).validate().is_err());
        assert!(base.clone().with_top_p(1.5).validate().is_err());
        assert!(base.with_base_url("localhost:8000").validate().is_err());
    }

    #[test]
    fn test_model_config_hides_api_key() {
        let config = ModelConfig::new("SECRET-KEY-123", DEFAULT_MODEL);

        let debug = format!("{:?}", config);
        assert!(!debug.contains("SECRET-KEY-123"));
        assert!(debug.contains("<redacted>"));

        let client = ModelClient::new(config.clone()).unwrap();
        assert!(!format!("{:?}", client).contains("SECRET-KEY-123"));

        let value = serde_json::to_value(&config).unwrap();
        assert!(value.get("api_key").is_none());
        assert!(!value.to_string().contains("SECRET-KEY-123"));
    }

    #[test]
    fn test_model_config_deserializes_without_api_key() {
        let config: ModelConfig =
            serde_json::from_value(serde_json::to_value(ModelConfig::default()).unwrap()).unwrap();
        assert!(config.api_key.is_empty());
        assert_eq!(config.model_name, DEFAULT_MODEL);
    }

    #[test]
    fn test_client_new_validates() {
        assert!(ModelClient::new(ModelConfig::default()).is_err());
        assert!(ModelClient::new(ModelConfig::new("key", DEFAULT_MODEL)).is_ok());
    }
}
