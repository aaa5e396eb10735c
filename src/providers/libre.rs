use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{BatchLimits, TranslationBackend, base_url, check_status};
use crate::app_config::BackendConfig;
use crate::errors::ProviderError;

/// LibreTranslate client
#[derive(Debug, Clone)]
pub struct LibreTranslate {
    endpoint: String,
    api_key: Option<String>,
    limits: BatchLimits,
    client: Client,
}

/// Request body for `POST /translate`
#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a [String],
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

/// `translatedText` is a list when `q` was a list, a string otherwise
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TranslatedText {
    Many(Vec<String>),
    One(String),
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: Option<TranslatedText>,
    error: Option<String>,
}

impl LibreTranslate {
    pub fn new(config: &BackendConfig, client: Client) -> Self {
        Self {
            endpoint: base_url(&config.endpoint),
            api_key: Some(config.api_key.clone()).filter(|k| !k.is_empty()),
            limits: BatchLimits::from_config(config),
            client,
        }
    }

    /// Decode a `/translate` response body
    pub fn parse_response(body: &str) -> Result<Vec<String>, ProviderError> {
        let response: TranslateResponse =
            serde_json::from_str(body).map_err(|e| ProviderError::ParseError(e.to_string()))?;

        if let Some(error) = response.error {
            return Err(ProviderError::ApiError {
                status_code: 200,
                message: error,
            });
        }

        match response.translated_text {
            Some(TranslatedText::Many(lines)) => Ok(lines),
            Some(TranslatedText::One(line)) => Ok(vec![line]),
            None => Err(ProviderError::ParseError("missing translatedText".to_string())),
        }
    }
}

#[async_trait]
impl TranslationBackend for LibreTranslate {
    fn name(&self) -> &str {
        "libretranslate"
    }

    fn limits(&self) -> BatchLimits {
        self.limits
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = TranslateRequest {
            q: texts,
            source: source_language,
            target: target_language,
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        debug!("LibreTranslate: {} lines {} -> {}", texts.len(), source_language, target_language);
        let response = self
            .client
            .post(format!("{}/translate", self.endpoint))
            .json(&request)
            .send()
            .await?;
        let body = check_status(response).await?.text().await?;

        Self::parse_response(&body)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let response = self.client.get(format!("{}/languages", self.endpoint)).send().await?;
        check_status(response).await.map(|_| ())
    }
}
