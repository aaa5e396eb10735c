use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{BatchLimits, TranslationBackend, base_url, check_status};
use crate::app_config::BackendConfig;
use crate::errors::ProviderError;

/// Google Cloud Translation (v2, API key auth)
#[derive(Debug, Clone)]
pub struct GoogleTranslate {
    endpoint: String,
    api_key: String,
    limits: BatchLimits,
    client: Client,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a [String],
    source: &'a str,
    target: &'a str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct Translation {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

#[derive(Debug, Deserialize)]
struct TranslationList {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslationList,
}

impl GoogleTranslate {
    pub fn new(config: &BackendConfig, client: Client) -> Self {
        Self {
            endpoint: base_url(&config.endpoint),
            api_key: config.api_key.clone(),
            limits: BatchLimits::from_config(config),
            client,
        }
    }

    pub fn parse_response(body: &str) -> Result<Vec<String>, ProviderError> {
        let response: TranslateResponse =
            serde_json::from_str(body).map_err(|e| ProviderError::ParseError(e.to_string()))?;
        Ok(response
            .data
            .translations
            .into_iter()
            .map(|t| t.translated_text)
            .collect())
    }

    fn require_key(&self) -> Result<&str, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::AuthenticationError(
                "Google Translate requires an API key".to_string(),
            ));
        }
        Ok(&self.api_key)
    }
}

#[async_trait]
impl TranslationBackend for GoogleTranslate {
    fn name(&self) -> &str {
        "google"
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
        let key = self.require_key()?;
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = TranslateRequest {
            q: texts,
            source: source_language,
            target: target_language,
            format: "text",
        };

        debug!("Google: {} lines {} -> {}", texts.len(), source_language, target_language);
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", key)])
            .json(&request)
            .send()
            .await?;
        let body = check_status(response).await?.text().await?;

        Self::parse_response(&body)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let key = self.require_key()?;
        let response = self
            .client
            .get(format!("{}/languages", self.endpoint))
            .query(&[("key", key)])
            .send()
            .await?;
        check_status(response).await.map(|_| ())
    }
}
