use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::{BatchLimits, TranslationBackend, base_url, check_status};
use crate::app_config::BackendConfig;
use crate::errors::ProviderError;

/// Text MyMemory puts in `translatedText` once the daily quota is used up
const QUOTA_WARNING: &str = "MYMEMORY WARNING";

/// MyMemory client
///
/// The API takes one segment per request, so a batch is sent line by line.
#[derive(Debug, Clone)]
pub struct MyMemory {
    endpoint: String,
    email: Option<String>,
    limits: BatchLimits,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    #[serde(rename = "responseData")]
    response_data: Option<ResponseData>,
    // Number on success, sometimes a string on errors
    #[serde(rename = "responseStatus", default)]
    response_status: Value,
    #[serde(rename = "responseDetails", default)]
    response_details: Value,
    #[serde(rename = "quotaFinished", default)]
    quota_finished: Option<bool>,
}

impl MyMemory {
    pub fn new(config: &BackendConfig, client: Client) -> Self {
        Self {
            endpoint: base_url(&config.endpoint),
            email: Some(config.email.clone()).filter(|e| !e.is_empty()),
            limits: BatchLimits::from_config(config),
            client,
        }
    }

    /// Decode a `/get` response body into the translated segment
    pub fn parse_response(body: &str) -> Result<String, ProviderError> {
        let response: GetResponse =
            serde_json::from_str(body).map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let status = match &response.response_status {
            Value::Number(n) => n.as_u64().unwrap_or(0),
            Value::String(s) => s.parse().unwrap_or(0),
            _ => 200,
        };
        let details = match &response.response_details {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };

        if response.quota_finished == Some(true) || status == 429 {
            return Err(ProviderError::RateLimitExceeded(details));
        }
        if status != 200 {
            return Err(ProviderError::ApiError {
                status_code: u16::try_from(status).unwrap_or(0),
                message: details,
            });
        }

        let text = response
            .response_data
            .map(|d| d.translated_text)
            .ok_or_else(|| ProviderError::ParseError("missing responseData".to_string()))?;
        if text.starts_with(QUOTA_WARNING) {
            return Err(ProviderError::RateLimitExceeded(text));
        }
        Ok(text)
    }

    async fn translate_one(&self, text: &str, langpair: &str) -> Result<String, ProviderError> {
        let mut query: Vec<(&str, &str)> = vec![("q", text), ("langpair", langpair)];
        if let Some(email) = &self.email {
            query.push(("de", email.as_str()));
        }

        let response = self
            .client
            .get(format!("{}/get", self.endpoint))
            .query(&query)
            .send()
            .await?;
        let body = check_status(response).await?.text().await?;
        Self::parse_response(&body)
    }
}

#[async_trait]
impl TranslationBackend for MyMemory {
    fn name(&self) -> &str {
        "mymemory"
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
        let langpair = format!("{}|{}", source_language, target_language);
        debug!("MyMemory: {} lines {}", texts.len(), langpair);

        let mut translated = Vec::with_capacity(texts.len());
        for text in texts {
            if text.trim().is_empty() {
                translated.push(text.clone());
                continue;
            }
            match self.translate_one(text, &langpair).await {
                Ok(line) => translated.push(line),
                Err(e) => {
                    warn!("MyMemory failed after {}/{} lines: {}", translated.len(), texts.len(), e);
                    return Err(e);
                }
            }
        }
        Ok(translated)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.translate_one("hello", "en|es").await.map(|_| ())
    }
}
