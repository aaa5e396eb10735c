use async_trait::async_trait;
use log::{debug, error};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{BatchLimits, TranslationBackend, base_url, check_status};
use crate::app_config::BackendConfig;
use crate::errors::ProviderError;
use crate::language_utils;

/// Marker closing the entry list in prompts and replies
pub const END_MARKER: &str = "<<END>>";

static ENTRY_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"<<ENTRY_(\d+)>>").unwrap());

/// Ollama client
#[derive(Debug, Clone)]
pub struct Ollama {
    /// Base URL of the Ollama API
    endpoint: String,
    /// Model name to use for generation
    model: String,
    limits: BatchLimits,
    client: Client,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: String,
    system: &'static str,
    stream: bool,
    options: GenerationOptions,
}

#[derive(Debug, Serialize)]
struct GenerationOptions {
    temperature: f32,
}

/// Generation response from the Ollama API
#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

const SYSTEM_PROMPT: &str = "You are a subtitle translator. You translate every entry you are given \
and keep the entry markers exactly as they appear. You never merge, split, skip or comment on entries.";

impl Ollama {
    pub fn new(config: &BackendConfig, client: Client) -> Self {
        Self {
            endpoint: base_url(&config.endpoint),
            model: config.model.clone(),
            limits: BatchLimits::from_config(config),
            client,
        }
    }

    /// Build the marker-delimited prompt for a batch
    pub fn build_prompt(texts: &[String], source_language: &str, target_language: &str) -> String {
        let language_name = |code: &str| language_utils::get_language_name(code).unwrap_or_else(|_| code.to_string());

        let mut prompt = format!(
            "Translate the following subtitle entries from {} to {}.\n\
             Keep each <<ENTRY_n>> marker on its own line, put the translation of that entry after it \
             and finish the reply with {}.\n\n",
            language_name(source_language),
            language_name(target_language),
            END_MARKER
        );
        for (i, text) in texts.iter().enumerate() {
            prompt.push_str(&format!("<<ENTRY_{}>>\n{}\n", i, text));
        }
        prompt.push_str(END_MARKER);
        prompt
    }

    /// Split a marker-delimited reply back into `expected` lines
    pub fn parse_reply(reply: &str, expected: usize) -> Result<Vec<String>, ProviderError> {
        let end = reply
            .rfind(END_MARKER)
            .ok_or_else(|| ProviderError::ParseError("reply has no end marker".to_string()))?;
        let body = &reply[..end];

        let markers: Vec<(usize, usize, usize)> = ENTRY_MARKER
            .captures_iter(body)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let index = caps.get(1)?.as_str().parse().ok()?;
                Some((index, whole.start(), whole.end()))
            })
            .collect();

        let mut lines: Vec<Option<String>> = vec![None; expected];
        for (pos, (index, _, text_start)) in markers.iter().enumerate() {
            let text_end = markers.get(pos + 1).map(|(_, start, _)| *start).unwrap_or(body.len());
            let slot = lines.get_mut(*index).ok_or(ProviderError::MisalignedBatch {
                expected,
                actual: markers.len(),
            })?;
            if slot.is_some() {
                return Err(ProviderError::ParseError(format!("duplicate marker <<ENTRY_{}>>", index)));
            }
            *slot = Some(body[*text_start..text_end].trim().to_string());
        }

        lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| line.ok_or_else(|| ProviderError::ParseError(format!("missing marker <<ENTRY_{}>>", i))))
            .collect()
    }

    /// Read a generate response, tolerating a streamed (JSON lines) body
    fn response_text(body: &str) -> Result<String, ProviderError> {
        if let Ok(response) = serde_json::from_str::<GenerationResponse>(body) {
            return Ok(response.response);
        }

        let pieces: Vec<GenerationResponse> = body
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect();
        if pieces.is_empty() || !pieces.iter().any(|p| p.done) {
            error!(
                "Failed to parse Ollama API response. Raw response (first 500 chars): {}",
                body.chars().take(500).collect::<String>()
            );
            return Err(ProviderError::ParseError("unreadable Ollama response".to_string()));
        }
        Ok(pieces.into_iter().map(|p| p.response).collect())
    }
}

#[async_trait]
impl TranslationBackend for Ollama {
    fn name(&self) -> &str {
        "ollama"
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

        let request = GenerationRequest {
            model: &self.model,
            prompt: Self::build_prompt(texts, source_language, target_language),
            system: SYSTEM_PROMPT,
            stream: false,
            options: GenerationOptions { temperature: 0.1 },
        };

        debug!("Ollama ({}): {} lines {} -> {}", self.model, texts.len(), source_language, target_language);
        let response = self
            .client
            .post(format!("{}/api/generate", self.endpoint))
            .json(&request)
            .send()
            .await?;
        let body = check_status(response).await?.text().await?;

        Self::parse_reply(&Self::response_text(&body)?, texts.len())
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let response = self.client.get(format!("{}/api/version", self.endpoint)).send().await?;
        check_status(response).await.map(|_| ())
    }
}
