//! Translation service client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{build_client, endpoint, millis};
use crate::config::TranslationConfig;
use crate::error::{FactCheckError, TranslationError};
use crate::translation::{ItemResult, Translator};

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    texts: &'a [String],
}

#[derive(Debug, Deserialize)]
struct WireTranslation {
    #[serde(default)]
    english: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireTranslateResponse {
    #[serde(default)]
    translations: Vec<WireTranslation>,
}

/// Decode a `translate_batch` response into per-item outcomes.
///
/// A missing or blank `english` field marks that item as failed.
///
/// # Errors
///
/// Returns [`TranslationError::Malformed`] if the body is not a valid
/// response.
pub fn parse_translate_response(body: &str) -> Result<Vec<ItemResult>, TranslationError> {
    let response: WireTranslateResponse =
        serde_json::from_str(body).map_err(|e| TranslationError::Malformed(e.to_string()))?;

    Ok(response
        .translations
        .into_iter()
        .enumerate()
        .map(|(index, t)| match t.english {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(TranslationError::MissingItem(index)),
        })
        .collect())
}

/// Translator backed by the batch translation service.
#[derive(Debug, Clone)]
pub struct HttpTranslator {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpTranslator {
    /// Create a client for the service at `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &TranslationConfig) -> Result<Self, FactCheckError> {
        Ok(Self {
            client: build_client(config.timeout())?,
            url: endpoint(&config.base_url, "translate_batch"),
            timeout: config.timeout(),
        })
    }

    fn map_error(&self, e: &reqwest::Error) -> TranslationError {
        if e.is_timeout() {
            TranslationError::Timeout(millis(self.timeout))
        } else {
            TranslationError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate_batch(&self, texts: &[String]) -> Result<Vec<ItemResult>, TranslationError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(&self.url)
            .json(&TranslateRequest { texts })
            .send()
            .await
            .map_err(|e| self.map_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::Status(status.as_u16()));
        }
        let body = response.text().await.map_err(|e| self.map_error(&e))?;
        parse_translate_response(&body)
    }

    fn name(&self) -> &str {
        "translation-service"
    }
}
