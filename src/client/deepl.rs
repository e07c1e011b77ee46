use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{Formality, SplitSentences, TagHandling};
use crate::error::{Result, TranslatorError};

use super::{TranslateOptions, Translation, TranslationClient};

const PRO_SERVER_URL: &str = "https://api.deepl.com";
const FREE_SERVER_URL: &str = "https://api-free.deepl.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// Backoff schedule for retried requests
const BACKOFF_INITIAL_SECS: f64 = 1.0;
const BACKOFF_MULTIPLIER: f64 = 1.6;
const BACKOFF_MAX_SECS: f64 = 120.0;

/// HTTP client for the DeepL translation API.
///
/// Free-tier auth keys (suffix `:fx`) are routed to the free API server.
/// Failed requests are retried up to `max_retries` times with capped
/// exponential backoff; only transport faults, 429 and 5xx responses are
/// retried.
pub struct DeepLClient {
    http: Client,
    auth_key: String,
    server_url: String,
    max_retries: u32,
}

impl DeepLClient {
    pub fn new(auth_key: impl Into<String>, max_retries: u32) -> Result<Self> {
        let auth_key = auth_key.into();
        if auth_key.trim().is_empty() {
            return Err(TranslatorError::Config(
                "DeepL auth key cannot be empty".to_string(),
            ));
        }

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(TranslatorError::Http)?;

        let server_url = if Self::is_free_account_key(&auth_key) {
            FREE_SERVER_URL
        } else {
            PRO_SERVER_URL
        };

        Ok(Self {
            http,
            auth_key,
            server_url: server_url.to_string(),
            max_retries,
        })
    }

    /// Point the client at a different server, e.g. a local test stub.
    #[must_use]
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Free-tier keys carry the `:fx` suffix.
    fn is_free_account_key(auth_key: &str) -> bool {
        auth_key.ends_with(":fx")
    }

    async fn send(&self, request: &TranslateTextRequest<'_>) -> Result<Vec<Translation>> {
        let url = format!("{}/v2/translate", self.server_url);
        debug!("sending translation request to {}", url);

        let response = self
            .http
            .post(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("DeepL-Auth-Key {}", self.auth_key),
            )
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|err| err.message)
                .unwrap_or(body);
            return Err(error_for_status(status.as_u16(), message));
        }

        let body: TranslateTextResponse = response.json().await?;
        Ok(body
            .translations
            .into_iter()
            .map(|payload| Translation {
                text: payload.text,
                detected_source_lang: payload.detected_source_language,
            })
            .collect())
    }
}

#[async_trait]
impl TranslationClient for DeepLClient {
    async fn translate(
        &self,
        texts: &[String],
        target_lang: &str,
        options: &TranslateOptions,
    ) -> Result<Vec<Translation>> {
        let request = TranslateTextRequest::new(texts, target_lang, options);

        let mut attempt = 0;
        loop {
            match self.send(&request).await {
                Ok(translations) => return Ok(translations),
                Err(err) if attempt < self.max_retries && is_retryable(&err) => {
                    let delay = backoff_delay(attempt);
                    debug!("translation request failed, retrying in {:?}: {}", delay, err);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn error_for_status(status: u16, message: String) -> TranslatorError {
    match status {
        401 | 403 => TranslatorError::Auth(message),
        429 => TranslatorError::TooManyRequests(message),
        456 => TranslatorError::QuotaExceeded(message),
        _ => TranslatorError::Api { status, message },
    }
}

fn is_retryable(err: &TranslatorError) -> bool {
    match err {
        TranslatorError::Http(err) => err.is_timeout() || err.is_connect(),
        TranslatorError::TooManyRequests(_) => true,
        TranslatorError::Api { status, .. } => *status >= 500,
        _ => false,
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    let secs = (BACKOFF_INITIAL_SECS * BACKOFF_MULTIPLIER.powi(attempt as i32)).min(BACKOFF_MAX_SECS);
    Duration::from_secs_f64(secs)
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_true(value: &bool) -> bool {
    *value
}

/// Request body for `POST /v2/translate`.
///
/// Optional parameters are omitted at their server-side defaults.
#[derive(Debug, Serialize)]
struct TranslateTextRequest<'a> {
    text: &'a [String],
    target_lang: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_lang: Option<&'a str>,
    #[serde(skip_serializing_if = "Formality::is_default")]
    formality: Formality,
    #[serde(skip_serializing_if = "is_false")]
    preserve_formatting: bool,
    #[serde(skip_serializing_if = "SplitSentences::is_default")]
    split_sentences: SplitSentences,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    glossary_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag_handling: Option<TagHandling>,
    #[serde(skip_serializing_if = "is_true")]
    outline_detection: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    non_splitting_tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    splitting_tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ignore_tags: Option<String>,
}

impl<'a> TranslateTextRequest<'a> {
    fn new(texts: &'a [String], target_lang: &'a str, options: &'a TranslateOptions) -> Self {
        Self {
            text: texts,
            target_lang,
            source_lang: options.source_lang.as_deref(),
            formality: options.formality,
            preserve_formatting: options.preserve_formatting,
            split_sentences: options.split_sentences,
            context: options.context.as_deref(),
            glossary_id: options.glossary.as_deref(),
            tag_handling: options.tag_handling,
            outline_detection: options.outline_detection,
            non_splitting_tags: options.non_splitting_tags.as_ref().map(|tags| tags.to_csv()),
            splitting_tags: options.splitting_tags.as_ref().map(|tags| tags.to_csv()),
            ignore_tags: options.ignore_tags.as_ref().map(|tags| tags.to_csv()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TranslateTextResponse {
    translations: Vec<TranslationPayload>,
}

#[derive(Debug, Deserialize)]
struct TranslationPayload {
    #[serde(default)]
    detected_source_language: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranslationConfig;
    use serde_json::json;

    #[test]
    fn test_server_selection_by_key_suffix() {
        let free = DeepLClient::new("0123:fx", 5).unwrap();
        assert_eq!(free.server_url(), FREE_SERVER_URL);

        let pro = DeepLClient::new("0123", 5).unwrap();
        assert_eq!(pro.server_url(), PRO_SERVER_URL);
    }

    #[test]
    fn test_empty_auth_key_rejected() {
        assert!(matches!(
            DeepLClient::new("  ", 5),
            Err(TranslatorError::Config(_))
        ));
    }

    #[test]
    fn test_minimal_request_omits_defaults() {
        let texts = vec!["Hello".to_string()];
        let options = TranslateOptions::default();
        let request = TranslateTextRequest::new(&texts, "ES", &options);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({"text": ["Hello"], "target_lang": "ES"}));
    }

    #[test]
    fn test_full_request_carries_every_option() {
        let texts = vec!["Hello".to_string()];
        let config = TranslationConfig::default()
            .with_formality(Formality::More)
            .with_preserve_formatting(true)
            .with_split_sentences(SplitSentences::NoNewlines)
            .with_context("greeting")
            .with_glossary("glossary-id")
            .with_tag_handling(TagHandling::Xml)
            .with_outline_detection(false)
            .with_non_splitting_tags(vec!["p", "span"])
            .with_splitting_tags("br")
            .with_ignore_tags("code");
        let options = TranslateOptions::from_config(&config, Some("DE"));
        let request = TranslateTextRequest::new(&texts, "ES", &options);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "text": ["Hello"],
                "target_lang": "ES",
                "source_lang": "DE",
                "formality": "more",
                "preserve_formatting": true,
                "split_sentences": "nonewlines",
                "context": "greeting",
                "glossary_id": "glossary-id",
                "tag_handling": "xml",
                "outline_detection": false,
                "non_splitting_tags": "p,span",
                "splitting_tags": "br",
                "ignore_tags": "code",
            })
        );
    }

    #[test]
    fn test_error_for_status_mapping() {
        assert!(matches!(
            error_for_status(403, String::new()),
            TranslatorError::Auth(_)
        ));
        assert!(matches!(
            error_for_status(429, String::new()),
            TranslatorError::TooManyRequests(_)
        ));
        assert!(matches!(
            error_for_status(456, String::new()),
            TranslatorError::QuotaExceeded(_)
        ));
        assert!(matches!(
            error_for_status(503, String::new()),
            TranslatorError::Api { status: 503, .. }
        ));
    }

    #[test]
    fn test_retryable_errors() {
        assert!(is_retryable(&TranslatorError::TooManyRequests(String::new())));
        assert!(is_retryable(&TranslatorError::Api {
            status: 500,
            message: String::new(),
        }));
        assert!(!is_retryable(&TranslatorError::Auth(String::new())));
        assert!(!is_retryable(&TranslatorError::Api {
            status: 400,
            message: String::new(),
        }));
    }

    #[test]
    fn test_backoff_delay_grows_and_caps() {
        assert_eq!(backoff_delay(0), Duration::from_secs_f64(1.0));
        assert!(backoff_delay(1) > backoff_delay(0));
        assert_eq!(backoff_delay(60), Duration::from_secs_f64(BACKOFF_MAX_SECS));
    }

    #[test]
    fn test_response_parsing() {
        let body = json!({
            "translations": [
                {"detected_source_language": "EN", "text": "Hola"},
                {"detected_source_language": "EN", "text": "Mundo"}
            ]
        });
        let parsed: TranslateTextResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.translations.len(), 2);
        assert_eq!(parsed.translations[0].text, "Hola");
        assert_eq!(parsed.translations[0].detected_source_language, "EN");
    }
}
