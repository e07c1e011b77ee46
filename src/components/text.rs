use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{DeepLClient, TranslateOptions, TranslationClient};
use crate::config::{Formality, SplitSentences, TagHandling, TagList, TranslationConfig};
use crate::error::{Result, TranslatorError};
use crate::secret::Secret;

use super::{parse_spec, resolve_auth_key, to_spec_value};

const TYPE_ID: &str = "deepl_pipeline::components::TextTranslator";

fn default_target_lang() -> String {
    "EN-US".to_string()
}

/// Metadata attached to a translated string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationMeta {
    /// Language the service detected (or was told) the input was in.
    pub source_lang: String,
    /// Language the text was translated into.
    pub language: String,
}

/// Output of [`TextTranslator::run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextTranslation {
    pub translation: String,
    pub meta: TranslationMeta,
}

/// Translates a single string using the DeepL API.
///
/// For lists of documents, use
/// [`DocumentTranslator`](super::DocumentTranslator).
pub struct TextTranslator {
    api_key: Secret,
    target_lang: String,
    config: TranslationConfig,
    client: Box<dyn TranslationClient>,
}

impl std::fmt::Debug for TextTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextTranslator")
            .field("api_key", &self.api_key)
            .field("target_lang", &self.target_lang)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TextTranslator {
    /// Create a translator talking to the DeepL API.
    ///
    /// Resolves the credential and validates the target language; both
    /// failures surface here, before any call is made.
    pub fn new(
        api_key: Secret,
        target_lang: impl Into<String>,
        config: TranslationConfig,
    ) -> Result<Self> {
        let target_lang = target_lang.into();
        validate_target_lang(&target_lang)?;
        let auth_key = resolve_auth_key(&api_key)?;
        let client = DeepLClient::new(auth_key, config.max_retries)?;
        Ok(Self {
            api_key,
            target_lang,
            config,
            client: Box::new(client),
        })
    }

    /// Create a translator with a caller-supplied translation client.
    pub fn with_client(
        api_key: Secret,
        target_lang: impl Into<String>,
        config: TranslationConfig,
        client: Box<dyn TranslationClient>,
    ) -> Result<Self> {
        let target_lang = target_lang.into();
        validate_target_lang(&target_lang)?;
        Ok(Self {
            api_key,
            target_lang,
            config,
            client,
        })
    }

    pub fn target_lang(&self) -> &str {
        &self.target_lang
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn api_key(&self) -> &Secret {
        &self.api_key
    }

    /// Translate `text` into the configured target language.
    ///
    /// A per-call `source_lang` takes precedence over the configured one;
    /// when neither is set the service auto-detects the source language.
    pub async fn run(&self, text: &str, source_lang: Option<&str>) -> Result<TextTranslation> {
        if text.is_empty() {
            return Err(TranslatorError::InvalidInput(
                "empty text provided".to_string(),
            ));
        }

        let options = TranslateOptions::from_config(&self.config, source_lang);
        let texts = [text.to_string()];
        let translations = self
            .client
            .translate(&texts, &self.target_lang, &options)
            .await?;
        let translation = translations.into_iter().next().ok_or_else(|| {
            TranslatorError::Translation(
                "translation service returned no translation".to_string(),
            )
        })?;

        Ok(TextTranslation {
            translation: translation.text,
            meta: TranslationMeta {
                source_lang: translation.detected_source_lang,
                language: self.target_lang.clone(),
            },
        })
    }

    /// Serialize the component to its persisted spec.
    ///
    /// Fails for token-based credentials; only resolvable references are
    /// allowed in persisted pipeline data.
    pub fn to_spec(&self) -> Result<Value> {
        let params = TextTranslatorParams {
            api_key: self.api_key.clone(),
            source_lang: self.config.source_lang.clone(),
            target_lang: self.target_lang.clone(),
            formality: self.config.formality,
            max_retries: self.config.max_retries,
            preserve_formatting: self.config.preserve_formatting,
            split_sentences: self.config.split_sentences,
            context: self.config.context.clone(),
            glossary: self.config.glossary.clone(),
            tag_handling: self.config.tag_handling,
            outline_detection: self.config.outline_detection,
            non_splitting_tags: self.config.non_splitting_tags.clone(),
            splitting_tags: self.config.splitting_tags.clone(),
            ignore_tags: self.config.ignore_tags.clone(),
        };
        to_spec_value(TYPE_ID, &params)
    }

    /// Reconstruct a component from its persisted spec.
    ///
    /// The credential reference is resolved here; a strict reference with
    /// no environment variable set fails deserialization.
    pub fn from_spec(value: &Value) -> Result<Self> {
        let params: TextTranslatorParams = parse_spec(value, TYPE_ID)?;
        let config = TranslationConfig {
            source_lang: params.source_lang,
            formality: params.formality,
            max_retries: params.max_retries,
            preserve_formatting: params.preserve_formatting,
            split_sentences: params.split_sentences,
            context: params.context,
            glossary: params.glossary,
            tag_handling: params.tag_handling,
            outline_detection: params.outline_detection,
            non_splitting_tags: params.non_splitting_tags,
            splitting_tags: params.splitting_tags,
            ignore_tags: params.ignore_tags,
        };
        Self::new(params.api_key, params.target_lang, config)
    }
}

fn validate_target_lang(code: &str) -> Result<()> {
    if code.is_empty() {
        return Err(TranslatorError::Config(
            "target_lang must be a non-empty language code".to_string(),
        ));
    }
    Ok(())
}

/// Every construction parameter, in persisted form.
#[derive(Debug, Serialize, Deserialize)]
struct TextTranslatorParams {
    #[serde(default)]
    api_key: Secret,
    #[serde(default)]
    source_lang: Option<String>,
    #[serde(default = "default_target_lang")]
    target_lang: String,
    #[serde(default)]
    formality: Formality,
    #[serde(default = "default_max_retries")]
    max_retries: u32,
    #[serde(default)]
    preserve_formatting: bool,
    #[serde(default)]
    split_sentences: SplitSentences,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    glossary: Option<String>,
    #[serde(default)]
    tag_handling: Option<TagHandling>,
    #[serde(default = "default_outline_detection")]
    outline_detection: bool,
    #[serde(default)]
    non_splitting_tags: Option<TagList>,
    #[serde(default)]
    splitting_tags: Option<TagList>,
    #[serde(default)]
    ignore_tags: Option<TagList>,
}

fn default_max_retries() -> u32 {
    TranslationConfig::default().max_retries
}

fn default_outline_detection() -> bool {
    TranslationConfig::default().outline_detection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MockTranslationClient, Translation};
    use serde_json::json;

    fn echo_client(expected_source: Option<&'static str>, target: &'static str) -> Box<MockTranslationClient> {
        let mut client = MockTranslationClient::new();
        client
            .expect_translate()
            .withf(move |_texts, target_lang, options| {
                target_lang == target && options.source_lang.as_deref() == expected_source
            })
            .times(1)
            .returning(|texts, _, options| {
                Ok(texts
                    .iter()
                    .map(|text| Translation {
                        text: text.clone(),
                        detected_source_lang: options
                            .source_lang
                            .clone()
                            .unwrap_or_else(|| "EN".to_string()),
                    })
                    .collect())
            });
        Box::new(client)
    }

    #[test]
    fn test_new_with_token_secret() {
        let translator = TextTranslator::new(
            Secret::from_token("test-api-key"),
            "ES",
            TranslationConfig::default(),
        )
        .unwrap();
        assert_eq!(translator.target_lang(), "ES");
        assert_eq!(translator.config(), &TranslationConfig::default());
    }

    #[test]
    fn test_new_resolves_env_credential() {
        unsafe { std::env::set_var("DEEPL_PIPELINE_TEXT_KEY", "test-api-key") };
        let translator = TextTranslator::new(
            Secret::from_env_var("DEEPL_PIPELINE_TEXT_KEY"),
            "EN-US",
            TranslationConfig::default(),
        );
        assert!(translator.is_ok());
    }

    #[test]
    fn test_new_fails_without_credential() {
        let err = TextTranslator::new(
            Secret::from_env_var("DEEPL_PIPELINE_TEXT_UNSET"),
            "ES",
            TranslationConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TranslatorError::Secret(_)));
    }

    #[test]
    fn test_new_fails_with_empty_target_lang() {
        let err = TextTranslator::new(
            Secret::from_token("test-api-key"),
            "",
            TranslationConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TranslatorError::Config(_)));
    }

    #[tokio::test]
    async fn test_run() {
        let config = TranslationConfig::default()
            .with_source_lang("EN")
            .with_formality(Formality::More);
        let mut client = MockTranslationClient::new();
        client
            .expect_translate()
            .withf(|texts, target_lang, options| {
                texts == ["What's Natural Language Processing?".to_string()]
                    && target_lang == "ES"
                    && *options
                        == TranslateOptions {
                            source_lang: Some("EN".to_string()),
                            formality: Formality::More,
                            ..TranslateOptions::default()
                        }
            })
            .times(1)
            .returning(|texts, _, _| {
                Ok(vec![Translation {
                    text: texts[0].clone(),
                    detected_source_lang: "EN".to_string(),
                }])
            });
        let translator = TextTranslator::with_client(
            Secret::from_token("fake-api-key"),
            "ES",
            config,
            Box::new(client),
        )
        .unwrap();

        let result = translator
            .run("What's Natural Language Processing?", None)
            .await
            .unwrap();
        assert_eq!(result.translation, "What's Natural Language Processing?");
        assert_eq!(result.meta.source_lang, "EN");
        assert_eq!(result.meta.language, "ES");
    }

    #[tokio::test]
    async fn test_run_empty_text_fails_without_client_call() {
        let client = MockTranslationClient::new();
        let translator = TextTranslator::with_client(
            Secret::from_token("fake-api-key"),
            "ES",
            TranslationConfig::default(),
            Box::new(client),
        )
        .unwrap();

        let err = translator.run("", None).await.unwrap_err();
        assert!(matches!(err, TranslatorError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_run_source_lang_override_takes_precedence() {
        let config = TranslationConfig::default().with_source_lang("DE");
        let translator = TextTranslator::with_client(
            Secret::from_token("fake-api-key"),
            "ES",
            config,
            echo_client(Some("IT"), "ES"),
        )
        .unwrap();

        let result = translator.run("Whatever", Some("IT")).await.unwrap();
        assert_eq!(result.meta.source_lang, "IT");
        assert_eq!(result.meta.language, "ES");
    }

    #[tokio::test]
    async fn test_run_propagates_client_error() {
        let mut client = MockTranslationClient::new();
        client
            .expect_translate()
            .returning(|_, _, _| {
                Err(TranslatorError::QuotaExceeded(
                    "quota for this billing period has been exceeded".to_string(),
                ))
            });
        let translator = TextTranslator::with_client(
            Secret::from_token("fake-api-key"),
            "ES",
            TranslationConfig::default(),
            Box::new(client),
        )
        .unwrap();

        let err = translator.run("Whatever", None).await.unwrap_err();
        assert!(matches!(err, TranslatorError::QuotaExceeded(_)));
    }

    #[test]
    fn test_to_spec_default() {
        let translator = TextTranslator::with_client(
            Secret::default(),
            "EN-US",
            TranslationConfig::default(),
            Box::new(MockTranslationClient::new()),
        )
        .unwrap();

        assert_eq!(
            translator.to_spec().unwrap(),
            json!({
                "type": "deepl_pipeline::components::TextTranslator",
                "init_parameters": {
                    "api_key": {
                        "type": "env_var",
                        "env_vars": ["DEEPL_API_KEY"],
                        "strict": true,
                    },
                    "source_lang": null,
                    "target_lang": "EN-US",
                    "formality": "default",
                    "max_retries": 5,
                    "preserve_formatting": false,
                    "split_sentences": "1",
                    "context": null,
                    "glossary": null,
                    "tag_handling": null,
                    "outline_detection": true,
                    "non_splitting_tags": null,
                    "splitting_tags": null,
                    "ignore_tags": null,
                }
            })
        );
    }

    #[test]
    fn test_to_spec_with_parameters() {
        let config = TranslationConfig::default()
            .with_source_lang("DE")
            .with_formality(Formality::More)
            .with_max_retries(2)
            .with_preserve_formatting(true)
            .with_split_sentences(SplitSentences::NoNewlines)
            .with_context("context")
            .with_glossary("glossary")
            .with_tag_handling(TagHandling::Xml)
            .with_outline_detection(false)
            .with_non_splitting_tags("non_splitting_tags")
            .with_splitting_tags("splitting_tags")
            .with_ignore_tags("ignore_tags");
        let translator = TextTranslator::with_client(
            Secret::from_env_var("ENV_VAR"),
            "ES",
            config,
            Box::new(MockTranslationClient::new()),
        )
        .unwrap();

        assert_eq!(
            translator.to_spec().unwrap(),
            json!({
                "type": "deepl_pipeline::components::TextTranslator",
                "init_parameters": {
                    "api_key": {
                        "type": "env_var",
                        "env_vars": ["ENV_VAR"],
                        "strict": true,
                    },
                    "source_lang": "DE",
                    "target_lang": "ES",
                    "formality": "more",
                    "max_retries": 2,
                    "preserve_formatting": true,
                    "split_sentences": "nonewlines",
                    "context": "context",
                    "glossary": "glossary",
                    "tag_handling": "xml",
                    "outline_detection": false,
                    "non_splitting_tags": "non_splitting_tags",
                    "splitting_tags": "splitting_tags",
                    "ignore_tags": "ignore_tags",
                }
            })
        );
    }

    #[test]
    fn test_to_spec_token_secret_fails() {
        let translator = TextTranslator::with_client(
            Secret::from_token("raw-token"),
            "ES",
            TranslationConfig::default(),
            Box::new(MockTranslationClient::new()),
        )
        .unwrap();
        assert!(matches!(
            translator.to_spec().unwrap_err(),
            TranslatorError::Serialization(_)
        ));
    }

    #[test]
    fn test_from_spec_round_trip() {
        unsafe { std::env::set_var("DEEPL_PIPELINE_TEXT_SPEC_KEY", "test-api-key") };
        let config = TranslationConfig::default()
            .with_source_lang("DE")
            .with_formality(Formality::More)
            .with_max_retries(3)
            .with_split_sentences(SplitSentences::Off)
            .with_tag_handling(TagHandling::Html)
            .with_splitting_tags(vec!["br", "hr"]);
        let translator = TextTranslator::with_client(
            Secret::from_env_var("DEEPL_PIPELINE_TEXT_SPEC_KEY"),
            "ES",
            config.clone(),
            Box::new(MockTranslationClient::new()),
        )
        .unwrap();

        let restored = TextTranslator::from_spec(&translator.to_spec().unwrap()).unwrap();
        assert_eq!(restored.target_lang(), "ES");
        assert_eq!(restored.config(), &config);
        assert_eq!(
            restored.api_key(),
            &Secret::from_env_var("DEEPL_PIPELINE_TEXT_SPEC_KEY")
        );
    }

    #[test]
    fn test_from_spec_fails_without_env_var() {
        let spec = json!({
            "type": "deepl_pipeline::components::TextTranslator",
            "init_parameters": {
                "api_key": {
                    "type": "env_var",
                    "env_vars": ["DEEPL_PIPELINE_TEXT_SPEC_UNSET"],
                    "strict": true,
                },
                "target_lang": "ES",
            }
        });
        assert!(matches!(
            TextTranslator::from_spec(&spec).unwrap_err(),
            TranslatorError::Secret(_)
        ));
    }

    #[test]
    fn test_from_spec_rejects_other_component_type() {
        let spec = json!({
            "type": "deepl_pipeline::components::DocumentTranslator",
            "init_parameters": {}
        });
        assert!(matches!(
            TextTranslator::from_spec(&spec).unwrap_err(),
            TranslatorError::Config(_)
        ));
    }
}
