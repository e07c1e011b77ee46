use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::client::{DeepLClient, TranslateOptions, Translation, TranslationClient};
use crate::config::{
    Formality, SplitSentences, TagHandling, TagList, TargetLang, TranslationConfig,
};
use crate::document::Document;
use crate::error::{Result, TranslatorError};
use crate::secret::Secret;

use super::{parse_spec, resolve_auth_key, to_spec_value};

const TYPE_ID: &str = "deepl_pipeline::components::DocumentTranslator";

/// Metadata keys the translator owns on output documents. Pre-existing
/// entries under these keys are overwritten, with a warning.
const RESERVED_META_KEYS: [&str; 2] = ["source_lang", "language"];

fn default_target_lang() -> TargetLang {
    TargetLang::One("EN-US".to_string())
}

fn default_include_score() -> bool {
    true
}

/// Translates a batch of documents using the DeepL API.
///
/// With several target languages configured, every document is translated
/// once per language; the output is grouped by target language, each group
/// in input order. Documents without content are skipped. Original metadata
/// is preserved, except for the reserved `source_lang` and `language`
/// entries, which the translator sets on every output document.
pub struct DocumentTranslator {
    api_key: Secret,
    target_lang: TargetLang,
    include_score: bool,
    config: TranslationConfig,
    client: Box<dyn TranslationClient>,
}

impl std::fmt::Debug for DocumentTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentTranslator")
            .field("api_key", &self.api_key)
            .field("target_lang", &self.target_lang)
            .field("include_score", &self.include_score)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DocumentTranslator {
    /// Create a translator talking to the DeepL API.
    ///
    /// Resolves the credential and validates the target language(s); both
    /// failures surface here, before any call is made.
    pub fn new(
        api_key: Secret,
        target_lang: impl Into<TargetLang>,
        config: TranslationConfig,
    ) -> Result<Self> {
        let target_lang = target_lang.into();
        target_lang.validate()?;
        let auth_key = resolve_auth_key(&api_key)?;
        let client = DeepLClient::new(auth_key, config.max_retries)?;
        Ok(Self {
            api_key,
            target_lang,
            include_score: true,
            config,
            client: Box::new(client),
        })
    }

    /// Create a translator with a caller-supplied translation client.
    pub fn with_client(
        api_key: Secret,
        target_lang: impl Into<TargetLang>,
        config: TranslationConfig,
        client: Box<dyn TranslationClient>,
    ) -> Result<Self> {
        let target_lang = target_lang.into();
        target_lang.validate()?;
        Ok(Self {
            api_key,
            target_lang,
            include_score: true,
            config,
            client,
        })
    }

    /// Control whether the original document score is carried over to the
    /// translated documents. Defaults to true.
    #[must_use]
    pub fn with_include_score(mut self, include: bool) -> Self {
        self.include_score = include;
        self
    }

    pub fn target_lang(&self) -> &TargetLang {
        &self.target_lang
    }

    pub fn include_score(&self) -> bool {
        self.include_score
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn api_key(&self) -> &Secret {
        &self.api_key
    }

    /// Translate `documents` into every configured target language.
    ///
    /// A per-call `source_lang` takes precedence over the configured one.
    /// An empty input yields an empty output without contacting the
    /// translation service.
    pub async fn run(
        &self,
        documents: &[Document],
        source_lang: Option<&str>,
    ) -> Result<Vec<Document>> {
        if documents.is_empty() {
            warn!("no documents provided for translation");
            return Ok(Vec::new());
        }

        let submitted: Vec<&Document> = documents.iter().filter(|doc| doc.has_content()).collect();
        let skipped = documents.len() - submitted.len();
        if skipped > 0 {
            warn!("skipping {} document(s) without content", skipped);
        }
        if submitted.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = submitted
            .iter()
            .filter_map(|doc| doc.content.clone())
            .collect();
        let options = TranslateOptions::from_config(&self.config, source_lang);

        let mut translated = Vec::with_capacity(submitted.len() * self.target_lang.codes().len());
        for target_lang in self.target_lang.codes() {
            let translations = self.client.translate(&texts, target_lang, &options).await?;
            if translations.len() != submitted.len() {
                return Err(TranslatorError::Translation(format!(
                    "translation service returned {} translations for {} documents",
                    translations.len(),
                    submitted.len()
                )));
            }
            for (document, translation) in submitted.iter().copied().zip(translations) {
                translated.push(self.translated_document(document, translation, target_lang));
            }
        }

        Ok(translated)
    }

    /// Build the output document: translated content, original metadata
    /// overlaid with the reserved entries, score carried over when enabled.
    fn translated_document(
        &self,
        document: &Document,
        translation: Translation,
        target_lang: &str,
    ) -> Document {
        if RESERVED_META_KEYS
            .iter()
            .any(|key| document.meta.contains_key(*key))
        {
            warn!(
                "document meta already contains language or source_lang; \
                 these entries will be overwritten"
            );
        }

        let mut meta = document.meta.clone();
        meta.insert(
            "source_lang".to_string(),
            Value::String(translation.detected_source_lang),
        );
        meta.insert("language".to_string(), Value::String(target_lang.to_string()));

        Document {
            content: Some(translation.text),
            meta,
            score: if self.include_score {
                document.score
            } else {
                None
            },
        }
    }

    /// Serialize the component to its persisted spec.
    ///
    /// Fails for token-based credentials; only resolvable references are
    /// allowed in persisted pipeline data.
    pub fn to_spec(&self) -> Result<Value> {
        let params = DocumentTranslatorParams {
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
            include_score: self.include_score,
        };
        to_spec_value(TYPE_ID, &params)
    }

    /// Reconstruct a component from its persisted spec.
    ///
    /// The credential reference is resolved here; a strict reference with
    /// no environment variable set fails deserialization.
    pub fn from_spec(value: &Value) -> Result<Self> {
        let params: DocumentTranslatorParams = parse_spec(value, TYPE_ID)?;
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
        Ok(Self::new(params.api_key, params.target_lang, config)?
            .with_include_score(params.include_score))
    }
}

/// Every construction parameter, in persisted form.
#[derive(Debug, Serialize, Deserialize)]
struct DocumentTranslatorParams {
    #[serde(default)]
    api_key: Secret,
    #[serde(default)]
    source_lang: Option<String>,
    #[serde(default = "default_target_lang")]
    target_lang: TargetLang,
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
    #[serde(default = "default_include_score")]
    include_score: bool,
}

fn default_max_retries() -> u32 {
    TranslationConfig::default().max_retries
}

fn default_outline_detection() -> bool {
    TranslationConfig::default().outline_detection
}
