// Remote translation client abstraction
//
// The translator components talk to the translation service through the
// `TranslationClient` trait, so tests can substitute a deterministic client
// for the HTTP-backed `DeepLClient`.

pub mod deepl;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::config::{Formality, SplitSentences, TagHandling, TagList, TranslationConfig};
use crate::error::Result;

pub use deepl::DeepLClient;

/// One translated text, as returned by the translation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    /// The translated text.
    pub text: String,
    /// Language code the service detected (or was told) the source was in.
    pub detected_source_lang: String,
}

/// Per-request translation parameters.
///
/// Built from the component configuration plus the per-call source-language
/// override; created and discarded within a single call.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslateOptions {
    /// Resolved source language; absent means auto-detect.
    pub source_lang: Option<String>,
    pub formality: Formality,
    pub preserve_formatting: bool,
    pub split_sentences: SplitSentences,
    pub context: Option<String>,
    pub glossary: Option<String>,
    pub tag_handling: Option<TagHandling>,
    pub outline_detection: bool,
    pub non_splitting_tags: Option<TagList>,
    pub splitting_tags: Option<TagList>,
    pub ignore_tags: Option<TagList>,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            source_lang: None,
            formality: Formality::Default,
            preserve_formatting: false,
            split_sentences: SplitSentences::All,
            context: None,
            glossary: None,
            tag_handling: None,
            outline_detection: true,
            non_splitting_tags: None,
            splitting_tags: None,
            ignore_tags: None,
        }
    }
}

impl TranslateOptions {
    /// Assemble request options from a component configuration.
    ///
    /// The per-call `source_lang` takes precedence over the configured one;
    /// when neither is set the service auto-detects.
    pub fn from_config(config: &TranslationConfig, source_lang: Option<&str>) -> Self {
        Self {
            source_lang: source_lang
                .map(str::to_string)
                .or_else(|| config.source_lang.clone()),
            formality: config.formality,
            preserve_formatting: config.preserve_formatting,
            split_sentences: config.split_sentences,
            context: config.context.clone(),
            glossary: config.glossary.clone(),
            tag_handling: config.tag_handling,
            outline_detection: config.outline_detection,
            non_splitting_tags: config.non_splitting_tags.clone(),
            splitting_tags: config.splitting_tags.clone(),
            ignore_tags: config.ignore_tags.clone(),
        }
    }
}

/// A translation service capable of translating a batch of texts into one
/// target language per call.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TranslationClient: Send + Sync {
    /// Translate `texts` into `target_lang`.
    ///
    /// Returns one `Translation` per input text, in input order.
    async fn translate(
        &self,
        texts: &[String],
        target_lang: &str,
        options: &TranslateOptions,
    ) -> Result<Vec<Translation>>;
}
