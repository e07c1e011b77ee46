use serde::{Deserialize, Serialize};

use crate::error::{Result, TranslatorError};

fn default_max_retries() -> u32 {
    5
}

fn default_outline_detection() -> bool {
    true
}

/// Formality register requested from the translation engine.
///
/// Only supported for a subset of target languages (DE, FR, IT, ES, NL, PL,
/// PT-BR, PT-PT, JA, RU); the `Prefer*` variants fall back to the default
/// register instead of failing when the target language has no formality
/// support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formality {
    #[default]
    Default,
    More,
    Less,
    PreferMore,
    PreferLess,
}

impl Formality {
    pub(crate) fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }
}

/// How the engine splits input into sentences before translating.
///
/// Serialized with the engine's own values: "0" (off), "1" (split on
/// punctuation and newlines, the default), "nonewlines" (punctuation only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SplitSentences {
    #[serde(rename = "0")]
    Off,
    #[default]
    #[serde(rename = "1")]
    All,
    #[serde(rename = "nonewlines")]
    NoNewlines,
}

impl SplitSentences {
    pub(crate) fn is_default(&self) -> bool {
        matches!(self, Self::All)
    }
}

/// Markup type to parse before translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagHandling {
    Xml,
    Html,
}

/// One tag name or a list of tag names.
///
/// Kept as given through serialization; joined with commas on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagList {
    One(String),
    Many(Vec<String>),
}

impl TagList {
    pub(crate) fn to_csv(&self) -> String {
        match self {
            Self::One(tag) => tag.clone(),
            Self::Many(tags) => tags.join(","),
        }
    }
}

impl From<&str> for TagList {
    fn from(tag: &str) -> Self {
        Self::One(tag.to_string())
    }
}

impl From<String> for TagList {
    fn from(tag: String) -> Self {
        Self::One(tag)
    }
}

impl From<Vec<String>> for TagList {
    fn from(tags: Vec<String>) -> Self {
        Self::Many(tags)
    }
}

impl From<Vec<&str>> for TagList {
    fn from(tags: Vec<&str>) -> Self {
        Self::Many(tags.into_iter().map(str::to_string).collect())
    }
}

/// One target language code or an ordered list of codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetLang {
    One(String),
    Many(Vec<String>),
}

impl TargetLang {
    /// The codes in request order.
    pub fn codes(&self) -> &[String] {
        match self {
            Self::One(code) => std::slice::from_ref(code),
            Self::Many(codes) => codes,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let codes = self.codes();
        if codes.is_empty() || codes.iter().any(|code| code.is_empty()) {
            return Err(TranslatorError::Config(
                "target_lang must be a non-empty language code or a non-empty list of codes"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

impl From<&str> for TargetLang {
    fn from(code: &str) -> Self {
        Self::One(code.to_string())
    }
}

impl From<String> for TargetLang {
    fn from(code: String) -> Self {
        Self::One(code)
    }
}

impl From<Vec<String>> for TargetLang {
    fn from(codes: Vec<String>) -> Self {
        Self::Many(codes)
    }
}

impl From<Vec<&str>> for TargetLang {
    fn from(codes: Vec<&str>) -> Self {
        Self::Many(codes.into_iter().map(str::to_string).collect())
    }
}

/// Translation behavior options shared by both translator components.
///
/// Set once at construction; calls never mutate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Language code of the input text, e.g. "DE" or "ES". Absent means the
    /// engine auto-detects the source language.
    #[serde(default)]
    pub source_lang: Option<String>,
    /// Formality register for the translation.
    #[serde(default)]
    pub formality: Formality,
    /// Maximum network retries after a failed HTTP request, forwarded to
    /// the client.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Set to true to prevent automatic correction of formatting.
    #[serde(default)]
    pub preserve_formatting: bool,
    /// Sentence splitting behavior.
    #[serde(default)]
    pub split_sentences: SplitSentences,
    /// Additional context that influences the translation without being
    /// translated itself.
    #[serde(default)]
    pub context: Option<String>,
    /// Glossary ID to apply; must match the source and target languages.
    #[serde(default)]
    pub glossary: Option<String>,
    /// Markup type to parse before translation.
    #[serde(default)]
    pub tag_handling: Option<TagHandling>,
    /// Set to false to disable automatic tag detection.
    #[serde(default = "default_outline_detection")]
    pub outline_detection: bool,
    /// Tags that never split text into sentences.
    #[serde(default)]
    pub non_splitting_tags: Option<TagList>,
    /// Tags that always split text into sentences.
    #[serde(default)]
    pub splitting_tags: Option<TagList>,
    /// Tags whose content is not translated.
    #[serde(default)]
    pub ignore_tags: Option<TagList>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            source_lang: None,
            formality: Formality::Default,
            max_retries: default_max_retries(),
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

impl TranslationConfig {
    #[must_use]
    pub fn with_source_lang(mut self, code: impl Into<String>) -> Self {
        self.source_lang = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_formality(mut self, formality: Formality) -> Self {
        self.formality = formality;
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    #[must_use]
    pub fn with_preserve_formatting(mut self, preserve: bool) -> Self {
        self.preserve_formatting = preserve;
        self
    }

    #[must_use]
    pub fn with_split_sentences(mut self, mode: SplitSentences) -> Self {
        self.split_sentences = mode;
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    #[must_use]
    pub fn with_glossary(mut self, glossary: impl Into<String>) -> Self {
        self.glossary = Some(glossary.into());
        self
    }

    #[must_use]
    pub fn with_tag_handling(mut self, tag_handling: TagHandling) -> Self {
        self.tag_handling = Some(tag_handling);
        self
    }

    #[must_use]
    pub fn with_outline_detection(mut self, detect: bool) -> Self {
        self.outline_detection = detect;
        self
    }

    #[must_use]
    pub fn with_non_splitting_tags(mut self, tags: impl Into<TagList>) -> Self {
        self.non_splitting_tags = Some(tags.into());
        self
    }

    #[must_use]
    pub fn with_splitting_tags(mut self, tags: impl Into<TagList>) -> Self {
        self.splitting_tags = Some(tags.into());
        self
    }

    #[must_use]
    pub fn with_ignore_tags(mut self, tags: impl Into<TagList>) -> Self {
        self.ignore_tags = Some(tags.into());
        self
    }
}
