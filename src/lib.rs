//! DeepL translation components for document processing pipelines.
//!
//! Two components expose the DeepL HTTP API to a document pipeline:
//! [`TextTranslator`] translates a single string, [`DocumentTranslator`]
//! translates a batch of documents, optionally into several target
//! languages at once. Both serialize to a `{type, init_parameters}` spec so
//! pipelines containing them can be saved and reloaded as data.

pub mod client;
pub mod components;
pub mod config;
pub mod document;
pub mod error;
pub mod secret;

pub use client::{DeepLClient, TranslateOptions, Translation, TranslationClient};
pub use components::{DocumentTranslator, TextTranslation, TextTranslator, TranslationMeta};
pub use config::{Formality, SplitSentences, TagHandling, TagList, TargetLang, TranslationConfig};
pub use document::Document;
pub use error::{Result, TranslatorError};
pub use secret::Secret;
