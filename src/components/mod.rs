// Translator components
//
// Two pipeline components over one remote client:
// - Text: translate a single string
// - Document: translate a batch of documents, optionally into several
//   target languages at once
//
// Both serialize to a `{type, init_parameters}` spec so pipelines that
// contain them can be persisted and reloaded.

pub mod document;
pub mod text;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, TranslatorError};
use crate::secret::Secret;

pub use document::DocumentTranslator;
pub use text::{TextTranslation, TextTranslator, TranslationMeta};

/// Persisted envelope of a component: fully-qualified type identifier plus
/// every construction parameter.
#[derive(Serialize)]
struct SpecEnvelope<'a, P> {
    #[serde(rename = "type")]
    kind: &'a str,
    init_parameters: &'a P,
}

pub(crate) fn to_spec_value<P: Serialize>(kind: &str, params: &P) -> Result<Value> {
    Ok(serde_json::to_value(SpecEnvelope {
        kind,
        init_parameters: params,
    })?)
}

pub(crate) fn resolve_auth_key(api_key: &Secret) -> Result<String> {
    api_key.resolve()?.ok_or_else(|| {
        TranslatorError::Secret("no API key available from the configured secret".to_string())
    })
}

pub(crate) fn parse_spec<P: DeserializeOwned>(value: &Value, expected: &str) -> Result<P> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| TranslatorError::Config("component spec has no type identifier".to_string()))?;
    if kind != expected {
        return Err(TranslatorError::Config(format!(
            "component spec type mismatch: expected {expected}, got {kind}"
        )));
    }
    let params = value.get("init_parameters").cloned().ok_or_else(|| {
        TranslatorError::Config("component spec has no init_parameters".to_string())
    })?;
    Ok(serde_json::from_value(params)?)
}
