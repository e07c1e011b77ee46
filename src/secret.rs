use std::fmt;

use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, TranslatorError};

/// Environment variable holding the DeepL API key by default.
pub const DEFAULT_API_KEY_ENV: &str = "DEEPL_API_KEY";

/// An authentication value for the DeepL API.
///
/// A secret is either a reference to one or more environment variables,
/// resolved lazily, or an in-memory token. Only environment-variable
/// references can be serialized into a component spec; token secrets refuse
/// serialization so a raw credential never ends up in persisted pipeline
/// data.
#[derive(Clone, PartialEq, Eq)]
pub enum Secret {
    /// Resolved from the first set variable in `env_vars`.
    EnvVar { env_vars: Vec<String>, strict: bool },
    /// An in-memory token. Cannot be serialized.
    Token(String),
}

impl Secret {
    /// Reference a single environment variable. Strict: resolution fails
    /// when the variable is unset.
    pub fn from_env_var(name: impl Into<String>) -> Self {
        Self::EnvVar {
            env_vars: vec![name.into()],
            strict: true,
        }
    }

    /// Reference several environment variables, tried in order.
    pub fn from_env_vars<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::EnvVar {
            env_vars: names.into_iter().map(Into::into).collect(),
            strict: true,
        }
    }

    /// Wrap an explicit token value.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self::Token(token.into())
    }

    /// Make an environment-variable reference non-strict: resolution yields
    /// `None` instead of an error when no variable is set.
    pub fn non_strict(self) -> Self {
        match self {
            Self::EnvVar { env_vars, .. } => Self::EnvVar {
                env_vars,
                strict: false,
            },
            other => other,
        }
    }

    /// Resolve the secret to its value.
    ///
    /// Returns `Ok(None)` only for a non-strict environment reference with
    /// no variable set.
    pub fn resolve(&self) -> Result<Option<String>> {
        match self {
            Self::Token(token) => Ok(Some(token.clone())),
            Self::EnvVar { env_vars, strict } => {
                for name in env_vars {
                    if let Ok(value) = std::env::var(name) {
                        return Ok(Some(value));
                    }
                }
                if *strict {
                    Err(TranslatorError::Secret(format!(
                        "none of the environment variables {env_vars:?} are set"
                    )))
                } else {
                    Ok(None)
                }
            }
        }
    }
}

impl Default for Secret {
    fn default() -> Self {
        Self::from_env_var(DEFAULT_API_KEY_ENV)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnvVar { env_vars, strict } => f
                .debug_struct("EnvVar")
                .field("env_vars", env_vars)
                .field("strict", strict)
                .finish(),
            Self::Token(_) => f.write_str("Token(\"***\")"),
        }
    }
}

#[derive(Serialize)]
struct SecretRepr<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    env_vars: &'a [String],
    strict: bool,
}

#[derive(Deserialize)]
struct SecretReprOwned {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    env_vars: Vec<String>,
    #[serde(default = "default_strict")]
    strict: bool,
}

fn default_strict() -> bool {
    true
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::EnvVar { env_vars, strict } => SecretRepr {
                kind: "env_var",
                env_vars,
                strict: *strict,
            }
            .serialize(serializer),
            Self::Token(_) => Err(S::Error::custom(
                "cannot serialize a token-based secret; use an environment variable reference",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let repr = SecretReprOwned::deserialize(deserializer)?;
        match repr.kind.as_str() {
            "env_var" => {
                if repr.env_vars.is_empty() {
                    return Err(D::Error::custom(
                        "env_var secret must reference at least one variable",
                    ));
                }
                Ok(Self::EnvVar {
                    env_vars: repr.env_vars,
                    strict: repr.strict,
                })
            }
            other => Err(D::Error::custom(format!(
                "unsupported secret type: {other}"
            ))),
        }
    }
}
