use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A unit of pipeline data: free-text content plus attached metadata and an
/// optional relevance score.
///
/// Documents are immutable values; transformations build new documents
/// instead of mutating in place, so metadata from upstream stages is never
/// lost by accident.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    /// Free-text content. Absent content is allowed; translators skip such
    /// documents.
    #[serde(default)]
    pub content: Option<String>,
    /// Ordered metadata attached to the document.
    #[serde(default)]
    pub meta: Map<String, Value>,
    /// Relevance score assigned by an upstream retrieval stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            meta: Map::new(),
            score: None,
        }
    }

    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// True when the document carries non-empty content.
    pub fn has_content(&self) -> bool {
        self.content.as_deref().is_some_and(|text| !text.is_empty())
    }
}
