//! Language identification

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::Result;
use crate::core::language::Language;

/// One guess from a language identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionCandidate {
    /// Provider code as returned
    pub code: String,
    pub language: Option<Language>,
    pub confidence: f64,
}

#[async_trait]
pub trait LanguageDetector: Send + Sync {
    /// Candidates ordered by confidence, best first
    async fn detect_languages(&self, text: &str) -> Result<Vec<DetectionCandidate>>;

    /// Best candidate, if the router knows its language
    async fn detect_language(&self, text: &str) -> Result<Option<Language>> {
        let candidates = self.detect_languages(text).await?;
        Ok(candidates.first().and_then(|c| c.language))
    }
}
