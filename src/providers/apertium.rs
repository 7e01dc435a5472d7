//! Apertium APy client: free Bokmål <-> Nynorsk translation and language identification

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use crate::core::detection::{DetectionCandidate, LanguageDetector};
use crate::core::errors::{Result, TranslationError};
use crate::core::graph::Translator;
use crate::core::language::{Language, SourceLanguage};
use crate::core::models::Translation;

/// Languages the pivot connects
const PIVOT_LANGUAGES: [Language; 2] = [Language::Bokmal, Language::Nynorsk];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateResponse {
    response_data: Option<ResponseData>,
    response_details: Option<String>,
    response_status: u16,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseData {
    translated_text: String,
}

/// HTTP client for an Apertium APy instance
#[derive(Debug, Clone)]
pub struct ApertiumClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApertiumClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Translate between two languages Apertium has a pair for
    pub async fn translate_pair(&self, from: Language, to: Language, text: &str) -> Result<String> {
        let langpair = format!("{}|{}", from.apertium_code(), to.apertium_code());
        let form = [
            ("langpair", langpair.as_str()),
            ("markUnknown", "no"),
            ("prefs", ""),
            ("q", text),
        ];

        let response = self
            .client
            .post(format!("{}/translate", self.base_url))
            .form(&form)
            .send()
            .await
            .map_err(TranslationError::from_reqwest)?;

        let body: TranslateResponse = response
            .json()
            .await
            .map_err(|e| TranslationError::InvalidResponseError {
                message: e.to_string(),
            })?;

        if body.response_status != 200 {
            return Err(TranslationError::ApiError {
                status: body.response_status,
                message: body.response_details.unwrap_or_default(),
            });
        }

        body.response_data
            .map(|data| data.translated_text)
            .ok_or_else(|| TranslationError::InvalidResponseError {
                message: "No translation in response".to_string(),
            })
    }
}

#[async_trait]
impl Translator for ApertiumClient {
    fn name(&self) -> &str {
        "apertium"
    }

    fn sources(&self) -> Vec<SourceLanguage> {
        PIVOT_LANGUAGES.into_iter().map(SourceLanguage::Known).collect()
    }

    fn targets(&self) -> Vec<Language> {
        PIVOT_LANGUAGES.to_vec()
    }

    fn is_expensive(&self) -> bool {
        false
    }

    async fn translate(&self, from: SourceLanguage, to: Language, text: &str) -> Result<Translation> {
        let from = from.known().ok_or_else(|| TranslationError::UnsupportedLanguage {
            code: from.to_string(),
        })?;

        let text = self.translate_pair(from, to, text).await?;
        Ok(Translation::new(text))
    }
}

#[async_trait]
impl LanguageDetector for ApertiumClient {
    async fn detect_languages(&self, text: &str) -> Result<Vec<DetectionCandidate>> {
        let response = self
            .client
            .get(format!("{}/identifyLang", self.base_url))
            .query(&[("q", text)])
            .send()
            .await
            .map_err(TranslationError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::ApiError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let scores: HashMap<String, f64> =
            response
                .json()
                .await
                .map_err(|e| TranslationError::InvalidResponseError {
                    message: e.to_string(),
                })?;

        let mut candidates: Vec<DetectionCandidate> = scores
            .into_iter()
            .map(|(code, confidence)| DetectionCandidate {
                language: Language::from_apertium_code(&code),
                code,
                confidence,
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.code.cmp(&b.code))
        });

        debug!(
            "Identified language candidates: {:?}",
            candidates.iter().take(3).map(|c| &c.code).collect::<Vec<_>>()
        );

        Ok(candidates)
    }
}
