//! DeepL client: metered translation with broad coverage and auto-detection

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::errors::{Result, TranslationError};
use crate::core::graph::Translator;
use crate::core::language::{Language, SourceLanguage};
use crate::core::models::Translation;

#[derive(Debug, Serialize)]
struct TranslateBody<'a> {
    text: Vec<&'a str>,
    target_lang: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_lang: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    detected_source_language: Option<String>,
    text: String,
}

/// HTTP client for the DeepL v2 API
#[derive(Debug, Clone)]
pub struct DeepLClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl DeepLClient {
    pub fn new(client: reqwest::Client, api_key: &str, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Translate, letting DeepL detect the source when `from` is `None`
    pub async fn translate_text(
        &self,
        from: Option<Language>,
        to: Language,
        text: &str,
    ) -> Result<Translation> {
        let target_lang = to
            .deepl_target_code()
            .ok_or_else(|| TranslationError::UnsupportedLanguage {
                code: to.code().to_string(),
            })?;

        let source_lang = match from {
            Some(lang) => Some(lang.deepl_source_code().ok_or_else(|| {
                TranslationError::UnsupportedLanguage {
                    code: lang.code().to_string(),
                }
            })?),
            None => None,
        };

        let body = TranslateBody {
            text: vec![text],
            target_lang,
            source_lang,
        };

        let response = self
            .client
            .post(format!("{}/v2/translate", self.base_url))
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(TranslationError::from_reqwest)?;

        let status = response.status();

        if !status.is_success() {
            let status_code = status.as_u16();

            if status_code == 429 {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok());
                return Err(TranslationError::RateLimitError { retry_after });
            }

            // DeepL's "quota exceeded" status
            if status_code == 456 {
                return Err(TranslationError::QuotaExceededError);
            }

            let error_text = response.text().await.unwrap_or_default();
            return Err(TranslationError::ApiError {
                status: status_code,
                message: error_text,
            });
        }

        let parsed: TranslateResponse =
            response
                .json()
                .await
                .map_err(|e| TranslationError::InvalidResponseError {
                    message: e.to_string(),
                })?;

        let first = parsed.translations.into_iter().next().ok_or_else(|| {
            TranslationError::InvalidResponseError {
                message: "No translation in response".to_string(),
            }
        })?;

        let detected = first.detected_source_language.as_deref().and_then(|code| {
            let language = Language::from_deepl_code(code);
            if language.is_none() {
                warn!("DeepL detected unknown language {}", code);
            }
            language
        });

        Ok(Translation::new(first.text).with_detected(detected))
    }
}

#[async_trait]
impl Translator for DeepLClient {
    fn name(&self) -> &str {
        "deepl"
    }

    fn sources(&self) -> Vec<SourceLanguage> {
        std::iter::once(SourceLanguage::Auto)
            .chain(
                Language::ALL
                    .into_iter()
                    .filter(|l| l.deepl_source_code().is_some())
                    .map(SourceLanguage::Known),
            )
            .collect()
    }

    fn targets(&self) -> Vec<Language> {
        Language::ALL
            .into_iter()
            .filter(|l| l.deepl_target_code().is_some())
            .collect()
    }

    fn is_expensive(&self) -> bool {
        true
    }

    async fn translate(&self, from: SourceLanguage, to: Language, text: &str) -> Result<Translation> {
        self.translate_text(from.known(), to, text).await
    }
}
