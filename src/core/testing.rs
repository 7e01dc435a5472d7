//! Test doubles shared by the core test modules

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::core::errors::{Result, TranslationError};
use crate::core::graph::Translator;
use crate::core::language::{Language, SourceLanguage};
use crate::core::models::Translation;

/// Translator that appends `|from>to` to its input and records every call
#[derive(Clone)]
pub struct MockTranslator {
    name: String,
    sources: Vec<SourceLanguage>,
    targets: Vec<Language>,
    expensive: bool,
    detected: Option<Language>,
    fail: bool,
    inputs: Arc<Mutex<Vec<String>>>,
}

impl MockTranslator {
    fn build(name: &str, sources: &[Language], targets: &[Language], expensive: bool) -> Self {
        Self {
            name: name.to_string(),
            sources: sources.iter().copied().map(SourceLanguage::Known).collect(),
            targets: targets.to_vec(),
            expensive,
            detected: None,
            fail: false,
            inputs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn cheap(name: &str, sources: &[Language], targets: &[Language]) -> Self {
        Self::build(name, sources, targets, false)
    }

    pub fn expensive(name: &str, sources: &[Language], targets: &[Language]) -> Self {
        Self::build(name, sources, targets, true)
    }

    /// Accept `auto` as a source, listed first
    pub fn with_auto(mut self) -> Self {
        self.sources.insert(0, SourceLanguage::Auto);
        self
    }

    pub fn with_detected(mut self, language: Language) -> Self {
        self.detected = Some(language);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn arc(&self) -> Arc<dyn Translator> {
        Arc::new(self.clone())
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.inputs.lock().unwrap().len()
    }
}

#[async_trait]
impl Translator for MockTranslator {
    fn name(&self) -> &str {
        &self.name
    }

    fn sources(&self) -> Vec<SourceLanguage> {
        self.sources.clone()
    }

    fn targets(&self) -> Vec<Language> {
        self.targets.clone()
    }

    fn is_expensive(&self) -> bool {
        self.expensive
    }

    async fn translate(&self, from: SourceLanguage, to: Language, text: &str) -> Result<Translation> {
        self.inputs.lock().unwrap().push(text.to_string());

        if self.fail {
            return Err(TranslationError::ApiError {
                status: 503,
                message: format!("{} unavailable", self.name),
            });
        }

        Ok(Translation::new(format!("{}|{}>{}", text, from, to)).with_detected(self.detected))
    }
}
