//! Translation router: path selection, cost-aware rate limiting and execution

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::core::config::RouterConfig;
use crate::core::detection::LanguageDetector;
use crate::core::errors::{Result, TranslationError};
use crate::core::graph::{GraphBuilder, TranslationGraph};
use crate::core::language::{Language, SourceLanguage};
use crate::core::models::{
    CostTier, RequestScope, RouteOutcome, TranslationOutput, TranslationRequest,
};
use crate::core::pipeline::TranslationPipeline;
use crate::core::rate_limiter::{RateLimitPolicy, RateLimiter};
use crate::providers::apertium::ApertiumClient;
use crate::providers::deepl::DeepLClient;

/// Rate-limit key shared by all expensive translations
pub const EXPENSIVE_KEY: &str = "translator-expensive";
/// Rate-limit key shared by all cheap translations
pub const CHEAP_KEY: &str = "translator-cheap";

/// Routes translation requests over the registered providers
#[derive(Clone)]
pub struct TranslationRouter {
    graph: Arc<TranslationGraph>,
    limiter: Arc<RateLimiter>,
    detector: Option<Arc<dyn LanguageDetector>>,
    config: Arc<RouterConfig>,
}

impl TranslationRouter {
    /// Create a router over an already built graph
    pub fn new(
        graph: TranslationGraph,
        limiter: Arc<RateLimiter>,
        detector: Option<Arc<dyn LanguageDetector>>,
        config: RouterConfig,
    ) -> Self {
        Self {
            graph: Arc::new(graph),
            limiter,
            detector,
            config: Arc::new(config),
        }
    }

    /// Wire the Apertium pivot and, when a key is configured, DeepL
    pub fn from_config(config: RouterConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .pool_max_idle_per_host(10)
            .build()?;

        let apertium = Arc::new(ApertiumClient::new(client.clone(), &config.apertium_url));
        let mut builder = GraphBuilder::new().register(apertium.clone());

        if config.has_deepl() {
            let deepl = DeepLClient::new(client, &config.deepl_api_key, config.deepl_endpoint());
            builder = builder.register(Arc::new(deepl));
        } else {
            warn!("DeepL is not configured; expensive routes are unavailable");
        }

        let graph = builder.build()?;
        info!(
            "Translation graph ready: {} edges over {} languages",
            graph.edge_count(),
            graph.languages().len()
        );

        let detector: Option<Arc<dyn LanguageDetector>> = if config.detect_source {
            Some(apertium as Arc<dyn LanguageDetector>)
        } else {
            None
        };

        Ok(Self::new(graph, Arc::new(RateLimiter::default()), detector, config))
    }

    /// Create from environment
    pub fn from_env() -> Result<Self> {
        let config = RouterConfig::load(None, None)?;
        Self::from_config(config)
    }

    pub fn graph(&self) -> &TranslationGraph {
        &self.graph
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn detector(&self) -> Option<&Arc<dyn LanguageDetector>> {
        self.detector.as_ref()
    }

    /// Resolve the hops for a pair without running them
    pub fn route(&self, source: SourceLanguage, target: Language) -> TranslationPipeline {
        self.graph.pipeline(source, target)
    }

    /// Rate-limit tier parameters for a pipeline cost
    pub fn policy_for(&self, tier: CostTier) -> (&'static str, RateLimitPolicy) {
        match tier {
            CostTier::Expensive => (EXPENSIVE_KEY, self.config.expensive_limit),
            CostTier::Cheap => (CHEAP_KEY, self.config.cheap_limit),
        }
    }

    /// Turn `auto` into a known language when a detector is available
    async fn resolve_source(&self, request: &TranslationRequest) -> Result<SourceLanguage> {
        let SourceLanguage::Auto = request.source else {
            return Ok(request.source);
        };

        let Some(detector) = &self.detector else {
            return Ok(SourceLanguage::Auto);
        };

        let detected = detector.detect_language(&request.text).await?;
        let language = match detected {
            Some(language) => {
                debug!("Detected source language {}", language);
                language
            }
            None => {
                let fallback = Language::fallback_source_for(request.target);
                debug!("Language not identified, assuming {}", fallback);
                fallback
            }
        };

        Ok(SourceLanguage::Known(language))
    }

    /// Translate a single request
    pub async fn translate(
        &self,
        request: &TranslationRequest,
        scope: &RequestScope,
    ) -> Result<RouteOutcome> {
        info!(
            "Translating from {} to {} for {}: {}",
            request.source, request.target, scope.user_id, request.text
        );

        let source = self.resolve_source(request).await?;

        if source == SourceLanguage::Known(request.target) {
            error!(
                "Source language is the same as target language for text: {}",
                request.text
            );
            return Err(TranslationError::SameLanguage {
                language: request.target,
            });
        }

        let length = request.text.chars().count();
        if length > self.config.max_text_length {
            return Err(TranslationError::TextTooLong {
                length,
                max: self.config.max_text_length,
            });
        }

        let pipeline = self.graph.pipeline(source, request.target);
        if pipeline.is_empty() {
            error!("No translation pipeline found from {} to {}", source, request.target);
            return Err(TranslationError::NoPath {
                from: source,
                to: request.target,
            });
        }

        let tier = CostTier::from_expensive(pipeline.expensive());
        let should_rate_limit = pipeline.expensive() || request.public;
        let (key, policy) = self.policy_for(tier);

        debug!(
            "Rate limiting {} for {}",
            if should_rate_limit { "enabled" } else { "disabled" },
            key
        );

        let mut uses_left = None;
        if should_rate_limit {
            let response = self.limiter.rate_limit(key, scope, &policy).await;
            if response.is_rate_limited {
                return Ok(RouteOutcome::RateLimited {
                    time_until_next_use: response.time_until_next_use.unwrap_or_default(),
                    tier,
                });
            }
            uses_left = response.uses_left;
        }

        let output = pipeline.execute(&request.text).await.map_err(|e| {
            error!("Translation failed: {}", e);
            e
        })?;

        Ok(RouteOutcome::Translated(TranslationOutput {
            text: output.text,
            source: output.detected_source.or(source.known()),
            target: request.target,
            expensive: pipeline.expensive(),
            uses_left,
            path: pipeline.path(),
        }))
    }

    /// Translate requests one after another on behalf of one scope
    pub async fn translate_batch(
        &self,
        requests: Vec<TranslationRequest>,
        scope: &RequestScope,
    ) -> Vec<Result<RouteOutcome>> {
        let mut results = Vec::new();

        for request in requests {
            let result = self.translate(&request, scope).await;
            results.push(result);
        }

        results
    }
}
