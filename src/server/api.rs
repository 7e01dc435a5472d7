//! HTTP API server implementation

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::config::RouterConfig;
use crate::core::detection::{DetectionCandidate, LanguageDetector};
use crate::core::errors::TranslationError;
use crate::core::language::{EmojiKind, Language, SourceLanguage};
use crate::core::messages::{DisplayLanguage, DonationPrompter, Message, Reply};
use crate::core::models::{RequestScope, RouteOutcome, TranslationRequest};
use crate::core::router::TranslationRouter;

/// Minimum confidence for a detection candidate to be reported
const MIN_DETECTION_CONFIDENCE: f64 = 0.5;

/// Application state
#[derive(Clone)]
pub struct AppState {
    router: Arc<TranslationRouter>,
    detector: Option<Arc<dyn LanguageDetector>>,
    donations: Arc<DonationPrompter>,
}

impl AppState {
    pub fn new(router: Arc<TranslationRouter>) -> Self {
        let detector = router.detector().cloned();
        Self {
            router,
            detector,
            donations: Arc::new(DonationPrompter::default()),
        }
    }

    pub fn with_detector(mut self, detector: Arc<dyn LanguageDetector>) -> Self {
        self.detector = Some(detector);
        self
    }
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
    timestamp: i64,
}

/// Languages list response
#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub object: String,
    pub data: Vec<LanguageEntry>,
}

#[derive(Debug, Serialize)]
pub struct LanguageEntry {
    pub code: Language,
    pub name: String,
    pub name_nn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translate_emoji: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RouteQuery {
    #[serde(default)]
    pub from: Option<String>,
    pub to: String,
}

#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub path: Vec<SourceLanguage>,
    pub hops: Vec<HopInfo>,
    pub expensive: bool,
}

#[derive(Debug, Serialize)]
pub struct HopInfo {
    pub from: SourceLanguage,
    pub to: Language,
    pub provider: String,
    pub expensive: bool,
}

/// Translation request
#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    #[serde(default)]
    pub source_lang: Option<String>,
    /// Language code, name, or translate emoji name
    pub target_lang: String,
    pub text: String,
    pub user_id: String,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub privileged: bool,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub display_language: DisplayLanguage,
    /// Who asked for the translation when it is not the author of the text
    #[serde(default)]
    pub requested_by: Option<String>,
}

/// Translation response
#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub text: String,
    /// Escaped and truncated for chat
    pub markdown: String,
    pub source_lang: Option<Language>,
    pub target_lang: Language,
    pub expensive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uses_left: Option<u32>,
    pub path: Vec<SourceLanguage>,
    pub title: Option<String>,
    pub footer: String,
}

#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub candidates: Vec<DetectionCandidate>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn api_error(status: StatusCode, message: String, code: &str, kind: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: ErrorDetail {
                message,
                code: Some(code.to_string()),
                r#type: Some(kind.to_string()),
                retry_after_ms: None,
            },
        }),
    )
}

fn translation_error(err: &TranslationError, display: DisplayLanguage) -> ApiError {
    let message = err.user_message(display);
    let (status, code, kind) = match err {
        TranslationError::SameLanguage { .. } => {
            (StatusCode::BAD_REQUEST, "same_language", "invalid_request_error")
        }
        TranslationError::TextTooLong { .. } => {
            (StatusCode::BAD_REQUEST, "text_too_long", "invalid_request_error")
        }
        TranslationError::UnsupportedLanguage { .. } => {
            (StatusCode::BAD_REQUEST, "unsupported_language", "invalid_request_error")
        }
        TranslationError::NoPath { .. } => (StatusCode::NOT_FOUND, "no_route", "invalid_request_error"),
        e if e.is_upstream() => (StatusCode::BAD_GATEWAY, "translation_error", "api_error"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "api_error"),
    };
    api_error(status, message, code, kind)
}

fn parse_target(value: &str) -> Result<Language, TranslationError> {
    value.parse::<Language>().or_else(|err| {
        Language::from_emoji(value.trim_matches(':'), Some(EmojiKind::Translate)).ok_or(err)
    })
}

fn parse_source(value: Option<&str>) -> Result<SourceLanguage, TranslationError> {
    match value {
        None | Some("") => Ok(SourceLanguage::Auto),
        Some(code) => code.parse(),
    }
}

/// Health check handler
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: crate::NAME.to_string(),
        version: crate::VERSION.to_string(),
        timestamp: chrono::Utc::now().timestamp(),
    })
}

/// Languages reachable through the graph
async fn get_languages(State(state): State<Arc<AppState>>) -> Json<LanguagesResponse> {
    let data = state
        .router
        .graph()
        .languages()
        .into_iter()
        .map(|lang| LanguageEntry {
            code: lang,
            name: lang.name(DisplayLanguage::English).to_string(),
            name_nn: lang.name(DisplayLanguage::Norwegian).to_string(),
            translate_emoji: lang.emoji(EmojiKind::Translate).map(str::to_string),
        })
        .collect();

    Json(LanguagesResponse {
        object: "list".to_string(),
        data,
    })
}

/// Resolve a route without translating
async fn get_route(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RouteQuery>,
) -> ApiResult<RouteResponse> {
    let display = DisplayLanguage::English;
    let source = parse_source(query.from.as_deref()).map_err(|e| translation_error(&e, display))?;
    let target = parse_target(&query.to).map_err(|e| translation_error(&e, display))?;

    if source == SourceLanguage::Known(target) {
        let err = TranslationError::SameLanguage { language: target };
        return Err(translation_error(&err, display));
    }

    let pipeline = state.router.route(source, target);
    if pipeline.is_empty() {
        let err = TranslationError::NoPath {
            from: source,
            to: target,
        };
        return Err(translation_error(&err, display));
    }

    let hops = pipeline
        .hops()
        .iter()
        .map(|hop| HopInfo {
            from: hop.from,
            to: hop.to,
            provider: hop.provider().to_string(),
            expensive: hop.expensive,
        })
        .collect();

    Ok(Json(RouteResponse {
        path: pipeline.path(),
        hops,
        expensive: pipeline.expensive(),
    }))
}

/// Translation handler
async fn translate(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TranslateRequest>,
) -> ApiResult<TranslateResponse> {
    let display = payload.display_language;

    if payload.text.trim().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "No text to translate".to_string(),
            "invalid_request",
            "invalid_request_error",
        ));
    }

    let source = parse_source(payload.source_lang.as_deref())
        .map_err(|e| translation_error(&e, display))?;
    let target = parse_target(&payload.target_lang).map_err(|e| translation_error(&e, display))?;

    let request = TranslationRequest::new(payload.text.clone(), target)
        .with_source(source)
        .public(payload.public);

    let mut scope = RequestScope::new(
        payload.user_id.clone(),
        payload.channel_id.clone().unwrap_or_else(|| "api".to_string()),
    )
    .privileged(payload.privileged);
    scope.guild_id = payload.guild_id.clone();

    let outcome = state.router.translate(&request, &scope).await.map_err(|e| {
        warn!("Translation failed: {}", e);
        translation_error(&e, display)
    })?;

    match outcome {
        RouteOutcome::RateLimited {
            time_until_next_use,
            tier,
        } => {
            debug!("Rejected {} request from {}", tier, scope.user_id);
            let (status, mut body) = api_error(
                StatusCode::TOO_MANY_REQUESTS,
                Message::RateLimited(time_until_next_use).render(display),
                "rate_limited",
                "rate_limit_error",
            );
            body.0.error.retry_after_ms = Some(time_until_next_use.as_millis() as u64);
            Err((status, body))
        }
        RouteOutcome::Translated(output) => {
            let reply = Reply::compose(
                &output,
                display,
                state.router.config().max_text_length,
                payload.requested_by.as_deref(),
                state.donations.should_prompt(output.expensive),
            );

            Ok(Json(TranslateResponse {
                text: output.text,
                markdown: reply.body,
                source_lang: output.source,
                target_lang: output.target,
                expensive: output.expensive,
                uses_left: output.uses_left,
                path: output.path,
                title: reply.title,
                footer: reply.footer,
            }))
        }
    }
}

/// Language identification handler
async fn detect(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DetectRequest>,
) -> ApiResult<DetectResponse> {
    let Some(detector) = &state.detector else {
        return Err(api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Language detection is not configured".to_string(),
            "detection_unavailable",
            "api_error",
        ));
    };

    if payload.text.trim().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "No text to detect".to_string(),
            "invalid_request",
            "invalid_request_error",
        ));
    }

    let candidates = detector
        .detect_languages(&payload.text)
        .await
        .map_err(|e| translation_error(&e, DisplayLanguage::English))?
        .into_iter()
        .filter(|c| c.confidence > MIN_DETECTION_CONFIDENCE)
        .take(3)
        .collect();

    Ok(Json(DetectResponse { candidates }))
}

/// Build the axum router for a given state
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/v1/languages", get(get_languages))
        .route("/v1/route", get(get_route))
        .route("/translate", post(translate))
        .route("/detect", post(detect))
        .with_state(state)
}

/// Periodically evict idle rate-limit entries
fn spawn_rate_limit_sweeper(router: Arc<TranslationRouter>) {
    let interval = Duration::from_millis(router.config().rate_limit_sweep_interval_ms.max(1000));
    let retention = router.config().rate_limit_retention();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            router.limiter().sweep(retention).await;
        }
    });
}

/// Run the HTTP server
pub async fn run_server(host: String, port: u16, config: RouterConfig) -> anyhow::Result<()> {
    // Create router
    let router = Arc::new(TranslationRouter::from_config(config)?);
    spawn_rate_limit_sweeper(router.clone());

    // Create app state
    let state = Arc::new(AppState::new(router));
    let app = app(state);

    // Bind address
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Starting server on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::GraphBuilder;
    use crate::core::rate_limiter::RateLimiter;
    use crate::core::testing::MockTranslator;
    use assert_json_diff::assert_json_include;
    use serde_json::json;
    use Language::*;

    fn state() -> Arc<AppState> {
        let langs = [Bokmal, English];
        let graph = GraphBuilder::new()
            .register(MockTranslator::expensive("deepl", &langs, &langs).with_auto().with_detected(English).arc())
            .register(MockTranslator::cheap("apertium", &[Bokmal, Nynorsk], &[Bokmal, Nynorsk]).arc())
            .build()
            .unwrap();
        let router = TranslationRouter::new(
            graph,
            Arc::new(RateLimiter::default()),
            None,
            RouterConfig::default(),
        );
        Arc::new(AppState::new(Arc::new(router)))
    }

    fn request(body: serde_json::Value) -> TranslateRequest {
        serde_json::from_value(body).unwrap()
    }

    #[tokio::test]
    async fn test_translate_cheap_route() {
        let response = translate(
            State(state()),
            Json(request(json!({
                "source_lang": "nb",
                "target_lang": "nn",
                "text": "*jeg*",
                "user_id": "u1",
                "display_language": "en"
            }))),
        )
        .await
        .unwrap();

        let actual = serde_json::to_value(&response.0).unwrap();
        assert_json_include!(
            actual: actual,
            expected: json!({
                "text": "*jeg*|nb>nn",
                "markdown": "\\*jeg\\*|nb>nn",
                "source_lang": "nb",
                "target_lang": "nn",
                "expensive": false,
                "path": ["nb", "nn"],
                "title": "Translated from Bokmål to Nynorsk",
                "footer": "⚠️ Translations may contain mistakes."
            })
        );
        assert!(actual.get("uses_left").is_none());
    }

    #[tokio::test]
    async fn test_translate_with_emoji_target_and_auto_source() {
        let response = translate(
            State(state()),
            Json(request(json!({
                "target_lang": ":translatenn:",
                "text": "Hello",
                "user_id": "u1"
            }))),
        )
        .await
        .unwrap();

        let actual = serde_json::to_value(&response.0).unwrap();
        assert_json_include!(
            actual: actual,
            expected: json!({
                "source_lang": "en",
                "target_lang": "nn",
                "expensive": true,
                "uses_left": 2,
                "path": ["auto", "nb", "nn"],
                "title": "Omset frå engelsk til nynorsk"
            })
        );
    }

    #[tokio::test]
    async fn test_rate_limited_response() {
        let state = state();
        let body = json!({
            "source_lang": "en",
            "target_lang": "nb",
            "text": "Hello",
            "user_id": "u2",
            "display_language": "en"
        });

        for _ in 0..3 {
            translate(State(state.clone()), Json(request(body.clone())))
                .await
                .unwrap();
        }

        let (status, Json(error)) = translate(State(state), Json(request(body)))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(error.error.code.as_deref(), Some("rate_limited"));
        assert!(error.error.retry_after_ms.unwrap() > 0);
        assert!(error.error.message.starts_with("You have used this command too much recently."));
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let same = translate(
            State(state()),
            Json(request(json!({
                "source_lang": "nb", "target_lang": "nb", "text": "hei", "user_id": "u"
            }))),
        )
        .await
        .unwrap_err();
        assert_eq!(same.0, StatusCode::BAD_REQUEST);
        assert_eq!(same.1 .0.error.code.as_deref(), Some("same_language"));

        let unknown = translate(
            State(state()),
            Json(request(json!({
                "target_lang": "klingon", "text": "hei", "user_id": "u"
            }))),
        )
        .await
        .unwrap_err();
        assert_eq!(unknown.0, StatusCode::BAD_REQUEST);

        let no_route = translate(
            State(state()),
            Json(request(json!({
                "source_lang": "nb", "target_lang": "de", "text": "hei", "user_id": "u"
            }))),
        )
        .await
        .unwrap_err();
        assert_eq!(no_route.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_route_endpoint() {
        let Json(route) = get_route(
            State(state()),
            Query(RouteQuery {
                from: Some("en".to_string()),
                to: "nn".to_string(),
            }),
        )
        .await
        .unwrap();

        let actual = serde_json::to_value(&route).unwrap();
        assert_json_include!(
            actual: actual,
            expected: json!({
                "path": ["en", "nb", "nn"],
                "expensive": true,
                "hops": [
                    { "from": "en", "to": "nb", "provider": "deepl", "expensive": true },
                    { "from": "nb", "to": "nn", "provider": "apertium", "expensive": false }
                ]
            })
        );
    }

    #[tokio::test]
    async fn test_route_rejects_same_language() {
        let (status, Json(error)) = get_route(
            State(state()),
            Query(RouteQuery {
                from: Some("nb".to_string()),
                to: "nb".to_string(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error.error.code.as_deref(), Some("same_language"));
    }

    #[tokio::test]
    async fn test_requested_by_footer_and_donation_prompt() {
        let state = state();
        let body = json!({
            "source_lang": "en",
            "target_lang": "nb",
            "text": "Hello",
            "user_id": "author",
            "privileged": true,
            "display_language": "en",
            "requested_by": "ada"
        });

        let mut replies = Vec::new();
        for _ in 0..3 {
            let Json(response) = translate(State(state.clone()), Json(request(body.clone())))
                .await
                .unwrap();
            replies.push(response);
        }

        assert_eq!(
            replies[0].footer,
            "Requested by ada\n⚠️ Translations may contain mistakes."
        );
        assert_eq!(replies[0].markdown, "Hello|en>nb");
        assert_eq!(replies[1].markdown, "Hello|en>nb");
        assert!(replies[2]
            .markdown
            .starts_with("Hello|en>nb\n\n_Did you know we pay for every translation?_"));
        assert!(replies[2].markdown.contains("https://github.com/sponsors/adalinesimonian"));
    }

    #[tokio::test]
    async fn test_languages_and_detection_unavailable() {
        let Json(languages) = get_languages(State(state())).await;
        let codes: Vec<Language> = languages.data.iter().map(|l| l.code).collect();
        assert_eq!(codes, vec![Bokmal, English, Nynorsk]);
        assert_eq!(languages.data[2].translate_emoji.as_deref(), Some("translatenn"));

        let err = detect(
            State(state()),
            Json(DetectRequest {
                text: "hei".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::SERVICE_UNAVAILABLE);
    }
}
