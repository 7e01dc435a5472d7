//! CLI command definitions and handlers

use clap::Subcommand;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use crate::core::config::RouterConfig;
use crate::core::language::{EmojiKind, Language, SourceLanguage};
use crate::core::messages::{DisplayLanguage, Message, Reply};
use crate::core::models::{RequestScope, RouteOutcome, TranslationRequest};
use crate::core::router::TranslationRouter;

/// Commands for the omset translation router
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Translate a piece of text
    Translate {
        /// Text to translate
        text: String,

        /// Source language (auto-detect if not specified)
        #[arg(short, long, default_value = "auto")]
        from: String,

        /// Target language code, name or translate emoji
        #[arg(short, long)]
        to: String,

        /// User the request is counted against
        #[arg(long, default_value = "cli")]
        user: String,

        /// Treat the reply as visible to everyone
        #[arg(long)]
        public: bool,

        /// Language of messages (no or en)
        #[arg(long, default_value = "no")]
        display: String,
    },

    /// Translate a file, one request per line
    Batch {
        /// Input file (required)
        #[arg(short, long)]
        file: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Source language (auto-detect if not specified)
        #[arg(long, default_value = "auto")]
        from: String,

        /// Target language
        #[arg(short, long)]
        to: String,

        /// Skip rate limiting for this run
        #[arg(long)]
        privileged: bool,
    },

    /// Identify the language of a text
    Detect {
        /// Text to identify
        text: String,
    },

    /// Show the hops a translation would take
    Route {
        /// Source language
        #[arg(short, long, default_value = "auto")]
        from: String,

        /// Target language
        #[arg(short, long)]
        to: String,
    },

    /// List languages reachable through the configured providers
    Languages,

    /// Start HTTP API server
    Server {
        /// Bind address (default: 0.0.0.0)
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Listen port (default: 8000)
        #[arg(short, long, default_value_t = 8000)]
        port: u16,

        /// Enable debug mode
        #[arg(long)]
        debug: bool,
    },
}

/// Counts from a batch run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub translated: usize,
    pub rate_limited: usize,
    pub failed: usize,
}

fn parse_target(value: &str) -> anyhow::Result<Language> {
    match Language::from_emoji(value.trim_matches(':'), Some(EmojiKind::Translate)) {
        Some(language) => Ok(language),
        None => Ok(value.parse()?),
    }
}

fn parse_display(value: &str) -> DisplayLanguage {
    match value {
        "en" => DisplayLanguage::English,
        _ => DisplayLanguage::Norwegian,
    }
}

/// Render an outcome the way a chat reply would read
pub fn format_outcome(outcome: &RouteOutcome, max_chars: usize, display: DisplayLanguage) -> String {
    match outcome {
        RouteOutcome::RateLimited {
            time_until_next_use,
            ..
        } => Message::RateLimited(*time_until_next_use).render(display),
        RouteOutcome::Translated(output) => {
            let reply = Reply::compose(output, display, max_chars, None, false);
            let mut lines = Vec::new();
            if let Some(title) = reply.title {
                lines.push(format!("**{}**", title));
            }
            lines.push(reply.body);
            lines.push(reply.footer);
            lines.join("\n")
        }
    }
}

/// Non-empty lines of a batch file
pub fn batch_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Translate each line in turn, keeping the original on failure
pub async fn translate_lines(
    router: &TranslationRouter,
    lines: &[String],
    source: SourceLanguage,
    target: Language,
    scope: &RequestScope,
    pb: &ProgressBar,
) -> (Vec<String>, BatchReport) {
    let mut report = BatchReport::default();
    let mut translated = Vec::with_capacity(lines.len());

    for line in lines {
        let request = TranslationRequest::new(line.clone(), target).with_source(source);

        match router.translate(&request, scope).await {
            Ok(RouteOutcome::Translated(output)) => {
                report.translated += 1;
                translated.push(output.text);
            }
            Ok(RouteOutcome::RateLimited {
                time_until_next_use,
                ..
            }) => {
                report.rate_limited += 1;
                pb.set_message(Message::RateLimited(time_until_next_use).render(DisplayLanguage::English));
                translated.push(line.clone());
            }
            Err(e) => {
                report.failed += 1;
                warn!("Failed to translate line: {}", e);
                translated.push(line.clone());
            }
        }
        pb.inc(1);
    }

    (translated, report)
}

fn default_output(file: &Path) -> PathBuf {
    let mut out = file.to_path_buf();
    let mut filename = file.file_name().unwrap_or_default().to_os_string();
    filename.push("_translated");
    out.set_file_name(filename);
    out
}

/// Handle single translation command
#[allow(clippy::too_many_arguments)]
pub async fn handle_translate(
    config: RouterConfig,
    text: String,
    from: String,
    to: String,
    user: String,
    public: bool,
    display: String,
) -> anyhow::Result<()> {
    let display = parse_display(&display);
    let source: SourceLanguage = from.parse()?;
    let target = parse_target(&to)?;

    let router = TranslationRouter::from_config(config)?;
    let request = TranslationRequest::new(text, target)
        .with_source(source)
        .public(public);
    let scope = RequestScope::new(user, "cli");

    match router.translate(&request, &scope).await {
        Ok(outcome) => {
            println!("{}", format_outcome(&outcome, router.config().max_text_length, display));
        }
        Err(e) => {
            eprintln!("❌ {}", e.user_message(display));
            return Err(e.into());
        }
    }

    Ok(())
}

/// Handle batch translation command
pub async fn handle_batch(
    config: RouterConfig,
    file: PathBuf,
    output: Option<PathBuf>,
    from: String,
    to: String,
    privileged: bool,
) -> anyhow::Result<()> {
    let start_time = Instant::now();

    let output = output.unwrap_or_else(|| default_output(&file));
    let source: SourceLanguage = from.parse()?;
    let target = parse_target(&to)?;

    info!("Starting batch translation");
    info!("Input: {}", file.display());
    info!("Output: {}", output.display());
    info!("Route: {} -> {}", source, target);

    let content = tokio::fs::read_to_string(&file).await?;
    let lines = batch_lines(&content);
    if lines.is_empty() {
        anyhow::bail!("No text found in {}", file.display());
    }

    let router = TranslationRouter::from_config(config)?;
    let scope = RequestScope::new("cli", "batch").privileged(privileged);

    // Create progress bar
    let pb = ProgressBar::new(lines.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("=>-"),
    );

    let (translated, report) = translate_lines(&router, &lines, source, target, &scope, &pb).await;
    pb.finish_with_message("Completed");

    tokio::fs::write(&output, translated.join("\n")).await?;

    let duration = start_time.elapsed();
    info!(
        "Completed: {} translated, {} rate limited, {} failed in {:?}",
        report.translated, report.rate_limited, report.failed, duration
    );

    println!("\n✅ Translation completed!");
    println!("   Translated: {}", report.translated);
    println!("   Rate limited: {}", report.rate_limited);
    println!("   Failed: {}", report.failed);
    println!("   Output: {}", output.display());
    println!("   Time: {:?}", duration);

    Ok(())
}

/// Handle language detection command
pub async fn handle_detect(config: RouterConfig, text: String) -> anyhow::Result<()> {
    let router = TranslationRouter::from_config(config)?;
    let Some(detector) = router.detector() else {
        anyhow::bail!("Language detection is disabled");
    };

    let candidates = detector.detect_languages(&text).await?;
    let shown: Vec<_> = candidates.iter().filter(|c| c.confidence > 0.5).take(3).collect();

    if shown.is_empty() {
        println!("🤷 Could not identify the language");
        return Ok(());
    }

    for candidate in shown {
        let name = candidate
            .language
            .map(|l| l.name(DisplayLanguage::English).to_string())
            .unwrap_or_else(|| candidate.code.clone());
        println!("{:<12} {:.0}%", name, candidate.confidence * 100.0);
    }

    Ok(())
}

/// Handle route inspection command
pub async fn handle_route(config: RouterConfig, from: String, to: String) -> anyhow::Result<()> {
    let source: SourceLanguage = from.parse()?;
    let target = parse_target(&to)?;

    let router = TranslationRouter::from_config(config)?;
    let pipeline = router.route(source, target);

    if pipeline.is_empty() {
        println!("❌ No route from {} to {}", source, target);
        return Ok(());
    }

    let path: Vec<String> = pipeline.path().iter().map(ToString::to_string).collect();
    println!("{}", path.join(" → "));
    for hop in pipeline.hops() {
        println!(
            "   {} → {} via {}{}",
            hop.from,
            hop.to,
            hop.provider(),
            if hop.expensive { " (expensive)" } else { "" }
        );
    }

    Ok(())
}

/// Handle languages listing command
pub async fn handle_languages(config: RouterConfig) -> anyhow::Result<()> {
    let router = TranslationRouter::from_config(config)?;

    for language in router.graph().languages() {
        println!(
            "{:<4} {:<12} {}",
            language.code(),
            language.name(DisplayLanguage::English),
            language.emoji(EmojiKind::Translate).unwrap_or_default()
        );
    }

    Ok(())
}

/// Handle server command
pub async fn handle_server(config: RouterConfig, host: String, port: u16, debug: bool) -> anyhow::Result<()> {
    use crate::server::api::run_server;

    if debug {
        std::env::set_var("RUST_LOG", "debug");
    }

    info!("Starting HTTP server on {}:{}", host, port);
    println!("🚀 Server starting on http://{}:{}", host, port);

    run_server(host, port, config).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::GraphBuilder;
    use crate::core::rate_limiter::RateLimiter;
    use crate::core::testing::MockTranslator;
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};
    use Language::*;

    fn router() -> TranslationRouter {
        let graph = GraphBuilder::new()
            .register(MockTranslator::expensive("deepl", &[English, Bokmal], &[English, Bokmal]).arc())
            .register(MockTranslator::cheap("apertium", &[Bokmal, Nynorsk], &[Bokmal, Nynorsk]).arc())
            .build()
            .unwrap();
        TranslationRouter::new(graph, Arc::new(RateLimiter::default()), None, RouterConfig::default())
    }

    #[test]
    fn test_parse_target_accepts_emoji() {
        assert_eq!(assert_ok!(parse_target(":translatenb:")), Bokmal);
        assert_eq!(assert_ok!(parse_target("English")), English);
        assert_err!(parse_target("translatenbdone"));
    }

    #[test]
    fn test_batch_lines_skip_blank() {
        assert_eq!(batch_lines("hei\n\n  \nverda \n"), vec!["hei", "verda"]);
    }

    #[test]
    fn test_default_output_name() {
        assert_eq!(
            default_output(Path::new("/tmp/input.txt")),
            PathBuf::from("/tmp/input.txt_translated")
        );
    }

    #[test]
    fn test_batch_keeps_original_when_rate_limited() {
        let router = router();
        let lines = batch_lines("one\ntwo\nthree\nfour");
        let scope = RequestScope::new("cli", "batch");

        let (translated, report) = tokio_test::block_on(translate_lines(
            &router,
            &lines,
            English.into(),
            Nynorsk,
            &scope,
            &ProgressBar::hidden(),
        ));

        assert_eq!(
            report,
            BatchReport {
                translated: 3,
                rate_limited: 1,
                failed: 0
            }
        );
        assert_eq!(translated[0], "one|en>nb|nb>nn");
        assert_eq!(translated[3], "four");
    }

    #[test]
    fn test_format_outcome() {
        let router = router();
        let scope = RequestScope::new("cli", "cli");
        let request = TranslationRequest::new("hei_du", Nynorsk).with_source(Bokmal);

        let outcome = assert_ok!(tokio_test::block_on(router.translate(&request, &scope)));
        assert_eq!(
            format_outcome(&outcome, 1800, DisplayLanguage::Norwegian),
            "**Omset frå bokmål til nynorsk**\nhei\\_du|nb>nn\n⚠️ Omsetjingane kan innehalda feil."
        );
    }
}
