//! Omset - cost-aware translation router for Norwegian chat communities
//!
//! This library routes translation requests between Bokmål, Nynorsk, English
//! and the other languages DeepL supports, chaining the free Apertium pivot and
//! the metered DeepL API over the fewest hops, with per-user rate limiting for
//! the paid routes. It also ships a CLI and an HTTP API service.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod core;
pub mod providers;
pub mod server;

// Re-export key types for convenience
pub use self::core::{
    config::RouterConfig,
    errors::{Result, TranslationError},
    graph::{GraphBuilder, TranslationGraph, Translator},
    language::{Language, SourceLanguage},
    models::{RequestScope, RouteOutcome, TranslationOutput, TranslationRequest},
    rate_limiter::{RateLimitPolicy, RateLimiter},
    router::TranslationRouter,
};

pub use providers::{apertium::ApertiumClient, deepl::DeepLClient};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
