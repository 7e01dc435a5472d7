//! Core data models for translation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::core::language::{Language, SourceLanguage};
use crate::core::sanitize::{sanitize, truncate};

/// Result of a single provider call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub text: String,
    pub detected_source: Option<Language>,
}

impl Translation {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            detected_source: None,
        }
    }

    pub fn with_detected(mut self, language: Option<Language>) -> Self {
        self.detected_source = language;
        self
    }
}

/// Translation request as handed to the router
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub text: String,
    pub source: SourceLanguage,
    pub target: Language,
    /// Visible to everyone in the channel. Private cheap translations skip rate limiting.
    pub public: bool,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, target: Language) -> Self {
        Self {
            text: text.into(),
            source: SourceLanguage::Auto,
            target,
            public: false,
        }
    }

    pub fn with_source(mut self, source: impl Into<SourceLanguage>) -> Self {
        self.source = source.into();
        self
    }

    pub fn public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }
}

/// Who is asking, and where. Partitions rate-limit accounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestScope {
    pub user_id: String,
    pub channel_id: String,
    pub guild_id: Option<String>,
    /// Holders of moderation capability are never rate limited
    pub privileged: bool,
}

impl RequestScope {
    pub fn new(user_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            channel_id: channel_id.into(),
            guild_id: None,
            privileged: false,
        }
    }

    pub fn in_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    pub fn privileged(mut self, privileged: bool) -> Self {
        self.privileged = privileged;
        self
    }
}

/// Cost tier of a request, selects the rate-limit policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostTier {
    Cheap,
    Expensive,
}

impl CostTier {
    pub fn from_expensive(expensive: bool) -> Self {
        if expensive {
            CostTier::Expensive
        } else {
            CostTier::Cheap
        }
    }
}

impl fmt::Display for CostTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostTier::Cheap => write!(f, "cheap"),
            CostTier::Expensive => write!(f, "expensive"),
        }
    }
}

/// Successful router result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationOutput {
    pub text: String,
    /// Language the text was actually translated from, when known
    pub source: Option<Language>,
    pub target: Language,
    pub expensive: bool,
    /// Remaining uses in the current window, when rate limiting applied to the request
    pub uses_left: Option<u32>,
    pub path: Vec<SourceLanguage>,
}

impl TranslationOutput {
    /// Escaped and length-capped text for chat replies
    pub fn display_text(&self, max_chars: usize) -> String {
        truncate(&sanitize(&self.text), max_chars)
    }
}

/// What the router did with a request
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    Translated(TranslationOutput),
    RateLimited {
        time_until_next_use: Duration,
        tier: CostTier,
    },
}

impl RouteOutcome {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, RouteOutcome::RateLimited { .. })
    }

    pub fn output(&self) -> Option<&TranslationOutput> {
        match self {
            RouteOutcome::Translated(output) => Some(output),
            RouteOutcome::RateLimited { .. } => None,
        }
    }
}
