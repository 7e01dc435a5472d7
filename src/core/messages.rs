//! Localized texts shown to the person who requested a translation

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::core::language::Language;
use crate::core::models::TranslationOutput;

/// Interface language of a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DisplayLanguage {
    #[default]
    #[serde(rename = "no", alias = "nn")]
    Norwegian,
    #[serde(rename = "en")]
    English,
}

/// Caller-facing messages
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    RateLimited(Duration),
    TranslationTooLong,
    TranslationError,
    SameLanguage,
    NoRoute,
    UnsupportedLanguage(String),
    Translated { from: Language, to: Language },
    UsesRemaining(u32),
    RequestedBy(String),
    InaccuracyWarning,
    DonationPrompt,
}

impl Message {
    pub fn render(&self, display: DisplayLanguage) -> String {
        match display {
            DisplayLanguage::Norwegian => self.render_nn(),
            DisplayLanguage::English => self.render_en(),
        }
    }

    fn render_nn(&self) -> String {
        let display = DisplayLanguage::Norwegian;
        match self {
            Message::RateLimited(wait) => format!(
                "Du har brukt denne kommandoen for mykje i det siste. Prøv igjen {}.",
                format_wait(*wait, display)
            ),
            Message::TranslationTooLong => {
                "Omsett tekst er for lang til å bli sendt. Prøv å korta ned teksten.".to_string()
            }
            Message::TranslationError => {
                "Det skjedde ein feil under omsetjinga. Prøv igjen seinare.".to_string()
            }
            Message::SameLanguage => {
                "Kan ikkje omsetja til same språk som originalteksten.".to_string()
            }
            Message::NoRoute => "Denne omsetjinga er ikkje tilgjengeleg.".to_string(),
            Message::UnsupportedLanguage(code) => format!("Ukjent språk: {}", code),
            Message::Translated { from, to } => {
                format!("Omset frå {} til {}", from.name(display), to.name(display))
            }
            Message::UsesRemaining(n) => format!(
                "Du har {} {} igjen før du må venta ei stund.",
                n,
                if *n == 1 { "omsetjing" } else { "omsetjingar" }
            ),
            Message::RequestedBy(user) => format!("Spurd av {}", user),
            Message::InaccuracyWarning => "⚠️ Omsetjingane kan innehalda feil.".to_string(),
            Message::DonationPrompt => concat!(
                "_Visste du at me betalar for kvar omsetjing?_\n",
                "_Hjelp oss med å tilby omsetjingar [ved å donera til Ada](https://github.com/sponsors/adalinesimonian)._"
            )
            .to_string(),
        }
    }

    fn render_en(&self) -> String {
        let display = DisplayLanguage::English;
        match self {
            Message::RateLimited(wait) => format!(
                "You have used this command too much recently. Try again {}.",
                format_wait(*wait, display)
            ),
            Message::TranslationTooLong => {
                "Translated text is too long to be sent. Try shortening the text.".to_string()
            }
            Message::TranslationError => {
                "An error occurred during translation. Try again later.".to_string()
            }
            Message::SameLanguage => {
                "Cannot translate to the same language as the original text.".to_string()
            }
            Message::NoRoute => "This translation is not available.".to_string(),
            Message::UnsupportedLanguage(code) => format!("Unknown language: {}", code),
            Message::Translated { from, to } => format!(
                "Translated from {} to {}",
                from.name(display),
                to.name(display)
            ),
            Message::UsesRemaining(n) => format!(
                "You have {} {} left before you have to wait a while.",
                n,
                if *n == 1 { "translation" } else { "translations" }
            ),
            Message::RequestedBy(user) => format!("Requested by {}", user),
            Message::InaccuracyWarning => "⚠️ Translations may contain mistakes.".to_string(),
            Message::DonationPrompt => concat!(
                "_Did you know we pay for every translation?_\n",
                "_Help us offer translations by [donating to Ada](https://github.com/sponsors/adalinesimonian)._"
            )
            .to_string(),
        }
    }
}

/// A translated reply split the way a chat embed shows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub title: Option<String>,
    pub body: String,
    pub footer: String,
}

impl Reply {
    /// Compose the reply for an output.
    ///
    /// `requested_by` is set when someone else triggered the translation for
    /// the author, e.g. through a reaction.
    pub fn compose(
        output: &TranslationOutput,
        display: DisplayLanguage,
        max_chars: usize,
        requested_by: Option<&str>,
        donation_prompt: bool,
    ) -> Self {
        let title = output
            .source
            .map(|from| Message::Translated { from, to: output.target }.render(display));

        let mut body = output.display_text(max_chars);
        if donation_prompt {
            body.push_str("\n\n");
            body.push_str(&Message::DonationPrompt.render(display));
        }

        let warning = Message::InaccuracyWarning.render(display);
        let footer = match (output.uses_left, requested_by) {
            (Some(left), Some(user)) => format!(
                "@{} {}\n{}",
                user,
                Message::UsesRemaining(left).render(display),
                warning
            ),
            (Some(left), None) => format!("{}\n{}", Message::UsesRemaining(left).render(display), warning),
            (None, Some(user)) => format!("{}\n{}", Message::RequestedBy(user.to_string()).render(display), warning),
            (None, None) => warning,
        };

        Self { title, body, footer }
    }
}

/// Picks every `every`-th expensive reply for the donation prompt
#[derive(Debug)]
pub struct DonationPrompter {
    every: u64,
    expensive_replies: AtomicU64,
}

impl Default for DonationPrompter {
    fn default() -> Self {
        Self::new(3)
    }
}

impl DonationPrompter {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            expensive_replies: AtomicU64::new(0),
        }
    }

    /// Cheap replies never carry the prompt and do not advance the count
    pub fn should_prompt(&self, expensive: bool) -> bool {
        if !expensive {
            return false;
        }
        let n = self.expensive_replies.fetch_add(1, Ordering::Relaxed) + 1;
        n % self.every == 0
    }
}

/// Render a wait time as future relative time ("in 5 minutes", "om 2 timar")
pub fn format_wait(wait: Duration, display: DisplayLanguage) -> String {
    let seconds = (wait.as_millis() as f64 / 1000.0).round() as u64;

    let (value, unit) = if seconds > 60 * 60 {
        (round_div(seconds, 60 * 60), Unit::Hour)
    } else if seconds > 60 {
        (round_div(seconds, 60), Unit::Minute)
    } else {
        (seconds, Unit::Second)
    };

    match display {
        DisplayLanguage::Norwegian => {
            let unit = match unit {
                Unit::Hour if value == 1 => "time",
                Unit::Hour => "timar",
                Unit::Minute => "minutt",
                Unit::Second => "sekund",
            };
            format!("om {} {}", value, unit)
        }
        DisplayLanguage::English => {
            let unit = match unit {
                Unit::Hour => "hour",
                Unit::Minute => "minute",
                Unit::Second => "second",
            };
            let plural = if value == 1 { "" } else { "s" };
            format!("in {} {}{}", value, unit, plural)
        }
    }
}

enum Unit {
    Hour,
    Minute,
    Second,
}

fn round_div(value: u64, by: u64) -> u64 {
    (value + by / 2) / by
}
