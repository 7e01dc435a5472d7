//! Canonical language identifiers and provider code mapping
//!
//! The router works on [`Language`] only. Provider specific codes (Apertium's
//! ISO 639-3 codes, DeepL's upper-case source/target codes) are produced and
//! parsed here, at the edge.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::errors::TranslationError;
use crate::core::messages::DisplayLanguage;

/// A natural language variant known to the router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "nb")]
    Bokmal,
    #[serde(rename = "nn")]
    Nynorsk,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ar")]
    Arabic,
    #[serde(rename = "bg")]
    Bulgarian,
    #[serde(rename = "cs")]
    Czech,
    #[serde(rename = "da")]
    Danish,
    #[serde(rename = "de")]
    German,
    #[serde(rename = "el")]
    Greek,
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "et")]
    Estonian,
    #[serde(rename = "fi")]
    Finnish,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "hu")]
    Hungarian,
    #[serde(rename = "id")]
    Indonesian,
    #[serde(rename = "it")]
    Italian,
    #[serde(rename = "ja")]
    Japanese,
    #[serde(rename = "ko")]
    Korean,
    #[serde(rename = "lt")]
    Lithuanian,
    #[serde(rename = "lv")]
    Latvian,
    #[serde(rename = "nl")]
    Dutch,
    #[serde(rename = "pl")]
    Polish,
    #[serde(rename = "pt")]
    Portuguese,
    #[serde(rename = "ro")]
    Romanian,
    #[serde(rename = "ru")]
    Russian,
    #[serde(rename = "sk")]
    Slovak,
    #[serde(rename = "sl")]
    Slovenian,
    #[serde(rename = "sv")]
    Swedish,
    #[serde(rename = "tr")]
    Turkish,
    #[serde(rename = "uk")]
    Ukrainian,
    #[serde(rename = "zh")]
    Chinese,
}

/// Static per-language data
struct LanguageInfo {
    code: &'static str,
    name_nn: &'static str,
    name_en: &'static str,
    apertium: &'static str,
    deepl_source: Option<&'static str>,
    deepl_target: Option<&'static str>,
}

const fn info(
    code: &'static str,
    name_nn: &'static str,
    name_en: &'static str,
    apertium: &'static str,
    deepl_source: Option<&'static str>,
    deepl_target: Option<&'static str>,
) -> LanguageInfo {
    LanguageInfo {
        code,
        name_nn,
        name_en,
        apertium,
        deepl_source,
        deepl_target,
    }
}

impl Language {
    /// Every language, in a stable order
    pub const ALL: [Language; 31] = [
        Language::Bokmal,
        Language::Nynorsk,
        Language::English,
        Language::Arabic,
        Language::Bulgarian,
        Language::Czech,
        Language::Danish,
        Language::German,
        Language::Greek,
        Language::Spanish,
        Language::Estonian,
        Language::Finnish,
        Language::French,
        Language::Hungarian,
        Language::Indonesian,
        Language::Italian,
        Language::Japanese,
        Language::Korean,
        Language::Lithuanian,
        Language::Latvian,
        Language::Dutch,
        Language::Polish,
        Language::Portuguese,
        Language::Romanian,
        Language::Russian,
        Language::Slovak,
        Language::Slovenian,
        Language::Swedish,
        Language::Turkish,
        Language::Ukrainian,
        Language::Chinese,
    ];

    fn info(self) -> LanguageInfo {
        use Language::*;
        match self {
            Bokmal => info("nb", "bokmål", "Bokmål", "nob", Some("NB"), Some("NB")),
            Nynorsk => info("nn", "nynorsk", "Nynorsk", "nno", None, None),
            English => info("en", "engelsk", "English", "eng", Some("EN"), Some("EN-US")),
            Arabic => info("ar", "arabisk", "Arabic", "ara", Some("AR"), Some("AR")),
            Bulgarian => info("bg", "bulgarsk", "Bulgarian", "bul", Some("BG"), Some("BG")),
            Czech => info("cs", "tsjekkisk", "Czech", "ces", Some("CS"), Some("CS")),
            Danish => info("da", "dansk", "Danish", "dan", Some("DA"), Some("DA")),
            German => info("de", "tysk", "German", "deu", Some("DE"), Some("DE")),
            Greek => info("el", "gresk", "Greek", "ell", Some("EL"), Some("EL")),
            Spanish => info("es", "spansk", "Spanish", "spa", Some("ES"), Some("ES")),
            Estonian => info("et", "estisk", "Estonian", "est", Some("ET"), Some("ET")),
            Finnish => info("fi", "finsk", "Finnish", "fin", Some("FI"), Some("FI")),
            French => info("fr", "fransk", "French", "fra", Some("FR"), Some("FR")),
            Hungarian => info("hu", "ungarsk", "Hungarian", "hun", Some("HU"), Some("HU")),
            Indonesian => info("id", "indonesisk", "Indonesian", "ind", Some("ID"), Some("ID")),
            Italian => info("it", "italiensk", "Italian", "ita", Some("IT"), Some("IT")),
            Japanese => info("ja", "japansk", "Japanese", "jpn", Some("JA"), Some("JA")),
            Korean => info("ko", "koreansk", "Korean", "kor", Some("KO"), Some("KO")),
            Lithuanian => info("lt", "litauisk", "Lithuanian", "lit", Some("LT"), Some("LT")),
            Latvian => info("lv", "latvisk", "Latvian", "lav", Some("LV"), Some("LV")),
            Dutch => info("nl", "nederlandsk", "Dutch", "nld", Some("NL"), Some("NL")),
            Polish => info("pl", "polsk", "Polish", "pol", Some("PL"), Some("PL")),
            Portuguese => info("pt", "portugisisk", "Portuguese", "por", Some("PT"), Some("PT-PT")),
            Romanian => info("ro", "rumensk", "Romanian", "ron", Some("RO"), Some("RO")),
            Russian => info("ru", "russisk", "Russian", "rus", Some("RU"), Some("RU")),
            Slovak => info("sk", "slovakisk", "Slovak", "slk", Some("SK"), Some("SK")),
            Slovenian => info("sl", "slovensk", "Slovenian", "slv", Some("SL"), Some("SL")),
            Swedish => info("sv", "svensk", "Swedish", "swe", Some("SV"), Some("SV")),
            Turkish => info("tr", "tyrkisk", "Turkish", "tur", Some("TR"), Some("TR")),
            Ukrainian => info("uk", "ukrainsk", "Ukrainian", "ukr", Some("UK"), Some("UK")),
            Chinese => info("zh", "kinesisk", "Chinese", "zho", Some("ZH"), Some("ZH")),
        }
    }

    /// Canonical ISO 639-1 code
    pub fn code(self) -> &'static str {
        self.info().code
    }

    /// Display name in the given interface language
    pub fn name(self, display: DisplayLanguage) -> &'static str {
        let info = self.info();
        match display {
            DisplayLanguage::Norwegian => info.name_nn,
            DisplayLanguage::English => info.name_en,
        }
    }

    /// ISO 639-3 code as used by Apertium
    pub fn apertium_code(self) -> &'static str {
        self.info().apertium
    }

    /// DeepL `source_lang` code, if DeepL accepts this language as input
    pub fn deepl_source_code(self) -> Option<&'static str> {
        self.info().deepl_source
    }

    /// DeepL `target_lang` code, if DeepL can produce this language
    pub fn deepl_target_code(self) -> Option<&'static str> {
        self.info().deepl_target
    }

    pub fn from_code(code: &str) -> Option<Language> {
        let code = code.trim().to_lowercase();
        Language::ALL.into_iter().find(|l| l.code() == code)
    }

    pub fn from_apertium_code(code: &str) -> Option<Language> {
        let code = code.trim().to_lowercase();
        Language::ALL.into_iter().find(|l| l.apertium_code() == code)
    }

    /// Parse a DeepL code, source or target flavour (`EN`, `EN-GB`, `pt-br`)
    pub fn from_deepl_code(code: &str) -> Option<Language> {
        let base = code.trim().split('-').next().unwrap_or_default();
        Language::ALL
            .into_iter()
            .find(|l| l.deepl_source_code().is_some_and(|c| c.eq_ignore_ascii_case(base)))
    }

    /// Emoji name used for reaction-triggered translation into this language
    pub fn emoji(self, kind: EmojiKind) -> Option<&'static str> {
        let (translate, done) = match self {
            Language::English => ("translateen", "translateendone"),
            Language::Bokmal => ("translatenb", "translatenbdone"),
            Language::Nynorsk => ("translatenn", "translatenndone"),
            _ => return None,
        };
        Some(match kind {
            EmojiKind::Translate => translate,
            EmojiKind::Done => done,
        })
    }

    /// Reverse of [`Language::emoji`]. Without a kind, either emoji matches.
    pub fn from_emoji(name: &str, kind: Option<EmojiKind>) -> Option<Language> {
        let kinds: &[EmojiKind] = match kind {
            Some(EmojiKind::Translate) => &[EmojiKind::Translate],
            Some(EmojiKind::Done) => &[EmojiKind::Done],
            None => &[EmojiKind::Translate, EmojiKind::Done],
        };

        Language::ALL.into_iter().find(|lang| {
            kinds
                .iter()
                .any(|k| lang.emoji(*k).is_some_and(|emoji| emoji == name))
        })
    }

    /// Language assumed when detection gives nothing usable
    pub fn fallback_source_for(target: Language) -> Language {
        if target == Language::English {
            Language::Bokmal
        } else {
            Language::English
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Language {
    type Err = TranslationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        if needle == "no" || needle == "nob" {
            return Ok(Language::Bokmal);
        }
        if needle == "nno" {
            return Ok(Language::Nynorsk);
        }

        Language::from_code(&needle)
            .or_else(|| {
                Language::ALL.into_iter().find(|l| {
                    l.name(DisplayLanguage::English).to_lowercase() == needle
                        || l.name(DisplayLanguage::Norwegian) == needle
                })
            })
            .ok_or_else(|| TranslationError::UnsupportedLanguage {
                code: s.to_string(),
            })
    }
}

/// Reaction emoji kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmojiKind {
    /// Added by a user to request a translation
    Translate,
    /// Added by the bot once the translation is posted
    Done,
}

/// Source side of a translation: a known language or "let the provider detect"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SourceLanguage {
    Auto,
    Known(Language),
}

impl SourceLanguage {
    pub fn known(self) -> Option<Language> {
        match self {
            SourceLanguage::Auto => None,
            SourceLanguage::Known(lang) => Some(lang),
        }
    }

    pub fn is_auto(self) -> bool {
        matches!(self, SourceLanguage::Auto)
    }
}

impl From<Language> for SourceLanguage {
    fn from(lang: Language) -> Self {
        SourceLanguage::Known(lang)
    }
}

impl fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLanguage::Auto => write!(f, "auto"),
            SourceLanguage::Known(lang) => write!(f, "{}", lang),
        }
    }
}

impl FromStr for SourceLanguage {
    type Err = TranslationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(SourceLanguage::Auto)
        } else {
            s.parse().map(SourceLanguage::Known)
        }
    }
}

impl TryFrom<String> for SourceLanguage {
    type Error = TranslationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SourceLanguage> for String {
    fn from(value: SourceLanguage) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes_and_names() {
        assert_eq!("nb".parse::<Language>().unwrap(), Language::Bokmal);
        assert_eq!("no".parse::<Language>().unwrap(), Language::Bokmal);
        assert_eq!("NN".parse::<Language>().unwrap(), Language::Nynorsk);
        assert_eq!("English".parse::<Language>().unwrap(), Language::English);
        assert_eq!("nynorsk".parse::<Language>().unwrap(), Language::Nynorsk);
        assert_eq!("tysk".parse::<Language>().unwrap(), Language::German);
        assert!("klingon".parse::<Language>().is_err());
    }

    #[test]
    fn test_source_language_parse() {
        assert_eq!("auto".parse::<SourceLanguage>().unwrap(), SourceLanguage::Auto);
        assert_eq!(
            "en".parse::<SourceLanguage>().unwrap(),
            SourceLanguage::Known(Language::English)
        );
        assert_eq!(SourceLanguage::Auto.to_string(), "auto");
    }

    #[test]
    fn test_provider_codes() {
        assert_eq!(Language::Bokmal.apertium_code(), "nob");
        assert_eq!(Language::Nynorsk.apertium_code(), "nno");
        assert_eq!(Language::from_apertium_code("nno"), Some(Language::Nynorsk));
        assert_eq!(Language::from_apertium_code("xyz"), None);

        assert_eq!(Language::English.deepl_target_code(), Some("EN-US"));
        assert_eq!(Language::Nynorsk.deepl_source_code(), None);
        assert_eq!(Language::from_deepl_code("EN"), Some(Language::English));
        assert_eq!(Language::from_deepl_code("pt-BR"), Some(Language::Portuguese));
        assert_eq!(Language::from_deepl_code("NB"), Some(Language::Bokmal));
    }

    #[test]
    fn test_codes_are_unique() {
        for (i, a) in Language::ALL.iter().enumerate() {
            for b in &Language::ALL[i + 1..] {
                assert_ne!(a.code(), b.code());
                assert_ne!(a.apertium_code(), b.apertium_code());
            }
        }
    }

    #[test]
    fn test_emoji_lookup() {
        assert_eq!(Language::Nynorsk.emoji(EmojiKind::Translate), Some("translatenn"));
        assert_eq!(Language::German.emoji(EmojiKind::Translate), None);
        assert_eq!(
            Language::from_emoji("translateendone", None),
            Some(Language::English)
        );
        assert_eq!(
            Language::from_emoji("translateendone", Some(EmojiKind::Translate)),
            None
        );
        assert_eq!(
            Language::from_emoji("translatenb", Some(EmojiKind::Translate)),
            Some(Language::Bokmal)
        );
    }

    #[test]
    fn test_serde_uses_codes() {
        let json = serde_json::to_string(&Language::Nynorsk).unwrap();
        assert_eq!(json, "\"nn\"");
        let source: SourceLanguage = serde_json::from_str("\"auto\"").unwrap();
        assert!(source.is_auto());
        assert!(serde_json::from_str::<SourceLanguage>("\"xx\"").is_err());
    }

    #[test]
    fn test_fallback_source() {
        assert_eq!(Language::fallback_source_for(Language::English), Language::Bokmal);
        assert_eq!(Language::fallback_source_for(Language::Nynorsk), Language::English);
    }
}
