use crate::outcome::BestEffort;
use whatlang::Lang;

/// Target language of the narration; drives prompt and voice selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Id,
}

impl Locale {
    pub fn tag(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Id => "id",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Locale::En => "English",
            Locale::Id => "Indonesian",
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Classifies `text` as Indonesian or English. Empty, undetectable or
/// ambiguous text yields the English fallback.
pub fn detect_locale(text: &str) -> BestEffort<Locale> {
    if text.trim().is_empty() {
        return BestEffort::fallback(Locale::default(), "empty transcript");
    }

    let Some(info) = whatlang::detect(text) else {
        return BestEffort::fallback(Locale::default(), "language not detectable");
    };
    if !info.is_reliable() {
        return BestEffort::fallback(
            Locale::default(),
            format!("ambiguous language (best guess {})", info.lang().eng_name()),
        );
    }

    match info.lang() {
        Lang::Ind => BestEffort::Primary(Locale::Id),
        _ => BestEffort::Primary(Locale::En),
    }
}
