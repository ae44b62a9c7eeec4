//! Visual search terms for the stock footage query.

use crate::api::groq::{self, Completion};
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::outcome::BestEffort;
use crate::{logi, logok, logw};
use anyhow::Context;
use once_cell::sync::OnceCell;
use regex::Regex;
use reqwest::Client;

const KEYWORD_MAX_TOKENS: u32 = 100;
pub const MAX_MODEL_KEYWORDS: usize = 5;
pub const MAX_FALLBACK_KEYWORDS: usize = 3;
/// Model keywords must be longer than this.
pub const MODEL_MIN_LEN: usize = 3;
/// Fallback keywords must be longer than this.
pub const FALLBACK_MIN_LEN: usize = 5;

const KEYWORD_PROMPT: &str = "Extract only 5-10 SINGLE English words representing visual elements \
from this news script. No explanation, no numbers, no bullet points. \
Only return words separated by commas. Avoid violent or restricted terms. \
DO NOT USE INDONESIAN LANGUAGE, ONLY USE ENGLISH. DO NOT USE NUMBERS OR PUNCTUATION. \
Example: smoke, fire, night";

const STOP_WORDS: &[&str] = &[
    "dan", "di", "ke", "dari", "yang", "untuk", "ada", "ini", "itu", "ia", "dia", "akan",
    "dengan", "pada", "dalam", "the", "and", "in", "to", "for", "a", "of", "on", "is", "are",
];

const DEFAULT_KEYWORDS: &[&str] = &["breaking", "news"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keywords {
    pub words: Vec<String>,
}

impl Keywords {
    pub fn query(&self) -> String {
        self.words.join(" ")
    }

    fn default_phrase() -> Self {
        Self {
            words: DEFAULT_KEYWORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

/// Asks the model for visual keywords; falls back to local tokenization
/// when the request fails or yields nothing usable.
pub async fn extract_keywords(
    client: &Client,
    cfg: &Config,
    narration: &str,
) -> BestEffort<Keywords> {
    logi("Extracting keywords with Groq LLM...");
    match model_keywords(client, cfg, narration).await {
        Ok(keywords) => {
            logok(format!("Cleaned keywords: {}", keywords.words.join(", ")));
            BestEffort::Primary(keywords)
        }
        Err(err) => {
            logw(format!("Keyword extraction failed: {}. Using fallback.", err));
            BestEffort::fallback(fallback_keywords(narration), err.to_string())
        }
    }
}

async fn model_keywords(client: &Client, cfg: &Config, narration: &str) -> Result<Keywords> {
    let completion = Completion {
        system: KEYWORD_PROMPT,
        user: narration,
        max_tokens: KEYWORD_MAX_TOKENS,
        temperature: None,
    };
    let raw = groq::chat_completion(client, cfg, &completion).await?;
    logi(format!("Raw LLM output: {}", raw));

    let words = clean_model_output(&raw);
    if words.is_empty() {
        return Err(PipelineError::Generation(
            "model returned no usable keywords".to_string(),
        ));
    }
    Ok(Keywords { words })
}

fn numbering_regex() -> anyhow::Result<&'static Regex> {
    static NUMBERING_RE: OnceCell<Regex> = OnceCell::new();
    NUMBERING_RE.get_or_try_init(|| {
        Regex::new(r"\d+[.)\]\s]*").context("failed to compile numbering regex")
    })
}

/// Strips list numbering and symbols from a comma-separated answer.
pub fn clean_model_output(raw: &str) -> Vec<String> {
    let without_numbers = match numbering_regex() {
        Ok(re) => re.replace_all(raw, "").into_owned(),
        Err(_) => raw.to_string(),
    };
    let letters_only: String = without_numbers
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace() || *c == ',')
        .collect();

    let tokens = letters_only
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|w| w.len() > MODEL_MIN_LEN)
        .map(|w| w.to_ascii_lowercase());

    dedupe_capped(tokens, MAX_MODEL_KEYWORDS)
}

/// Local extraction: long, non stop-word tokens from the narration.
pub fn fallback_keywords(narration: &str) -> Keywords {
    let lowered = narration.to_lowercase();
    let tokens = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > FALLBACK_MIN_LEN)
        .filter(|w| w.chars().all(|c| c.is_ascii_lowercase()))
        .filter(|w| !STOP_WORDS.contains(w))
        .map(str::to_string);

    let words = dedupe_capped(tokens, MAX_FALLBACK_KEYWORDS);
    if words.is_empty() {
        Keywords::default_phrase()
    } else {
        Keywords { words }
    }
}

fn dedupe_capped(tokens: impl Iterator<Item = String>, cap: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(cap);
    for token in tokens {
        if out.len() >= cap {
            break;
        }
        if !out.contains(&token) {
            out.push(token);
        }
    }
    out
}
