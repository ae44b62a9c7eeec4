use crate::api::groq::{self, Completion};
use crate::config::Config;
use crate::error::Result;
use crate::language::Locale;
use crate::logi;
use reqwest::Client;

const SCRIPT_MAX_TOKENS: u32 = 300;
const SCRIPT_TEMPERATURE: f32 = 0.7;

const PROMPT_EN: &str = "\
Create a viral news script for TikTok/YouTube Shorts, about 30 seconds long.
Structure:
1. Hook: a shocking opening line
2. Facts: who, when, where
3. Details: what happened
4. Closing: an emotional message
Use natural spoken English, at most 150 words. Do not use markdown.";

const PROMPT_ID: &str = "\
Buat narasi berita viral gaya TikTok/YouTube Shorts, durasi sekitar 30 detik.
Struktur:
1. Hook: kalimat pembuka yang mengejutkan
2. Fakta: siapa, kapan, di mana
3. Detail: bagaimana kejadiannya
4. Penutup: pesan emosional
Gunakan bahasa Indonesia yang natural, maksimal 150 kata. Jangan gunakan markdown.";

pub fn system_prompt(locale: Locale) -> &'static str {
    match locale {
        Locale::En => PROMPT_EN,
        Locale::Id => PROMPT_ID,
    }
}

/// Rewrites a transcript into a short narration in the given locale.
pub async fn generate_script(
    client: &Client,
    cfg: &Config,
    transcript: &str,
    locale: Locale,
) -> Result<String> {
    logi(format!("Generating script in {}...", locale.display_name()));
    let completion = Completion {
        system: system_prompt(locale),
        user: transcript,
        max_tokens: SCRIPT_MAX_TOKENS,
        temperature: Some(SCRIPT_TEMPERATURE),
    };
    groq::chat_completion(client, cfg, &completion).await
}
