use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::language::Locale;
use crate::logi;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs;

const STABILITY: f32 = 0.7;
const SIMILARITY_BOOST: f32 = 0.8;

pub fn voice_for(cfg: &Config, locale: Locale) -> &str {
    match locale {
        Locale::En => &cfg.voice_en,
        Locale::Id => &cfg.voice_id,
    }
}

fn request_body(cfg: &Config, text: &str) -> serde_json::Value {
    serde_json::json!({
        "text": text,
        "model_id": cfg.eleven_model_id,
        "voice_settings": {
            "stability": STABILITY,
            "similarity_boost": SIMILARITY_BOOST,
        },
    })
}

/// Synthesizes `text` with the locale's voice and writes the audio to
/// `out_mp3_path`.
pub async fn synthesize(
    client: &Client,
    cfg: &Config,
    text: &str,
    locale: Locale,
    out_mp3_path: &Path,
) -> Result<PathBuf> {
    logi("Generating voice-over...");
    let url = format!(
        "https://api.elevenlabs.io/v1/text-to-speech/{}",
        voice_for(cfg, locale)
    );

    let resp = client
        .post(url)
        .header("Content-Type", "application/json")
        .header("xi-api-key", &cfg.elevenlabs_api_key)
        .json(&request_body(cfg, text))
        .timeout(std::time::Duration::from_secs(300))
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(PipelineError::Synthesis {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = resp.bytes().await?;
    if let Some(parent) = out_mp3_path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(out_mp3_path, &bytes).await?;

    Ok(out_mp3_path.to_path_buf())
}
