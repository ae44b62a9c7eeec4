use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub groq_api_key: String,
    #[serde(default)]
    pub elevenlabs_api_key: String,
    #[serde(default)]
    pub pexels_api_key: String,
    #[serde(default = "default_groq_api_base")]
    pub groq_api_base: String,
    #[serde(default = "default_pexels_api_base")]
    pub pexels_api_base: String,
    #[serde(default = "default_groq_model")]
    pub groq_model: String,
    #[serde(default = "default_model_id")]
    pub eleven_model_id: String,
    #[serde(default = "default_voice_en")]
    pub voice_en: String,
    #[serde(default = "default_voice_id")]
    pub voice_id: String,
    #[serde(default = "default_whisper_bin")]
    pub whisper_bin: String,
    #[serde(default = "default_whisper_model")]
    pub whisper_model: PathBuf,
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_input_file")]
    pub input_file: PathBuf,
    #[serde(default = "default_fallback_video")]
    pub fallback_video: PathBuf,
    #[serde(default)]
    pub font_file: Option<PathBuf>,
}

fn default_groq_api_base() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_pexels_api_base() -> String {
    "https://api.pexels.com".to_string()
}

fn default_groq_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_voice_en() -> String {
    "zYcjlYFOd3taleS0gkk3".to_string()
}

fn default_voice_id() -> String {
    "3mAVBNEqop5UbHtD8oxQ".to_string()
}

fn default_whisper_bin() -> String {
    "whisper-cli".to_string()
}

fn default_whisper_model() -> PathBuf {
    PathBuf::from("models/ggml-base.bin")
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("temp")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_input_file() -> PathBuf {
    PathBuf::from("input_urls.txt")
}

fn default_fallback_video() -> PathBuf {
    PathBuf::from("stock_news_vertical.mp4")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            groq_api_key: String::new(),
            elevenlabs_api_key: String::new(),
            pexels_api_key: String::new(),
            groq_api_base: default_groq_api_base(),
            pexels_api_base: default_pexels_api_base(),
            groq_model: default_groq_model(),
            eleven_model_id: default_model_id(),
            voice_en: default_voice_en(),
            voice_id: default_voice_id(),
            whisper_bin: default_whisper_bin(),
            whisper_model: default_whisper_model(),
            temp_dir: default_temp_dir(),
            output_dir: default_output_dir(),
            input_file: default_input_file(),
            fallback_video: default_fallback_video(),
            font_file: None,
        }
    }
}

impl Config {
    /// Reads `path` if it exists, applies environment overrides and checks
    /// that every API credential is present.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if fs::metadata(path).await.is_ok() {
            let content = fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            Self::from_json(&content)?
        } else {
            Config::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse config JSON")
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let slots = [
            ("GROQ_API_KEY", &mut self.groq_api_key),
            ("ELEVENLABS_API_KEY", &mut self.elevenlabs_api_key),
            ("PEXELS_API_KEY", &mut self.pexels_api_key),
        ];
        for (key, slot) in slots {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *slot = value.trim().to_string();
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.groq_api_key.is_empty() {
            anyhow::bail!("config.json: groq_api_key missing (or set GROQ_API_KEY)");
        }
        if self.elevenlabs_api_key.is_empty() {
            anyhow::bail!("config.json: elevenlabs_api_key missing (or set ELEVENLABS_API_KEY)");
        }
        if self.pexels_api_key.is_empty() {
            anyhow::bail!("config.json: pexels_api_key missing (or set PEXELS_API_KEY)");
        }
        Ok(())
    }
}
