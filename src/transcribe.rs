//! Speech recognition through the whisper.cpp command line tool.

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::ffmpeg;
use crate::logi;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, instrument};

#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Full-file transcription of the media's audio track.
    async fn transcribe(&self, media: &Path) -> Result<String>;
}

pub struct WhisperCli {
    pub binary: String,
    pub model_path: PathBuf,
    pub work_dir: PathBuf,
}

impl WhisperCli {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            binary: cfg.whisper_bin.clone(),
            model_path: cfg.whisper_model.clone(),
            work_dir: cfg.temp_dir.clone(),
        }
    }

    async fn run_whisper(&self, wav: &Path) -> Result<String> {
        if !self.model_path.exists() {
            return Err(PipelineError::Transcription(format!(
                "Model not found: {}",
                self.model_path.display()
            )));
        }

        let output = Command::new(&self.binary)
            .arg("-m")
            .arg(&self.model_path)
            .arg("-f")
            .arg(wav)
            .arg("-nt")
            .output()
            .await;

        let output = match output {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PipelineError::ToolNotFound(self.binary.clone()));
            }
            Err(e) => {
                return Err(PipelineError::Transcription(format!(
                    "Failed to run whisper: {e}"
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::Transcription(format!(
                "Whisper failed: {}",
                stderr.trim()
            )));
        }

        Ok(join_transcript_lines(&String::from_utf8_lossy(&output.stdout)))
    }
}

#[async_trait]
impl Transcriber for WhisperCli {
    #[instrument(skip(self), fields(media = %media.display()))]
    async fn transcribe(&self, media: &Path) -> Result<String> {
        logi("Transcribing audio...");
        let stem = media
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("audio");
        let wav = self.work_dir.join(format!("{}.wav", stem));

        ffmpeg::ffmpeg_extract_wav(media, &wav).await?;
        let result = self.run_whisper(&wav).await;
        let _ = tokio::fs::remove_file(&wav).await;

        let text = result?;
        debug!("transcript has {} chars", text.len());
        Ok(text)
    }
}

/// Whisper prints one segment per line; the pipeline wants a single
/// paragraph.
fn join_transcript_lines(stdout: &str) -> String {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
