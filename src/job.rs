//! One URL processed end to end.

use crate::api::elevenlabs;
use crate::captions::CaptionSegment;
use crate::composer::{self, Background};
use crate::config::Config;
use crate::error::Result;
use crate::fetcher;
use crate::footage::{self, FootageOptions};
use crate::keywords;
use crate::language::{self, Locale};
use crate::script;
use crate::transcribe::{Transcriber, WhisperCli};
use crate::{logi, logok, logw};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use reqwest::Client;
use std::path::PathBuf;
use tokio::fs;

/// State accumulated while a URL moves through the pipeline.
#[derive(Debug, Clone)]
pub struct Job {
    pub url: String,
    pub id: String,
    pub source_video: Option<PathBuf>,
    pub transcript: Option<String>,
    pub locale: Locale,
    pub script: Option<String>,
    pub narration_audio: Option<PathBuf>,
    pub background: Background,
    pub captions: Vec<CaptionSegment>,
    pub output: Option<PathBuf>,
}

impl Job {
    pub fn new(url: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            id: id.into(),
            source_video: None,
            transcript: None,
            locale: Locale::default(),
            script: None,
            narration_audio: None,
            background: Background::None,
            captions: Vec::new(),
            output: None,
        }
    }

    /// Files this job created under the temp directory.
    pub fn temp_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self
            .source_video
            .iter()
            .chain(self.narration_audio.iter())
            .cloned()
            .collect();
        if let Background::Montage { clips } = &self.background {
            files.extend(clips.iter().map(|c| c.path.clone()));
        }
        files
    }
}

pub fn output_file_name(id: &str, now: DateTime<Local>) -> String {
    format!("viral_{}_{}.mp4", id, now.format("%Y%m%d_%H%M%S"))
}

#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Runs every stage for `job`, returning the rendered video path.
    async fn run(&self, job: &mut Job) -> Result<PathBuf>;
}

pub struct Pipeline {
    cfg: Config,
    client: Client,
    transcriber: Box<dyn Transcriber>,
    footage: FootageOptions,
}

impl Pipeline {
    pub fn new(cfg: Config, client: Client) -> Self {
        let transcriber = Box::new(WhisperCli::from_config(&cfg));
        Self {
            cfg,
            client,
            transcriber,
            footage: FootageOptions::default(),
        }
    }

    pub fn with_transcriber(mut self, transcriber: Box<dyn Transcriber>) -> Self {
        self.transcriber = transcriber;
        self
    }

    async fn cleanup(&self, job: &Job) {
        for path in job.temp_files() {
            if let Err(err) = fs::remove_file(&path).await {
                logw(format!("Could not remove {}: {}", path.display(), err));
            }
        }
    }
}

#[async_trait]
impl JobRunner for Pipeline {
    async fn run(&self, job: &mut Job) -> Result<PathBuf> {
        let cfg = &self.cfg;
        logi(format!("Processing video: {}", job.id));

        let video = fetcher::download_video(cfg, &job.url, &job.id).await?;
        job.source_video = Some(video.clone());

        let transcript = self.transcriber.transcribe(&video).await?;
        job.transcript = Some(transcript.clone());

        let detected = language::detect_locale(&transcript);
        if let crate::outcome::BestEffort::Fallback { reason, .. } = &detected {
            logw(format!("Language detection fell back to English: {}", reason));
        }
        job.locale = detected.into_inner();
        logi(format!("Detected language: {}", job.locale.display_name()));

        let narration = script::generate_script(&self.client, cfg, &transcript, job.locale).await?;
        let preview: String = narration.chars().take(100).collect();
        logi(format!("Generated script: {}...", preview));
        job.script = Some(narration.clone());

        let voiceover = cfg.temp_dir.join(format!("voiceover_{}.mp3", job.id));
        let voiceover =
            elevenlabs::synthesize(&self.client, cfg, &narration, job.locale, &voiceover).await?;
        job.narration_audio = Some(voiceover.clone());

        let keywords = keywords::extract_keywords(&self.client, cfg, &narration)
            .await
            .into_inner();

        let background = footage::fetch_background(
            &self.client,
            cfg,
            &job.id,
            &keywords.query(),
            &self.footage,
        )
        .await;
        if background.is_fallback() {
            logw("Pexels video not found, using fallback");
        }
        job.background = background.into_inner();

        let output = cfg
            .output_dir
            .join(output_file_name(&job.id, Local::now()));
        let rendered =
            composer::compose(cfg, &job.id, &voiceover, &job.background, &narration, &output)
                .await?;
        job.captions = rendered.captions;
        job.output = Some(rendered.output.clone());

        self.cleanup(job).await;
        logok(format!("Finished {}", job.id));
        Ok(rendered.output)
    }
}
