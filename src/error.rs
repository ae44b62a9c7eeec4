//! Error types for the per-job pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a single job.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Download failed ({url}): {message}")]
    Fetch { url: String, message: String },

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Script generation failed: {0}")]
    Generation(String),

    #[error("ElevenLabs error (HTTP {status}): {body}")]
    Synthesis { status: u16, body: String },

    #[error("Stock footage error: {0}")]
    Footage(String),

    #[error("Fallback video '{}' not found", .0.display())]
    FallbackMissing(PathBuf),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
