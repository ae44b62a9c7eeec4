use crate::config::Config;
use crate::{logi, logw};
use anyhow::Result;
use std::path::Path;
use tokio::fs;

pub async fn ensure_directories(cfg: &Config) -> Result<()> {
    for dir in [&cfg.temp_dir, &cfg.output_dir] {
        if !Path::new(dir).exists() {
            fs::create_dir_all(dir).await?;
            logi(format!("Created directory: {}", dir.display()));
        }
    }
    Ok(())
}

pub async fn tool_available(binary: &str, version_flag: &str) -> bool {
    match tokio::process::Command::new(binary)
        .arg(version_flag)
        .output()
        .await
    {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

/// Warns about every external tool the pipeline shells out to that is not
/// runnable. Returns the missing names.
pub async fn check_tools(cfg: &Config) -> Vec<String> {
    let tools = [
        ("ffmpeg", "-version"),
        ("ffprobe", "-version"),
        ("yt-dlp", "--version"),
        (cfg.whisper_bin.as_str(), "--help"),
    ];

    let mut missing = Vec::new();
    for (binary, flag) in tools {
        if !tool_available(binary, flag).await {
            logw(format!("{} not found in PATH. Please install it.", binary));
            missing.push(binary.to_string());
        }
    }
    missing
}
