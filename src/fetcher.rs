//! Source video download through yt-dlp.

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::logi;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::instrument;

const MOBILE_USER_AGENT: &str =
    "Mozilla/5.0 (iPhone; CPU iPhone OS 14_0 like Mac OS X) AppleWebKit/605.1.15";
const DOWNLOAD_RETRIES: u32 = 3;
const FRAGMENT_RETRIES: u32 = 5;
const SOCKET_TIMEOUT_SECS: u32 = 15;

pub fn video_path(cfg: &Config, id: &str) -> PathBuf {
    cfg.temp_dir.join(format!("video_{}.mp4", id))
}

fn ytdlp_args(url: &str, target: &Path) -> Vec<String> {
    vec![
        "--format".to_string(),
        "best".to_string(),
        "--output".to_string(),
        target.display().to_string(),
        "--no-playlist".to_string(),
        "--add-header".to_string(),
        format!("User-Agent:{}", MOBILE_USER_AGENT),
        "--retries".to_string(),
        DOWNLOAD_RETRIES.to_string(),
        "--fragment-retries".to_string(),
        FRAGMENT_RETRIES.to_string(),
        "--socket-timeout".to_string(),
        SOCKET_TIMEOUT_SECS.to_string(),
        "--force-overwrites".to_string(),
        url.to_string(),
    ]
}

/// Downloads `url` into the temp directory as `video_<id>.mp4`.
///
/// Every failure is reported as [`PipelineError::Fetch`] carrying the URL,
/// except a missing yt-dlp binary.
#[instrument(skip(cfg))]
pub async fn download_video(cfg: &Config, url: &str, id: &str) -> Result<PathBuf> {
    logi(format!("Downloading from: {}", url));
    let target = video_path(cfg, id);
    tokio::fs::create_dir_all(&cfg.temp_dir).await?;

    let result = Command::new("yt-dlp")
        .args(ytdlp_args(url, &target))
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PipelineError::ToolNotFound("yt-dlp".into()));
        }
        Err(e) => {
            return Err(PipelineError::Fetch {
                url: url.to_string(),
                message: format!("yt-dlp execution failed: {e}"),
            });
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PipelineError::Fetch {
            url: url.to_string(),
            message: stderr.trim().to_string(),
        });
    }

    if !target.exists() {
        return Err(PipelineError::Fetch {
            url: url.to_string(),
            message: format!("expected output {} is missing", target.display()),
        });
    }

    Ok(target)
}
