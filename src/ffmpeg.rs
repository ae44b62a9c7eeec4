use crate::error::{PipelineError, Result};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

pub const FRAME_WIDTH: u32 = 1080;
pub const FRAME_HEIGHT: u32 = 1920;

pub async fn run_cmd(args: &[String]) -> Result<()> {
    if args.is_empty() {
        return Ok(());
    }

    debug!("running {:?}", args);
    let mut cmd = Command::new(&args[0]);
    if args.len() > 1 {
        cmd.args(&args[1..]);
    }

    let output = match cmd.stdout(Stdio::null()).stderr(Stdio::piped()).output().await {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PipelineError::ToolNotFound(args[0].clone()));
        }
        Err(e) => return Err(PipelineError::ToolFailed(format!("{}: {}", args[0], e))),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PipelineError::ToolFailed(format!(
            "{} exited with {}: {}",
            args[0],
            output.status,
            stderr.trim()
        )));
    }

    Ok(())
}

pub async fn ffprobe_duration_seconds(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .await;

    let output = match output {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PipelineError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => return Err(PipelineError::ToolFailed(format!("ffprobe: {e}"))),
    };

    if !output.status.success() {
        return Err(PipelineError::ToolFailed(format!(
            "ffprobe failed for {}",
            path.display()
        )));
    }

    parse_duration(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
        PipelineError::ToolFailed(format!("Invalid duration for {}", path.display()))
    })
}

fn parse_duration(text: &str) -> Option<f64> {
    let duration = text.trim().parse::<f64>().ok()?;
    if duration <= 0.1 || !duration.is_finite() {
        return None;
    }
    Some(duration)
}

/// Cuts the first `duration_s` seconds of `input` and scales them to the
/// canonical vertical frame, dropping audio.
pub async fn ffmpeg_fit_clip(input: &Path, duration_s: f64, out_mp4: &Path) -> Result<()> {
    let args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        input.display().to_string(),
        "-t".to_string(),
        format!("{:.3}", duration_s),
        "-vf".to_string(),
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},setsar=1",
            w = FRAME_WIDTH,
            h = FRAME_HEIGHT
        ),
        "-an".to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        out_mp4.display().to_string(),
    ];
    run_cmd(&args).await
}

pub async fn ffmpeg_concat_videos(list_txt: &Path, out_mp4: &Path) -> Result<()> {
    let args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        list_txt.display().to_string(),
        "-c".to_string(),
        "copy".to_string(),
        out_mp4.display().to_string(),
    ];
    run_cmd(&args).await
}

/// Extracts the audio track as 16 kHz mono PCM, the input format whisper
/// expects.
pub async fn ffmpeg_extract_wav(input: &Path, out_wav: &Path) -> Result<()> {
    let args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        input.display().to_string(),
        "-vn".to_string(),
        "-ac".to_string(),
        "1".to_string(),
        "-ar".to_string(),
        "16000".to_string(),
        "-c:a".to_string(),
        "pcm_s16le".to_string(),
        out_wav.display().to_string(),
    ];
    run_cmd(&args).await
}

/// Line for an ffmpeg concat demuxer list.
pub fn concat_list_entry(path: &Path) -> String {
    let escaped = path.display().to_string().replace('\'', "'\\''");
    format!("file '{}'\n", escaped)
}
