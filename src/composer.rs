//! Final render: background, captions and narration into one vertical MP4.

use crate::captions::{self, CaptionSegment};
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::ffmpeg::{self, FRAME_HEIGHT, FRAME_WIDTH};
use crate::{logi, logok, logw};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub const OUTPUT_FPS: u32 = 24;
const ENCODE_PRESET: &str = "ultrafast";
const ENCODE_THREADS: u32 = 4;

/// A trimmed, frame-sized stock clip.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundClip {
    pub path: PathBuf,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Background {
    Montage { clips: Vec<BackgroundClip> },
    SingleFile { path: PathBuf },
    None,
}

/// What the compositor actually reads from disk.
#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundSource<'a> {
    Montage(&'a [BackgroundClip]),
    File(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundFit {
    Trim,
    Loop,
}

/// Backgrounds at least as long as the narration are cut, shorter ones are
/// looped until the narration ends.
pub fn fit_background(background_duration: f64, narration_duration: f64) -> BackgroundFit {
    if background_duration >= narration_duration {
        BackgroundFit::Trim
    } else {
        BackgroundFit::Loop
    }
}

pub fn montage_duration(clips: &[BackgroundClip]) -> f64 {
    clips.iter().map(|c| c.duration).sum()
}

/// Picks the montage, then an existing single file, then the configured
/// fallback video. A missing fallback is fatal.
pub fn select_background_source<'a>(
    cfg: &Config,
    background: &'a Background,
) -> Result<BackgroundSource<'a>> {
    match background {
        Background::Montage { clips } if !clips.is_empty() => {
            return Ok(BackgroundSource::Montage(clips));
        }
        Background::SingleFile { path } if path.is_file() => {
            return Ok(BackgroundSource::File(path.clone()));
        }
        _ => {}
    }

    logw("Using fallback video");
    if !cfg.fallback_video.is_file() {
        return Err(PipelineError::FallbackMissing(cfg.fallback_video.clone()));
    }
    Ok(BackgroundSource::File(cfg.fallback_video.clone()))
}

/// The graph parser strips the surrounding quotes; the option parser then
/// splits on `:`, so colons stay backslash-escaped inside the quotes.
fn escape_option_colons(value: &str) -> String {
    value.replace(':', "\\:")
}

fn drawtext_text(text: &str) -> String {
    escape_option_colons(&text.replace('\\', "").replace('\'', "\u{2019}"))
}

fn quote_option(value: &str) -> String {
    format!("'{}'", escape_option_colons(&value.replace('\'', "'\\''")))
}

/// Filter graph scaling the background to the frame and drawing each caption
/// during its time window.
pub fn caption_filter(captions: &[CaptionSegment], font: Option<&Path>) -> String {
    let mut filter = format!(
        "[0:v]scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},setsar=1,fps={fps}",
        w = FRAME_WIDTH,
        h = FRAME_HEIGHT,
        fps = OUTPUT_FPS
    );

    for segment in captions {
        filter.push_str(",drawtext=");
        if let Some(font) = font {
            filter.push_str(&format!("fontfile={}:", quote_option(&font.display().to_string())));
        }
        filter.push_str(&format!(
            "expansion=none:text='{}':fontsize={}:fontcolor={}:borderw={}:bordercolor={}:x=(w-text_w)/2:y={}:enable='between(t,{:.3},{:.3})'",
            drawtext_text(&segment.display_text()),
            captions::FONT_SIZE,
            captions::FONT_COLOR,
            captions::BORDER_WIDTH,
            captions::BORDER_COLOR,
            captions::CAPTION_Y,
            segment.start,
            segment.end()
        ));
    }

    filter.push_str("[v]");
    filter
}

/// A finished render and the captions burnt into it.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub output: PathBuf,
    pub captions: Vec<CaptionSegment>,
}

#[derive(Debug, Clone)]
pub struct ComposeRequest<'a> {
    pub background: &'a Path,
    pub fit: BackgroundFit,
    pub narration: &'a Path,
    pub duration: f64,
    pub captions: &'a [CaptionSegment],
    pub font: Option<&'a Path>,
    pub output: &'a Path,
}

pub fn compose_args(req: &ComposeRequest<'_>) -> Vec<String> {
    let mut args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
    ];
    if req.fit == BackgroundFit::Loop {
        args.push("-stream_loop".to_string());
        args.push("-1".to_string());
    }
    args.extend([
        "-i".to_string(),
        req.background.display().to_string(),
        "-i".to_string(),
        req.narration.display().to_string(),
        "-filter_complex".to_string(),
        caption_filter(req.captions, req.font),
        "-map".to_string(),
        "[v]".to_string(),
        "-map".to_string(),
        "1:a".to_string(),
        "-t".to_string(),
        format!("{:.3}", req.duration),
        "-r".to_string(),
        OUTPUT_FPS.to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-preset".to_string(),
        ENCODE_PRESET.to_string(),
        "-threads".to_string(),
        ENCODE_THREADS.to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        "192k".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        req.output.display().to_string(),
    ]);
    args
}

async fn concat_montage(clips: &[BackgroundClip], list_txt: &Path, out_mp4: &Path) -> Result<()> {
    logi("Creating montage from multiple clips...");
    let mut listf = fs::File::create(list_txt).await?;
    for clip in clips {
        let absolute = std::path::absolute(&clip.path)?;
        listf
            .write_all(ffmpeg::concat_list_entry(&absolute).as_bytes())
            .await?;
    }
    listf.flush().await?;
    ffmpeg::ffmpeg_concat_videos(list_txt, out_mp4).await
}

/// Renders the final video. The narration's length decides the output
/// length; the background is trimmed or looped to match.
pub async fn compose(
    cfg: &Config,
    job_id: &str,
    narration: &Path,
    background: &Background,
    narration_text: &str,
    output: &Path,
) -> Result<Rendered> {
    logi("Rendering final video...");
    let duration = ffmpeg::ffprobe_duration_seconds(narration).await?;

    let mut intermediates = Vec::new();
    let (bg_path, bg_duration) = match select_background_source(cfg, background)? {
        BackgroundSource::Montage(clips) => {
            let list_txt = cfg.temp_dir.join(format!("montage_{}.txt", job_id));
            let montage = cfg.temp_dir.join(format!("montage_{}.mp4", job_id));
            concat_montage(clips, &list_txt, &montage).await?;
            intermediates.push(list_txt);
            intermediates.push(montage.clone());
            (montage, montage_duration(clips))
        }
        BackgroundSource::File(path) => {
            let d = ffmpeg::ffprobe_duration_seconds(&path).await?;
            (path, d)
        }
    };

    let fit = fit_background(bg_duration, duration);
    logi(format!(
        "Background {:.2}s vs narration {:.2}s => {:?}",
        bg_duration, duration, fit
    ));

    let captions = captions::build_captions(narration_text, duration);
    logi(format!("Creating captions ({} lines)...", captions.len()));

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).await?;
    }

    let request = ComposeRequest {
        background: &bg_path,
        fit,
        narration,
        duration,
        captions: &captions,
        font: cfg.font_file.as_deref(),
        output,
    };
    let result = ffmpeg::run_cmd(&compose_args(&request)).await;

    for path in intermediates {
        let _ = fs::remove_file(&path).await;
    }
    result?;

    logok(format!("Video finished: {}", output.display()));
    Ok(Rendered {
        output: output.to_path_buf(),
        captions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(path: &str, duration: f64) -> BackgroundClip {
        BackgroundClip {
            path: PathBuf::from(path),
            duration,
        }
    }

    fn cfg_with_fallback(path: PathBuf) -> Config {
        Config {
            fallback_video: path,
            ..Config::default()
        }
    }

    #[test]
    fn short_montage_loops() {
        let clips = vec![clip("a.mp4", 4.0), clip("b.mp4", 4.0)];
        let fit = fit_background(montage_duration(&clips), 20.0);
        assert_eq!(fit, BackgroundFit::Loop);

        let captions = captions::build_captions("hello world", 20.0);
        let args = compose_args(&ComposeRequest {
            background: Path::new("temp/montage_x.mp4"),
            fit,
            narration: Path::new("temp/voiceover_x.mp3"),
            duration: 20.0,
            captions: &captions,
            font: None,
            output: Path::new("output/viral_x.mp4"),
        });
        let joined = args.join(" ");
        assert!(joined.contains("-stream_loop -1 -i temp/montage_x.mp4"));
        assert!(joined.contains("-t 20.000"));
    }

    #[test]
    fn long_background_is_trimmed() {
        assert_eq!(fit_background(16.0, 12.5), BackgroundFit::Trim);
        assert_eq!(fit_background(12.5, 12.5), BackgroundFit::Trim);

        let args = compose_args(&ComposeRequest {
            background: Path::new("bg.mp4"),
            fit: BackgroundFit::Trim,
            narration: Path::new("vo.mp3"),
            duration: 12.5,
            captions: &[],
            font: None,
            output: Path::new("out.mp4"),
        });
        assert!(!args.iter().any(|a| a == "-stream_loop"));
        let joined = args.join(" ");
        assert!(joined.contains("-r 24"));
        assert!(joined.contains("-preset ultrafast"));
        assert!(joined.contains("-c:v libx264"));
        assert!(joined.contains("-c:a aac"));
    }

    #[test]
    fn montage_preferred_over_fallback() {
        let cfg = cfg_with_fallback(PathBuf::from("/definitely/missing.mp4"));
        let bg = Background::Montage {
            clips: vec![clip("a.mp4", 4.0)],
        };
        assert!(matches!(
            select_background_source(&cfg, &bg).unwrap(),
            BackgroundSource::Montage(clips) if clips.len() == 1
        ));
    }

    #[test]
    fn no_footage_uses_fallback_file() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = dir.path().join("stock_news_vertical.mp4");
        std::fs::write(&fallback, b"video").unwrap();
        let cfg = cfg_with_fallback(fallback.clone());

        for bg in [
            Background::None,
            Background::Montage { clips: vec![] },
            Background::SingleFile {
                path: dir.path().join("gone.mp4"),
            },
        ] {
            assert_eq!(
                select_background_source(&cfg, &bg).unwrap(),
                BackgroundSource::File(fallback.clone())
            );
        }
    }

    #[test]
    fn existing_single_file_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let single = dir.path().join("bg.mp4");
        std::fs::write(&single, b"video").unwrap();
        let cfg = cfg_with_fallback(dir.path().join("missing.mp4"));
        let bg = Background::SingleFile {
            path: single.clone(),
        };
        assert_eq!(
            select_background_source(&cfg, &bg).unwrap(),
            BackgroundSource::File(single)
        );
    }

    #[test]
    fn missing_fallback_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("stock_news_vertical.mp4");
        let cfg = cfg_with_fallback(missing.clone());
        let err = select_background_source(&cfg, &Background::None).unwrap_err();
        assert!(matches!(&err, PipelineError::FallbackMissing(p) if *p == missing));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn captions_are_windowed_and_uppercased() {
        let captions = vec![
            CaptionSegment {
                text: "it's 50% done".to_string(),
                start: 0.0,
                duration: 2.5,
            },
            CaptionSegment {
                text: "second line".to_string(),
                start: 2.5,
                duration: 2.5,
            },
        ];
        let filter = caption_filter(&captions, Some(Path::new("/fonts/Arial Bold.ttf")));
        assert!(filter.starts_with("[0:v]scale=1080:1920"));
        assert!(filter.ends_with("[v]"));
        assert!(filter.contains("text='IT\u{2019}S 50% DONE'"));
        assert!(filter.contains("enable='between(t,0.000,2.500)'"));
        assert!(filter.contains("enable='between(t,2.500,5.000)'"));
        assert!(filter.contains("fontfile='/fonts/Arial Bold.ttf':"));
        assert!(filter.contains("fontsize=60:fontcolor=yellow:borderw=3:bordercolor=black"));
        assert!(filter.contains("y=1400"));
        assert_eq!(filter.matches("drawtext=").count(), 2);
    }

    fn drawtext_texts(filter: &str) -> Vec<&str> {
        filter
            .split("text='")
            .skip(1)
            .filter_map(|rest| rest.split('\'').next())
            .collect()
    }

    #[test]
    fn colons_in_captions_are_escaped() {
        let captions = captions::build_captions("Breaking: flood at 10:30 tonight", 6.0);
        let filter = caption_filter(&captions, Some(Path::new("C:/fonts/Impact.ttf")));

        assert!(filter.contains("text='BREAKING\\: FLOOD AT 10\\:30'"));
        assert!(filter.contains("text='TONIGHT'"));
        assert!(filter.contains("fontfile='C\\:/fonts/Impact.ttf':"));
        for text in drawtext_texts(&filter) {
            let bare = text.replace("\\:", "");
            assert!(!bare.contains(':'), "unescaped ':' in {text}");
        }
    }
}
