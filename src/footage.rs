//! Background clips from the stock video provider.

use crate::api::pexels::{self, PexelsVideo, SearchQuery};
use crate::composer::{Background, BackgroundClip};
use crate::config::Config;
use crate::error::Result;
use crate::ffmpeg::{self, FRAME_HEIGHT, FRAME_WIDTH};
use crate::outcome::BestEffort;
use crate::{logi, logok, logw};
use reqwest::Client;
use std::path::PathBuf;
use tokio::fs;

const SEARCH_QUALIFIER: &str = "dramatic";
const CANDIDATES_PER_PAGE: u32 = 10;

#[derive(Debug, Clone)]
pub struct FootageOptions {
    pub orientation: String,
    pub clip_duration: f64,
    pub max_clips: usize,
}

impl Default for FootageOptions {
    fn default() -> Self {
        Self {
            orientation: "portrait".to_string(),
            clip_duration: 4.0,
            max_clips: 4,
        }
    }
}

pub fn search_query(keywords: &str) -> String {
    format!("{} {}", keywords.trim(), SEARCH_QUALIFIER)
}

/// Candidates worth downloading, in provider order, paired with their
/// exact-resolution link.
pub fn usable_candidates(videos: &[PexelsVideo], max_clips: usize) -> Vec<(usize, &str)> {
    videos
        .iter()
        .take(max_clips)
        .enumerate()
        .filter_map(|(i, video)| match video.exact_variant(FRAME_WIDTH, FRAME_HEIGHT) {
            Some(link) => Some((i, link)),
            None => {
                logw(format!(
                    "Skipping video {}: no {}x{} variant",
                    video.id, FRAME_WIDTH, FRAME_HEIGHT
                ));
                None
            }
        })
        .collect()
}

fn clip_paths(cfg: &Config, job_id: &str, index: usize) -> (PathBuf, PathBuf) {
    (
        cfg.temp_dir.join(format!("clip_{}_{}.mp4", job_id, index)),
        cfg.temp_dir.join(format!("clip_{}_{}_fit.mp4", job_id, index)),
    )
}

async fn fetch_clip(
    client: &Client,
    cfg: &Config,
    job_id: &str,
    index: usize,
    link: &str,
    opts: &FootageOptions,
) -> Result<BackgroundClip> {
    let (raw, fitted) = clip_paths(cfg, job_id, index);
    logi(format!("Downloading clip {}...", index + 1));
    pexels::download_file(client, link, &raw).await?;

    let fit = ffmpeg::ffmpeg_fit_clip(&raw, opts.clip_duration, &fitted).await;
    let _ = fs::remove_file(&raw).await;
    fit?;

    // Sources shorter than the requested cut come out shorter.
    let duration = ffmpeg::ffprobe_duration_seconds(&fitted)
        .await
        .unwrap_or(opts.clip_duration)
        .min(opts.clip_duration);

    Ok(BackgroundClip {
        path: fitted,
        duration,
    })
}

/// Searches for clips matching `keywords` and prepares up to
/// `opts.max_clips` of them. Any failure degrades to [`Background::None`].
pub async fn fetch_background(
    client: &Client,
    cfg: &Config,
    job_id: &str,
    keywords: &str,
    opts: &FootageOptions,
) -> BestEffort<Background> {
    let query = search_query(keywords);
    logi(format!("Searching Pexels for multiple clips: '{}'", query));

    let search = SearchQuery {
        query: &query,
        per_page: CANDIDATES_PER_PAGE,
        min_width: FRAME_WIDTH,
        min_height: FRAME_HEIGHT,
        orientation: &opts.orientation,
    };
    let videos = match pexels::search_videos(client, cfg, &search).await {
        Ok(videos) => videos,
        Err(err) => {
            logw(format!("Pexels request failed: {}", err));
            return BestEffort::fallback(Background::None, err.to_string());
        }
    };
    if videos.is_empty() {
        return BestEffort::fallback(Background::None, "no videos matched");
    }

    let mut clips = Vec::new();
    for (index, link) in usable_candidates(&videos, opts.max_clips) {
        match fetch_clip(client, cfg, job_id, index, link, opts).await {
            Ok(clip) => clips.push(clip),
            Err(err) => logw(format!("Failed to process video {}: {}", index, err)),
        }
    }

    if clips.is_empty() {
        return BestEffort::fallback(Background::None, "no usable clips");
    }

    logok(format!("Prepared {} background clips", clips.len()));
    BestEffort::Primary(Background::Montage { clips })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::canned;
    use crate::api::pexels::SearchResponse;

    fn cfg_with_pexels(base: String, temp_dir: &std::path::Path) -> Config {
        Config {
            pexels_api_key: "test".to_string(),
            pexels_api_base: base,
            temp_dir: temp_dir.to_path_buf(),
            ..Config::default()
        }
    }

    fn videos() -> Vec<PexelsVideo> {
        let raw = r#"{"videos": [
            {"id": 1, "video_files": [{"width": 1080, "height": 1920, "link": "l1"}]},
            {"id": 2, "video_files": [{"width": 720, "height": 1280, "link": "l2"}]},
            {"id": 3, "video_files": [{"width": 1080, "height": 1920, "link": "l3"}]},
            {"id": 4, "video_files": [{"width": 1080, "height": 1920, "link": "l4"}]},
            {"id": 5, "video_files": [{"width": 1080, "height": 1920, "link": "l5"}]}
        ]}"#;
        serde_json::from_str::<SearchResponse>(raw).unwrap().videos
    }

    #[test]
    fn only_first_max_candidates_are_considered() {
        let videos = videos();
        let picked = usable_candidates(&videos, 4);
        assert_eq!(picked, vec![(0, "l1"), (2, "l3"), (3, "l4")]);
    }

    #[tokio::test]
    async fn failed_search_degrades_to_no_background() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = cfg_with_pexels(canned::REFUSED_BASE.to_string(), dir.path());
        let outcome = fetch_background(
            &Client::new(),
            &cfg,
            "abc",
            "flood",
            &FootageOptions::default(),
        )
        .await;
        assert!(outcome.is_fallback());
        assert_eq!(outcome.into_inner(), Background::None);
    }

    #[tokio::test]
    async fn search_error_status_degrades_to_no_background() {
        let dir = tempfile::tempdir().unwrap();
        let base = canned::respond_once(500, r#"{"error":"boom"}"#).await;
        let cfg = cfg_with_pexels(base, dir.path());
        let outcome = fetch_background(
            &Client::new(),
            &cfg,
            "abc",
            "flood",
            &FootageOptions::default(),
        )
        .await;
        assert!(matches!(
            &outcome,
            BestEffort::Fallback { reason, .. } if reason.contains("HTTP 500")
        ));
        assert_eq!(outcome.into_inner(), Background::None);
    }

    #[tokio::test]
    async fn failed_clip_downloads_degrade_to_no_background() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(
            r#"{{"videos": [
                {{"id": 1, "video_files": [{{"width": 1080, "height": 1920, "link": "{0}/a.mp4"}}]}},
                {{"id": 2, "video_files": [{{"width": 1080, "height": 1920, "link": "{0}/b.mp4"}}]}}
            ]}}"#,
            canned::REFUSED_BASE
        );
        let base = canned::respond_once(200, body).await;
        let cfg = cfg_with_pexels(base, dir.path());
        let outcome = fetch_background(
            &Client::new(),
            &cfg,
            "abc",
            "flood",
            &FootageOptions::default(),
        )
        .await;
        assert!(matches!(
            &outcome,
            BestEffort::Fallback { reason, .. } if reason == "no usable clips"
        ));
        assert_eq!(outcome.into_inner(), Background::None);
        assert!(!dir.path().join("clip_abc_0_fit.mp4").exists());
    }

    #[test]
    fn query_has_qualifier() {
        assert_eq!(search_query("flood rescue "), "flood rescue dramatic");
    }

    #[test]
    fn defaults() {
        let opts = FootageOptions::default();
        assert_eq!(opts.orientation, "portrait");
        assert_eq!(opts.clip_duration, 4.0);
        assert_eq!(opts.max_clips, 4);
    }

    #[test]
    fn clip_names_carry_job_id() {
        let cfg = Config::default();
        let (raw, fitted) = clip_paths(&cfg, "abc", 2);
        assert_eq!(raw, PathBuf::from("temp/clip_abc_2.mp4"));
        assert_eq!(fitted, PathBuf::from("temp/clip_abc_2_fit.mp4"));
    }
}
