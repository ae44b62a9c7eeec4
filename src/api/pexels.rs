use crate::config::Config;
use crate::error::{PipelineError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use tokio::fs;


#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub videos: Vec<PexelsVideo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PexelsVideo {
    pub id: u64,
    #[serde(default)]
    pub video_files: Vec<VideoFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoFile {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub link: String,
}

/// Server-side filters of a footage search.
#[derive(Debug, Clone)]
pub struct SearchQuery<'a> {
    pub query: &'a str,
    pub per_page: u32,
    pub min_width: u32,
    pub min_height: u32,
    pub orientation: &'a str,
}

impl PexelsVideo {
    /// Link of the variant with exactly the requested resolution.
    pub fn exact_variant(&self, width: u32, height: u32) -> Option<&str> {
        self.video_files
            .iter()
            .find(|f| f.width == Some(width) && f.height == Some(height))
            .map(|f| f.link.as_str())
    }
}

fn search_url(base: &str) -> String {
    format!("{}/videos/search", base.trim_end_matches('/'))
}

pub async fn search_videos(
    client: &Client,
    cfg: &Config,
    query: &SearchQuery<'_>,
) -> Result<Vec<PexelsVideo>> {
    let resp = client
        .get(search_url(&cfg.pexels_api_base))
        .header("Authorization", &cfg.pexels_api_key)
        .query(&[
            ("query", query.query.to_string()),
            ("per_page", query.per_page.to_string()),
            ("min_width", query.min_width.to_string()),
            ("min_height", query.min_height.to_string()),
            ("orientation", query.orientation.to_string()),
        ])
        .timeout(std::time::Duration::from_secs(120))
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(PipelineError::Footage(format!(
            "Pexels API error: HTTP {}",
            status.as_u16()
        )));
    }

    let raw = resp.text().await?;
    let parsed: SearchResponse = serde_json::from_str(&raw)?;
    Ok(parsed.videos)
}

pub async fn download_file(client: &Client, url: &str, dest: &Path) -> Result<()> {
    let resp = client
        .get(url)
        .timeout(std::time::Duration::from_secs(120))
        .send()
        .await?
        .error_for_status()?;
    let bytes = resp.bytes().await?;
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(dest, &bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "page": 1,
        "videos": [
            {
                "id": 11,
                "video_files": [
                    {"id": 1, "quality": "hd", "width": 720, "height": 1280, "link": "https://cdn/a720.mp4"},
                    {"id": 2, "quality": "hd", "width": 1080, "height": 1920, "link": "https://cdn/a1080.mp4"}
                ]
            },
            {
                "id": 12,
                "video_files": [
                    {"id": 3, "quality": "uhd", "width": 2160, "height": 3840, "link": "https://cdn/b4k.mp4"},
                    {"id": 4, "quality": null, "width": null, "height": null, "link": "https://cdn/hls.m3u8"}
                ]
            }
        ]
    }"#;

    #[test]
    fn picks_exact_resolution_only() {
        let parsed: SearchResponse = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(parsed.videos.len(), 2);
        assert_eq!(
            parsed.videos[0].exact_variant(1080, 1920),
            Some("https://cdn/a1080.mp4")
        );
        assert_eq!(parsed.videos[1].exact_variant(1080, 1920), None);
    }

    #[test]
    fn search_url_joins_base() {
        assert_eq!(
            search_url("https://api.pexels.com"),
            "https://api.pexels.com/videos/search"
        );
    }

    #[test]
    fn missing_videos_key_is_empty() {
        let parsed: SearchResponse = serde_json::from_str(r#"{"page":1}"#).unwrap();
        assert!(parsed.videos.is_empty());
    }
}
