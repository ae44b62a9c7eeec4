use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use regex::Regex;
use url::Url;

pub const UNKNOWN_ID: &str = "unknown";

/// Extracts a short platform identifier used to name the job's files.
///
/// TikTok links yield the numeric segment after `/video/`, YouTube links the
/// `v` query parameter (or the path of a `youtu.be` short link). Anything
/// else, including a recognised host without an identifier, is `"unknown"`.
pub fn video_id(url: &str) -> String {
    let found = if url.contains("tiktok.com") {
        tiktok_id(url)
    } else if url.contains("youtube.com") {
        youtube_query_id(url)
    } else if url.contains("youtu.be/") {
        youtu_be_id(url)
    } else {
        None
    };

    found.unwrap_or_else(|| UNKNOWN_ID.to_string())
}

fn tiktok_regex() -> Result<&'static Regex> {
    static TIKTOK_RE: OnceCell<Regex> = OnceCell::new();
    TIKTOK_RE.get_or_try_init(|| {
        Regex::new(r"/video/(\d+)").context("failed to compile tiktok regex")
    })
}

fn tiktok_id(url: &str) -> Option<String> {
    tiktok_regex()
        .ok()?
        .captures(url)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

fn youtube_query_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

fn youtu_be_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}
