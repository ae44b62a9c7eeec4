pub mod api;
pub mod captions;
pub mod composer;
pub mod config;
pub mod error;
pub mod ffmpeg;
pub mod fetcher;
pub mod footage;
pub mod generator;
pub mod identifier;
pub mod init;
pub mod job;
pub mod keywords;
pub mod language;
pub mod outcome;
pub mod script;
pub mod transcribe;

pub(crate) fn logv(tag: &str, message: &str) {
    match tag {
        "WARN" => tracing::warn!("[{}] {}", tag, message),
        "ERROR" => tracing::error!("[{}] {}", tag, message),
        _ => tracing::info!("[{}] {}", tag, message),
    }
}

pub(crate) fn logi(message: impl AsRef<str>) {
    logv("INFO", message.as_ref());
}

pub(crate) fn logok(message: impl AsRef<str>) {
    logv("OK", message.as_ref());
}

pub(crate) fn logw(message: impl AsRef<str>) {
    logv("WARN", message.as_ref());
}

pub(crate) fn loge(message: impl AsRef<str>) {
    logv("ERROR", message.as_ref());
}
