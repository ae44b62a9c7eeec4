use crate::config::Config;
use crate::identifier;
use crate::init;
use crate::job::{Job, JobRunner, Pipeline};
use crate::{loge, logi, logok};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub outputs: Vec<PathBuf>,
    pub failures: Vec<(String, String)>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.outputs.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Lines that look like URLs, in file order.
pub fn read_urls(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.starts_with("http"))
        .map(str::to_string)
        .collect()
}

/// Hands out job identifiers, suffixing repeats so that two URLs sharing a
/// platform id never share temp or output files.
#[derive(Debug, Default)]
pub struct JobIds {
    seen: HashSet<String>,
}

impl JobIds {
    pub fn assign(&mut self, base: &str) -> String {
        if self.seen.insert(base.to_string()) {
            return base.to_string();
        }
        // Platform ids may themselves end in `_<n>`.
        let mut n = 2;
        loop {
            let candidate = format!("{}_{}", base, n);
            if self.seen.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Processes every URL in `input` with `runner`. A failing URL is logged and
/// skipped; a missing input file is an empty batch.
pub async fn run_batch<R>(input: &Path, runner: &R) -> Result<BatchSummary>
where
    R: JobRunner + ?Sized,
{
    if fs::metadata(input).await.is_err() {
        logi(format!("No input file at {}; nothing to do.", input.display()));
        return Ok(BatchSummary::default());
    }

    let text = fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read input: {}", input.display()))?;
    let urls = read_urls(&text);
    logi(format!("Found {} URLs. Starting...", urls.len()));

    let mut summary = BatchSummary {
        total: urls.len(),
        ..BatchSummary::default()
    };
    let mut ids = JobIds::default();

    for url in urls {
        let id = ids.assign(&identifier::video_id(&url));
        let mut job = Job::new(url.clone(), id);
        match runner.run(&mut job).await {
            Ok(output) => summary.outputs.push(output),
            Err(err) => {
                loge(format!("Error processing {}: {}", url, err));
                summary.failures.push((url, err.to_string()));
            }
        }
    }

    logok(format!(
        "All videos done: {} succeeded, {} failed (of {}).",
        summary.succeeded(),
        summary.failed(),
        summary.total
    ));
    Ok(summary)
}

pub async fn run_generation() -> Result<i32> {
    let cfg = Config::load("config.json").await?;
    init::ensure_directories(&cfg).await?;
    init::check_tools(&cfg).await;

    let client = reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .context("Failed to build HTTP client")?;

    let input = cfg.input_file.clone();
    let pipeline = Pipeline::new(cfg, client);
    run_batch(&input, &pipeline).await?;
    Ok(0)
}
