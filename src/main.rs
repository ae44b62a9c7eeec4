use anyhow::Result;
use tracing_subscriber::EnvFilter;
use viral_shorts::generator::run_generation;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let code = run_generation().await?;
    std::process::exit(code);
}
