use std::path::PathBuf;

use rectv_harvest::config::{HarvestConfig, LinkPolicy, ProbePolicy};
use rectv_harvest::{pipeline, CatalogClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(clap::Parser, Debug)]
#[command(version, about = "Find a live catalog mirror and export its movies as an M3U playlist", long_about = None)]
struct Args {
    /// JSON config file (defaults to config.json in the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// First mirror number to probe
    #[arg(long)]
    range_start: Option<u32>,

    /// Last mirror number to probe (inclusive)
    #[arg(long)]
    range_end: Option<u32>,

    /// Playlist file to write
    #[arg(short, long)]
    output: Option<String>,

    /// User-Agent sent to the API and written into the playlist
    #[arg(long)]
    user_agent: Option<String>,

    /// Per-request timeout in seconds
    #[arg(short, long)]
    timeout: Option<f64>,

    /// Mirror URL template, `{n}` is replaced by the mirror number
    #[arg(long)]
    host_template: Option<String>,

    #[arg(long, value_enum)]
    probe_policy: Option<ProbePolicy>,

    #[arg(long, value_enum)]
    link_policy: Option<LinkPolicy>,

    /// Extra attempts per catalog page after a network failure
    #[arg(long)]
    retries: Option<u32>,
}

impl Args {
    fn apply(self, config: &mut HarvestConfig) {
        if let Some(v) = self.range_start {
            config.range_start = v;
        }
        if let Some(v) = self.range_end {
            config.range_end = v;
        }
        if let Some(v) = self.output {
            config.output_filename = v;
        }
        if let Some(v) = self.user_agent {
            config.user_agent = v;
        }
        if let Some(v) = self.timeout {
            config.timeout_seconds = v;
        }
        if let Some(v) = self.host_template {
            config.host_template = v;
        }
        if let Some(v) = self.probe_policy {
            config.probe_policy = v;
        }
        if let Some(v) = self.link_policy {
            config.link_policy = v;
        }
        if let Some(v) = self.retries {
            config.page_retries = v;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    use clap::Parser;
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rectv_harvest=info,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut config = HarvestConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    let client = CatalogClient::new(&config.user_agent, config.timeout())?;

    match pipeline::run(&client, &config).await {
        Ok(report) => {
            tracing::info!(
                "Server {} gave {} items, {} entries in {} categories",
                report.host.base_url,
                report.items_fetched,
                report.entries_written,
                report.categories.len()
            );
            for (category, count) in &report.categories {
                tracing::debug!("  {}: {}", category, count);
            }
            tracing::info!("Playlist saved to {}", report.output_path.display());
            Ok(())
        }
        Err(err) => {
            tracing::error!("{}", err);
            tracing::error!("{}", err.suggestion());
            std::process::exit(1);
        }
    }
}
