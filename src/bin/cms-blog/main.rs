use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use spdlog::{info, warn};
use tokio_util::sync::CancellationToken;

use cms_blog::cms::HttpSearchSource;
use cms_blog::config::Config;
use cms_blog::logger::configure_logger;
use cms_blog::server::server_run;
use cms_blog::view::{group_by_year, unique_tags};
use cms_blog::Aggregator;

use crate::config::open_config;
use crate::config_data::write_sample_cfg;

mod config;
mod config_data;

const CFG_FILE_NAME: &str = "cms-blog.toml";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config path
    #[arg(short, long)]
    config_path: Option<String>,

    /// Writes a sample configuration to the given path and exits
    #[arg(long)]
    init: Option<PathBuf>,

    /// Runs one aggregation pass, prints a summary and exits
    #[arg(long)]
    check: bool,
}

async fn check(config: &Config) -> Result<()> {
    let source = HttpSearchSource::new(&config.cms).context("Error creating CMS client")?;
    let aggregated = Aggregator::new(&source, config.cms.aggregate_options())
        .run(&CancellationToken::new())
        .await
        .context("No data available from the CMS")?;

    println!("Posts: {} of {} ({} requests{})",
             aggregated.posts.len(),
             aggregated.total_matching,
             aggregated.pages_requested,
             if aggregated.complete { "" } else { ", truncated" });

    let view_defaults = config.defaults.view_defaults();
    for year in group_by_year(&aggregated.posts, &view_defaults) {
        println!("  {}: {} posts", year.year, year.posts.len());
    }
    println!("Tags: {}", unique_tags(&aggregated.posts).len());
    Ok(())
}

#[ntex::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = args.init {
        write_sample_cfg(&path).with_context(|| format!("Error writing {}", path.display()))?;
        println!("Sample configuration written to {}", path.display());
        return Ok(());
    }

    let config_path = args.config_path.map(PathBuf::from);
    let config = match open_config(config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            eprintln!("Please run cms-blog --help");
            return Ok(());
        }
    };

    if let Err(err) = configure_logger(&config) {
        warn!("Error creating logger sinks. Using console instead. Desc={}", err);
    }

    if args.check {
        return check(&config).await;
    }

    info!("Starting cms-blog =-=-=-=-=-=-=-=-=-=-=-=-=-=-=-");
    info!("Listening on {}:{}", config.server.address, config.server.port);

    server_run(config).await?;
    Ok(())
}
