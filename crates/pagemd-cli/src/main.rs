//! url-to-md: fetch a rendered web page and print it as LLM-friendly Markdown.

mod fetch;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use pagemd::{Transformer, TransformOptions};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;

use crate::fetch::{BrowserFetcher, FetchOptions};

/// Fetch URL content and output LLM-friendly markdown.
#[derive(Parser, Debug)]
#[command(name = "url-to-md", version)]
#[command(about = "Fetch URL content and output LLM-friendly markdown", long_about = None)]
struct Args {
    /// URL to fetch
    url: String,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Seconds to wait for the page to load
    #[arg(long, default_value_t = 1.5)]
    wait: f64,

    /// Show the browser window instead of running headless
    #[arg(long, visible_alias = "no-headless")]
    show_browser: bool,

    /// Disable web security (CORS) in the browser
    #[arg(long)]
    disable_web_security: bool,

    /// Remove images from the output
    #[arg(long)]
    no_images: bool,

    /// Remove webpage links from the output, keeping their text
    #[arg(long)]
    no_links: bool,

    /// Keep GIF images (removed by default)
    #[arg(long)]
    keep_gif_images: bool,

    /// Keep SVG images (removed by default)
    #[arg(long)]
    keep_svg_images: bool,

    /// Additional image types to remove, e.g. .webp
    #[arg(long, num_args = 1.., value_name = "EXT")]
    remove_image_types: Vec<String>,

    /// Additional HTML tags to remove
    #[arg(long, num_args = 1.., value_name = "TAG")]
    remove_tags: Vec<String>,

    /// Only keep content inside these HTML tags
    #[arg(long, num_args = 1.., value_name = "TAG")]
    include_tags: Vec<String>,

    /// Log pipeline details to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn target_url(&self) -> Result<Url> {
        Url::parse(&self.url).with_context(|| format!("Invalid URL: {}", self.url))
    }

    fn wait_duration(&self) -> Result<Duration> {
        if !self.wait.is_finite() || self.wait < 0.0 {
            bail!("--wait must be a non-negative number of seconds, got {}", self.wait);
        }
        Ok(Duration::from_secs_f64(self.wait))
    }

    fn fetch_options(&self) -> Result<FetchOptions> {
        Ok(FetchOptions {
            wait: self.wait_duration()?,
            headless: !self.show_browser,
            disable_web_security: self.disable_web_security,
        })
    }

    fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            keep_images: !self.no_images,
            keep_links: !self.no_links,
            remove_gif_images: !self.keep_gif_images,
            remove_svg_images: !self.keep_svg_images,
            remove_image_types: self.remove_image_types.clone(),
            remove_tags: self.remove_tags.clone(),
            include_tags: self.include_tags.clone(),
            ..Default::default()
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let url = args.target_url()?;
    let fetch_options = args.fetch_options()?;
    let transformer = Transformer::new(url.as_str(), args.transform_options())
        .context("Invalid base URL")?;

    debug!(%url, "fetching page");
    let html = BrowserFetcher::new(fetch_options).fetch(&url).await?;
    if html.trim().is_empty() {
        bail!("Failed to fetch the page. Ensure Chrome/Chromium is installed.");
    }

    let markdown = transformer
        .transform(&html)
        .context("Error while processing HTML to markdown")?;

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, &markdown)
                .await
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            info!("Output written to: {}", path.display());
        }
        None => println!("{markdown}"),
    }

    Ok(())
}
