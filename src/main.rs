use clap::Parser;
use serde::Serialize;
use tender_scout::{Crawler, ScraperConfig};

mod args;
use args::Args;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ScraperConfig::from_file(path)?,
        None => ScraperConfig::default(),
    }
    .with_env_overrides();
    if let Some(webdriver_url) = args.webdriver_url {
        config.webdriver_url = webdriver_url;
    }
    if args.headed {
        config.headless = false;
    }

    ::log::info!("Using WebDriver at {}", config.webdriver_url);
    let crawler = Crawler::new(config)?;

    let start_time = std::time::Instant::now();
    let report = crawler
        .crawl_url(&args.url, args.keyword.as_deref(), args.depth)
        .await;
    ::log::info!(
        "Crawled {} pages in {:.2} seconds",
        report.total_pages_scraped,
        start_time.elapsed().as_secs_f64()
    );

    if args.listings {
        print_json(&report.listings(), args.pretty)?;
    } else {
        print_json(&report, args.pretty)?;
    }

    if let Some(error) = &report.error {
        ::log::error!("Crawl failed: {}", error);
        std::process::exit(1);
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> serde_json::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}
