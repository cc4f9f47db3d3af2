use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tender-scout")]
#[command(about = "Crawls a site in a browser and extracts tender tables")]
#[command(version)]
pub struct Args {
    /// Root URL to start crawling from
    pub url: String,

    /// Keyword to look for in page text (case-insensitive)
    #[arg(short, long)]
    pub keyword: Option<String>,

    /// Maximum crawl depth; the root page is depth 1
    #[arg(short, long, default_value_t = 1)]
    pub depth: u32,

    /// JSON config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// WebDriver endpoint, overrides the config file and WEBDRIVER_URL
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Print a de-duplicated listing digest instead of the full report
    #[arg(long)]
    pub listings: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}
