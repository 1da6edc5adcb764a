use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "avyscrape",
    version,
    about = "Avalanche forecast scraping and tabulation"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Scrape(ScrapeArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ScrapeArgs {
    /// First forecast date to fetch (YYYY-MM-DD).
    #[arg(long)]
    pub start_date: NaiveDate,

    /// Last forecast date to fetch, inclusive (YYYY-MM-DD).
    #[arg(long)]
    pub end_date: NaiveDate,

    #[arg(long, default_value = "data/forecast_data.csv")]
    pub out_path: PathBuf,

    #[arg(long)]
    pub manifest_dir: Option<PathBuf>,

    /// Forecast region segment of the page URL.
    #[arg(long, default_value = "salt-lake")]
    pub location: String,

    /// Seconds to wait after navigation for client-side rendering.
    #[arg(long, default_value_t = 3)]
    pub settle_secs: u64,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "data/forecast_data.csv")]
    pub out_path: PathBuf,

    #[arg(long)]
    pub manifest_dir: Option<PathBuf>,
}
