mod archiver;
mod config;
mod dom;
mod error;
mod models;
mod parser;
mod pipeline;
mod renderer;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use config::{BrowserSettings, HeaderLang, Markers, OutputFormat, PriceSlot, Settings};
use renderer::chromium::ChromiumRenderer;

/// Scrape product names, prices and links from a category listing page.
#[derive(Parser, Debug)]
#[command(name = "category-catalog-scraper")]
#[command(version)]
struct Cli {
    /// Site host, without scheme (e.g. shop.example)
    #[arg(short = 's', default_value = "")]
    site: String,

    /// Category slug
    #[arg(short = 'c', default_value = "")]
    category: String,

    /// Directory for the output and debug files
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Language of the CSV header
    #[arg(long, value_enum, default_value_t = HeaderLang::En)]
    header_lang: HeaderLang,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Chrome/Chromium executable
    #[arg(long = "chrome", env = "CHROME_PATH")]
    chrome: Option<PathBuf>,

    /// Seconds to wait for product cards to appear
    #[arg(long, default_value_t = config::RENDER_TIMEOUT.as_secs())]
    timeout: u64,

    /// Price node choice within a card's price block
    #[arg(long, value_enum, default_value_t = PriceSlot::Third)]
    price_slot: PriceSlot,

    #[arg(long, default_value = config::CARD_MARKER)]
    card_marker: String,

    #[arg(long, default_value = config::NAME_MARKER)]
    name_marker: String,

    #[arg(long, default_value = config::PRICE_MARKER)]
    price_marker: String,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn into_settings(self) -> Settings {
        let mut settings = Settings::new(self.site, self.category);
        settings.output_dir = self.output_dir;
        settings.format = self.format;
        settings.header_lang = self.header_lang;
        settings.markers = Markers {
            card: self.card_marker,
            name: self.name_marker,
            price: self.price_marker,
        };
        settings.price_slot = self.price_slot;
        settings.browser = BrowserSettings {
            headless: !self.headed,
            executable: self.chrome,
            timeout: Duration::from_secs(self.timeout),
            ..BrowserSettings::default()
        };
        settings
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if cli.category.is_empty() {
        println!("Error: no category given.");
        return Ok(());
    }

    let settings = cli.into_settings();
    let renderer = match ChromiumRenderer::new(settings.browser.clone(), &settings.markers.card) {
        Ok(renderer) => renderer,
        Err(e) => fail(&anyhow::Error::from(e)),
    };

    match pipeline::run(&settings, &renderer).await {
        Ok(report) => {
            info!("{} products written", report.records);
            println!("Data saved to file: {}", report.output.display());
            Ok(())
        }
        Err(e) => fail(&anyhow::Error::from(e)),
    }
}

fn fail(e: &anyhow::Error) -> ! {
    error!("{e:#}");
    std::process::exit(1);
}
