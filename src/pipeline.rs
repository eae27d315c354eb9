use std::path::PathBuf;

use tracing::{info, warn};

use crate::archiver;
use crate::config::{OutputFormat, Settings};
use crate::error::ScrapeError;
use crate::models::CatalogSnapshot;
use crate::parser;
use crate::renderer::{self, PageRenderer};

#[derive(Debug)]
pub struct RunReport {
    pub output: PathBuf,
    pub records: usize,
}

/// Render the category page, extract its products and write them out.
pub async fn run<R>(settings: &Settings, renderer: &R) -> Result<RunReport, ScrapeError>
where
    R: PageRenderer + ?Sized,
{
    if settings.category.is_empty() {
        return Err(ScrapeError::Config("no category given".to_string()));
    }

    let url = settings.category_url();
    let html = renderer::render_or_dump(renderer, &url, &settings.debug_path()).await?;
    info!("rendered {} bytes from {url}", html.len());

    let products = parser::parse_products(&html, &settings.site, &settings.markers, settings.price_slot)?;
    if products.is_empty() {
        warn!("no products matched card marker `{}`", settings.markers.card);
    } else {
        info!("extracted {} products", products.len());
    }

    let output = settings.output_path();
    let records = products.len();
    match settings.format {
        OutputFormat::Csv => archiver::save_to_csv(&products, &output, settings.header_lang)?,
        OutputFormat::Json => {
            let snapshot = CatalogSnapshot::new(&settings.category, &url, products);
            archiver::save_to_json(&snapshot, &output)?;
        }
    }

    Ok(RunReport { output, records })
}
