use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};
use tracing::debug;
use url::Url;

use crate::config::{Markers, PriceSlot};
use crate::dom::{self, ClassMarker};
use crate::error::ScrapeError;
use crate::models::Product;

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new("[0-9]+").expect("static regex"));

/// Chooses which text node of a price-action fragment holds the current price.
pub trait PriceSlotPolicy {
    /// Index into `count` candidate nodes, or `None` to leave the price empty.
    fn pick(&self, count: usize) -> Option<usize>;
}

/// Listing layout where a discounted card renders the struck-through
/// original price and decorations before the sale price.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThirdWhenCrowded;

impl PriceSlotPolicy for ThirdWhenCrowded {
    fn pick(&self, count: usize) -> Option<usize> {
        match count {
            0 => None,
            n if n > 2 => Some(2),
            _ => Some(0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FirstSlot;

impl PriceSlotPolicy for FirstSlot {
    fn pick(&self, count: usize) -> Option<usize> {
        (count > 0).then_some(0)
    }
}

pub struct CatalogParser<'a, P = ThirdWhenCrowded> {
    card: ClassMarker<'a>,
    name: ClassMarker<'a>,
    price: ClassMarker<'a>,
    policy: P,
}

impl<'a> CatalogParser<'a, ThirdWhenCrowded> {
    pub fn new(markers: &'a Markers) -> Result<Self, ScrapeError> {
        Self::with_policy(markers, ThirdWhenCrowded)
    }
}

impl<'a, P: PriceSlotPolicy> CatalogParser<'a, P> {
    pub fn with_policy(markers: &'a Markers, policy: P) -> Result<Self, ScrapeError> {
        Ok(Self {
            card: ClassMarker::new(&markers.card)?,
            name: ClassMarker::new(&markers.name)?,
            price: ClassMarker::new(&markers.price)?,
            policy,
        })
    }

    /// Extract one product per card fragment, in document order.
    pub fn parse_products(&self, html: &str, site: &str) -> Vec<Product> {
        let doc = Html::parse_document(html);
        if !doc.errors.is_empty() {
            debug!("HTML parsed with {} recoverable errors", doc.errors.len());
        }

        self.card
            .find_all(&doc)
            .into_iter()
            .map(|card| Product {
                name: self.extract_name(card),
                price: self.extract_price(card),
                url: extract_url(card, site),
            })
            .collect()
    }

    fn extract_name(&self, card: ElementRef<'_>) -> String {
        self.name
            .find_first_in(card)
            .map(|el| dom::text_of(el).trim().to_string())
            .unwrap_or_default()
    }

    fn extract_price(&self, card: ElementRef<'_>) -> String {
        let Some(actions) = self.price.find_first_in(card) else {
            return String::new();
        };
        let spans = dom::descendants_by_tag(actions, "span");
        self.policy
            .pick(spans.len())
            .and_then(|i| spans.get(i).copied())
            .map(|span| first_digit_run(&dom::text_of(span)))
            .unwrap_or_default()
    }
}

pub fn first_digit_run(text: &str) -> String {
    DIGITS
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn extract_url(card: ElementRef<'_>, site: &str) -> String {
    let href = card
        .parent()
        .and_then(ElementRef::wrap)
        .and_then(|parent| parent.value().attr("href"))
        .unwrap_or("");
    resolve_link(site, href)
}

/// Resolve a card link against `https://{site}/`.
///
/// Root-relative paths are appended to the origin verbatim, so the host and
/// path keep their case and Unicode text. Absolute, protocol-relative and
/// path-relative links go through URL resolution. An empty href yields the
/// bare origin.
pub fn resolve_link(site: &str, href: &str) -> String {
    if href.is_empty() || (href.starts_with('/') && !href.starts_with("//")) {
        return format!("https://{site}{href}");
    }
    match Url::parse(&format!("https://{site}/")).and_then(|base| base.join(href)) {
        Ok(url) => url.to_string(),
        Err(e) => {
            debug!("cannot resolve {href:?} against {site:?}: {e}");
            format!("https://{site}{href}")
        }
    }
}

pub fn parse_products(
    html: &str,
    site: &str,
    markers: &Markers,
    slot: PriceSlot,
) -> Result<Vec<Product>, ScrapeError> {
    let products = match slot {
        PriceSlot::Third => CatalogParser::new(markers)?.parse_products(html, site),
        PriceSlot::First => CatalogParser::with_policy(markers, FirstSlot)?.parse_products(html, site),
    };
    Ok(products)
}
