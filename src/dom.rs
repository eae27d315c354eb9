//! Structural element lookup by class-name substring.
//!
//! Listing markup produced by CSS-module builds carries hashed class names
//! such as `ProductCard_root__x7Fq2`, so cards are found by a stable prefix
//! of one class token rather than by an exact selector.

use scraper::{ElementRef, Html};

use crate::error::ScrapeError;

/// A substring that must appear inside one whitespace-delimited class token.
#[derive(Debug, Clone, Copy)]
pub struct ClassMarker<'m>(&'m str);

impl<'m> ClassMarker<'m> {
    /// Markers must be non-empty and free of whitespace, since they are
    /// matched against single class tokens.
    pub fn new(marker: &'m str) -> Result<Self, ScrapeError> {
        if marker.is_empty() || marker.chars().any(char::is_whitespace) {
            return Err(ScrapeError::Parse(format!(
                "invalid class marker {marker:?}: must be a non-empty single token"
            )));
        }
        Ok(Self(marker))
    }

    pub fn as_str(&self) -> &'m str {
        self.0
    }

    pub fn matches(&self, element: &ElementRef<'_>) -> bool {
        element.value().classes().any(|class| class.contains(self.0))
    }

    /// All matching elements of the document, in document order.
    pub fn find_all<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        doc.root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| self.matches(el))
            .collect()
    }

    /// First matching descendant of `scope`, excluding `scope` itself.
    pub fn find_first_in<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        descendants(scope).find(|el| self.matches(el))
    }
}

/// Element descendants of `scope` in document order, excluding `scope`.
pub fn descendants<'a>(scope: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    scope.descendants().skip(1).filter_map(ElementRef::wrap)
}

/// Descendant elements of `scope` with the given tag name.
pub fn descendants_by_tag<'a>(scope: ElementRef<'a>, tag: &str) -> Vec<ElementRef<'a>> {
    descendants(scope)
        .filter(|el| el.value().name().eq_ignore_ascii_case(tag))
        .collect()
}

pub fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect()
}
