use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CARD_MARKER: &str = "ProductCard_root";
pub const NAME_MARKER: &str = "ProductCard_name";
pub const PRICE_MARKER: &str = "ProductCardActions_text";

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const SETTLE_DELAY: Duration = Duration::from_secs(1);
pub const RENDER_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEBUG_FILE: &str = "debug.html";

/// Class-name substrings that identify the parts of a product card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    pub card: String,
    pub name: String,
    pub price: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            card: CARD_MARKER.to_string(),
            name: NAME_MARKER.to_string(),
            price: PRICE_MARKER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// Language of the CSV header labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum HeaderLang {
    #[default]
    En,
    Ru,
}

impl HeaderLang {
    pub fn labels(self) -> [&'static str; 3] {
        match self {
            Self::En => ["Name", "Price", "URL"],
            Self::Ru => ["Название", "Цена", "Ссылка"],
        }
    }
}

/// Which price-action text node carries the current price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PriceSlot {
    /// Third node when more than two are present, otherwise the first.
    #[default]
    Third,
    /// Always the first node.
    First,
}

/// Browser launch and wait parameters.
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub user_agent: String,
    pub headless: bool,
    pub executable: Option<PathBuf>,
    pub settle_delay: Duration,
    pub timeout: Duration,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
            headless: true,
            executable: None,
            settle_delay: SETTLE_DELAY,
            timeout: RENDER_TIMEOUT,
        }
    }
}

/// Everything one run needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct Settings {
    pub site: String,
    pub category: String,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    pub header_lang: HeaderLang,
    pub markers: Markers,
    pub price_slot: PriceSlot,
    pub browser: BrowserSettings,
}

impl Settings {
    pub fn new(site: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            category: category.into(),
            output_dir: PathBuf::from("."),
            format: OutputFormat::default(),
            header_lang: HeaderLang::default(),
            markers: Markers::default(),
            price_slot: PriceSlot::default(),
            browser: BrowserSettings::default(),
        }
    }

    pub fn category_url(&self) -> String {
        format!("https://{}/category/{}", self.site, self.category)
    }

    pub fn output_path(&self) -> PathBuf {
        self.in_output_dir(&format!(
            "products_{}.{}",
            self.category,
            self.format.extension()
        ))
    }

    pub fn debug_path(&self) -> PathBuf {
        self.in_output_dir(DEBUG_FILE)
    }

    /// Files in the working directory are named without a `./` prefix.
    fn in_output_dir(&self, file_name: &str) -> PathBuf {
        if self.output_dir == Path::new(".") {
            PathBuf::from(file_name)
        } else {
            self.output_dir.join(file_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_category_url() {
        let settings = Settings::new("shop.example", "phones");
        assert_eq!(settings.category_url(), "https://shop.example/category/phones");
    }

    #[test]
    fn empty_site_is_not_validated() {
        let settings = Settings::new("", "phones");
        assert_eq!(settings.category_url(), "https:///category/phones");
    }

    #[test]
    fn output_name_follows_category_and_format() {
        let mut settings = Settings::new("shop.example", "laptops");
        assert_eq!(settings.output_path().to_str(), Some("products_laptops.csv"));
        assert_eq!(settings.debug_path().to_str(), Some("debug.html"));
        settings.format = OutputFormat::Json;
        assert_eq!(settings.output_path().to_str(), Some("products_laptops.json"));
        settings.output_dir = PathBuf::from("out");
        assert_eq!(settings.output_path(), Path::new("out").join("products_laptops.json"));
    }

    #[test]
    fn header_labels() {
        assert_eq!(HeaderLang::En.labels(), ["Name", "Price", "URL"]);
        assert_eq!(HeaderLang::Ru.labels()[2], "Ссылка");
    }
}
