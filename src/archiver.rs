use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{QuoteStyle, WriterBuilder};

use crate::config::HeaderLang;
use crate::error::ScrapeError;
use crate::models::{CatalogSnapshot, Product};

pub const FIELD_SEPARATOR: u8 = b';';

/// Write products as a `;`-separated table with a three-column header.
///
/// Values are written verbatim; a value containing the separator will
/// shift the columns of its row.
pub fn save_to_csv(products: &[Product], path: &Path, lang: HeaderLang) -> Result<(), ScrapeError> {
    write_csv(products, path, lang).map_err(|source| ScrapeError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn write_csv(products: &[Product], path: &Path, lang: HeaderLang) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .delimiter(FIELD_SEPARATOR)
        .quote_style(QuoteStyle::Never)
        .from_path(path)
        .context("failed to create file")?;

    writer
        .write_record(lang.labels())
        .context("failed to write header")?;
    for product in products {
        writer
            .write_record([&product.name, &product.price, &product.url])
            .context("failed to write row")?;
    }
    writer.flush().context("failed to flush")?;
    Ok(())
}

pub fn save_to_json(snapshot: &CatalogSnapshot, path: &Path) -> Result<(), ScrapeError> {
    write_json(snapshot, path).map_err(|source| ScrapeError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json(snapshot: &CatalogSnapshot, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    let mut file = File::create(path).context("failed to create file")?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use csv::ReaderBuilder;

    fn sample() -> Vec<Product> {
        vec![
            Product {
                name: "Phone X".into(),
                price: "39".into(),
                url: "https://shop.example/item/1".into(),
            },
            Product {
                name: String::new(),
                price: String::new(),
                url: "https://shop.example/item/2?ref=list".into(),
            },
            Product {
                name: "Чайник".into(),
                price: "1200".into(),
                url: "https://shop.example/item/3".into(),
            },
        ]
    }

    #[test]
    fn csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products_test.csv");
        let products = sample();
        save_to_csv(&products, &path, HeaderLang::En).unwrap();

        let mut reader = ReaderBuilder::new()
            .delimiter(FIELD_SEPARATOR)
            .has_headers(false)
            .from_path(&path)
            .unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), products.len() + 1);
        assert_eq!(rows[0].iter().collect::<Vec<_>>(), ["Name", "Price", "URL"]);
        for (row, product) in rows[1..].iter().zip(&products) {
            assert_eq!(
                row.iter().collect::<Vec<_>>(),
                [product.name.as_str(), product.price.as_str(), product.url.as_str()]
            );
        }
    }

    #[test]
    fn csv_raw_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        save_to_csv(&sample()[..1], &path, HeaderLang::Ru).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "Название;Цена;Ссылка\nPhone X;39;https://shop.example/item/1\n"
        );
    }

    #[test]
    fn empty_list_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        save_to_csv(&[], &path, HeaderLang::En).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Name;Price;URL\n");
    }

    #[test]
    fn unwritable_path_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let err = save_to_csv(&sample(), &path, HeaderLang::En).unwrap_err();
        assert!(matches!(err, ScrapeError::Write { .. }));
    }

    #[test]
    fn json_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products_test.json");
        let snapshot = CatalogSnapshot::new("test", "https://shop.example/category/test", sample());
        save_to_json(&snapshot, &path).unwrap();

        let back: CatalogSnapshot =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.category, "test");
        assert_eq!(back.products, sample());
    }
}
