//! Extraction pipeline.
//!
//! One request drives one rendered page through a strict sequence:
//! navigate, read the embedded payload, run DOM heuristics, reveal
//! options interactively, scroll for lazy assets, collect images, then
//! merge everything into one canonical record. Only navigation failures
//! are fatal; every other miss degrades to a sentinel or an empty list.

pub mod dom;
pub mod embedded;
pub mod images;
pub mod options;

use crate::browser::Page;
use crate::error::Result;
use crate::product::{PartialRecord, ProductRecord, NO_ARTIST, NO_DESCRIPTION, NO_PRICE, NO_TITLE};

/// Settle delay after initial navigation; the page hydrates well after
/// the document-loaded event fires
const INITIAL_SETTLE_MS: u64 = 3000;

/// A DOM description must beat the embedded one by this many
/// characters to win the merge
const DESCRIPTION_LENGTH_MARGIN: usize = 200;

/// Extract one product record from the given URL.
pub fn extract_product(page: &Page, url: &str) -> Result<ProductRecord> {
    log::info!("extracting {}", url);

    page.goto(url)?;
    page.settle(INITIAL_SETTLE_MS);

    let initial_markup = page.content().unwrap_or_default();
    let embedded = embedded::extract(page, &initial_markup);

    let mut dom_partial = dom::extract(page);
    dom_partial.options = options::reveal(page);

    // Expand the collapsed details region so the scroll pass walks the
    // full description, not just its preview.
    if page.click_text(&["작품 정보 더보기"]) {
        page.settle(1000);
    }

    images::scroll_for_lazy_assets(page);

    let markup = page.content().unwrap_or(initial_markup);
    dom_partial.images = images::collect(page, &markup, &page.captured_images());

    let record = merge(url, embedded, dom_partial);
    log::info!(
        "extracted \"{}\" by {} ({} options, {} images)",
        record.title,
        record.artist_name,
        record.options.len(),
        record.images.len()
    );
    Ok(record)
}

/// Reconcile the per-source partial records into one canonical record.
///
/// The embedded payload wins every field it confidently produced; it
/// is not subject to rendering races. The DOM value fills the gaps,
/// and a fixed sentinel backs each scalar field so the record never
/// carries an empty string. The one exception is the description,
/// where a substantially longer DOM candidate is assumed to be the
/// more complete one.
pub fn merge(url: &str, embedded: PartialRecord, dom: PartialRecord) -> ProductRecord {
    let title = pick(embedded.title, dom.title).unwrap_or_else(|| NO_TITLE.to_string());
    let artist_name = pick(embedded.artist_name, dom.artist_name).unwrap_or_else(|| NO_ARTIST.to_string());
    let price = pick(embedded.price, dom.price).unwrap_or_else(|| NO_PRICE.to_string());
    let description =
        pick_description(embedded.description, dom.description).unwrap_or_else(|| NO_DESCRIPTION.to_string());

    let options = if !embedded.options.is_empty() { embedded.options } else { dom.options };
    let images = if !embedded.images.is_empty() { embedded.images } else { dom.images };

    ProductRecord {
        url: url.to_string(),
        title,
        artist_name,
        price,
        description,
        options,
        images,
        image_texts: Vec::new(),
    }
}

fn pick(primary: Option<String>, fallback: Option<String>) -> Option<String> {
    non_empty(primary).or_else(|| non_empty(fallback))
}

fn pick_description(embedded: Option<String>, dom: Option<String>) -> Option<String> {
    match (non_empty(embedded), non_empty(dom)) {
        (Some(e), Some(d)) => {
            if d.chars().count() >= e.chars().count() + DESCRIPTION_LENGTH_MARGIN {
                Some(d)
            } else {
                Some(e)
            }
        }
        (Some(e), None) => Some(e),
        (None, d) => d,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::OptionGroup;

    const URL: &str = "https://www.idus.com/v2/product/abc";

    #[test]
    fn test_merge_empty_partials_yields_sentinels() {
        let record = merge(URL, PartialRecord::default(), PartialRecord::default());

        assert_eq!(record.title, NO_TITLE);
        assert_eq!(record.artist_name, NO_ARTIST);
        assert_eq!(record.price, NO_PRICE);
        assert_eq!(record.description, NO_DESCRIPTION);
        assert!(record.options.is_empty());
        assert!(record.images.is_empty());
        assert!(!record.title.is_empty());
    }

    #[test]
    fn test_merge_embedded_wins_scalar_fields() {
        let embedded = PartialRecord {
            title: Some("수제 가죽 지갑".to_string()),
            price: Some("45,000원".to_string()),
            ..Default::default()
        };
        let dom = PartialRecord {
            title: Some("다른 제목".to_string()),
            artist_name: Some("가죽공방".to_string()),
            price: Some("50,000원".to_string()),
            ..Default::default()
        };

        let record = merge(URL, embedded, dom);
        assert_eq!(record.title, "수제 가죽 지갑");
        assert_eq!(record.price, "45,000원");
        // DOM fills the field the payload missed
        assert_eq!(record.artist_name, "가죽공방");
    }

    #[test]
    fn test_merge_blank_embedded_value_falls_through() {
        let embedded = PartialRecord { title: Some("   ".to_string()), ..Default::default() };
        let dom = PartialRecord { title: Some("수제 도자기 컵".to_string()), ..Default::default() };

        let record = merge(URL, embedded, dom);
        assert_eq!(record.title, "수제 도자기 컵");
    }

    #[test]
    fn test_merge_description_prefers_substantially_longer() {
        let short = "기본 설명".repeat(30);
        let long = "상세한 설명".repeat(200);

        let embedded = PartialRecord { description: Some(short.clone()), ..Default::default() };
        let dom = PartialRecord { description: Some(long.clone()), ..Default::default() };
        assert_eq!(merge(URL, embedded, dom).description, long);

        // slightly longer is not enough to displace the embedded value
        let embedded = PartialRecord { description: Some(short.clone()), ..Default::default() };
        let dom = PartialRecord { description: Some(format!("{}덧붙임", short)), ..Default::default() };
        assert_eq!(merge(URL, embedded, dom).description, short);
    }

    #[test]
    fn test_merge_options_prefer_producing_source() {
        let dom_only = PartialRecord {
            options: vec![OptionGroup::from_raw("색상", vec!["브라운".to_string()])],
            ..Default::default()
        };
        let record = merge(URL, PartialRecord::default(), dom_only);
        assert_eq!(record.options.len(), 1);

        let embedded = PartialRecord {
            options: vec![OptionGroup::from_raw("사이즈", vec!["S".to_string()])],
            ..Default::default()
        };
        let dom = PartialRecord {
            options: vec![OptionGroup::from_raw("색상", vec!["브라운".to_string()])],
            ..Default::default()
        };
        let record = merge(URL, embedded, dom);
        assert_eq!(record.options[0].name, "사이즈");
    }
}
