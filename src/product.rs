//! Product data model shared by the extraction pipeline and the translator.

use serde::{Deserialize, Serialize};

/// Placeholder used when no title could be extracted
pub const NO_TITLE: &str = "제목 없음";

/// Placeholder used when no artist name could be extracted
pub const NO_ARTIST: &str = "작가명 없음";

/// Placeholder used when no price could be extracted
pub const NO_PRICE: &str = "가격 정보 없음";

/// Placeholder used when no description could be extracted
pub const NO_DESCRIPTION: &str = "설명 없음";

/// Check whether a field value is one of the fixed "not found" placeholders
pub fn is_sentinel(text: &str) -> bool {
    matches!(text, NO_TITLE | NO_ARTIST | NO_PRICE | NO_DESCRIPTION)
}

/// Target locale for translation, a closed set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetLocale {
    #[serde(rename = "en")]
    En,
    #[serde(rename = "ja")]
    Ja,
}

impl TargetLocale {
    /// Parse a locale code; anything unknown falls back to English
    pub fn from_code(code: &str) -> Self {
        match code {
            "ja" => TargetLocale::Ja,
            _ => TargetLocale::En,
        }
    }

    /// Language name as used inside prompt text
    pub fn language_name(&self) -> &'static str {
        match self {
            TargetLocale::En => "English",
            TargetLocale::Ja => "Japanese",
        }
    }
}

/// A named group of product option values (e.g. 색상: 브라운/블랙)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionGroup {
    pub name: String,
    pub values: Vec<String>,
}

impl OptionGroup {
    /// Build a group from raw harvested values: trimmed, non-empty,
    /// deduplicated preserving first-seen order.
    pub fn from_raw(name: impl Into<String>, values: Vec<String>) -> Self {
        let mut seen = Vec::new();
        for value in values {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !seen.iter().any(|v: &String| v == trimmed) {
                seen.push(trimmed.to_string());
            }
        }
        Self { name: name.into(), values: seen }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Text recovered from a detail image, with its position in the
/// canonical image list so consumers can reconstruct reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageText {
    pub image_url: String,
    pub original_text: String,
    pub translated_text: String,
    pub order_index: usize,
}

/// Canonical product record produced by one scrape.
///
/// Title, artist name, price and description are always non-empty:
/// a fixed placeholder stands in for "not found".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub url: String,
    pub title: String,
    pub artist_name: String,
    pub price: String,
    pub description: String,
    pub options: Vec<OptionGroup>,
    pub images: Vec<String>,
    pub image_texts: Vec<ImageText>,
}

/// Per-source extraction output; every field is optional and the
/// merge step arbitrates between sources.
#[derive(Debug, Clone, Default)]
pub struct PartialRecord {
    pub title: Option<String>,
    pub artist_name: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub options: Vec<OptionGroup>,
    pub images: Vec<String>,
}

impl PartialRecord {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.artist_name.is_none()
            && self.price.is_none()
            && self.description.is_none()
            && self.options.is_empty()
            && self.images.is_empty()
    }
}

/// Immutable wrapper pairing the original record with its translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedProduct {
    pub original: ProductRecord,
    pub translated_title: String,
    pub translated_description: String,
    pub translated_options: Vec<OptionGroup>,
    pub translated_image_texts: Vec<ImageText>,
    pub target_locale: TargetLocale,
}
