//! DOM heuristic extraction.
//!
//! Fallback source for fields the embedded payload did not surface.
//! Each field has an ordered list of strategies behind one capability
//! interface; the first validated non-empty match wins. A strategy
//! that fails or finds nothing is silent: the field simply falls
//! through to the next strategy, and ultimately to the sentinel.

use crate::browser::Page;
use crate::error::Result;
use crate::product::PartialRecord;

/// Site suffix appended to every document title
const TITLE_SUFFIX: &str = " | 아이디어스";

/// Maximum description length carried downstream
const DESCRIPTION_CAP: usize = 6000;

const ARTIST_NOISE: &[&str] = &["바로가기", "작가", "홈", "샵"];

/// Tab labels that reveal the long-form description block
const DETAIL_TAB_LABELS: &[&str] = &["작품정보", "상품정보", "상세정보"];

/// One extraction attempt against the rendered page.
pub trait FieldStrategy {
    fn name(&self) -> &str;

    /// Try to produce a validated value. `Ok(None)` means the strategy
    /// found nothing usable; errors are downgraded by the runner.
    fn attempt(&self, page: &Page) -> Result<Option<String>>;
}

/// Generic strategy backed by a page script returning a string or null.
struct ScriptStrategy {
    name: &'static str,
    script: &'static str,
    validate: fn(&str) -> bool,
}

impl FieldStrategy for ScriptStrategy {
    fn name(&self) -> &str {
        self.name
    }

    fn attempt(&self, page: &Page) -> Result<Option<String>> {
        let Some(raw) = page.eval_string(self.script)? else {
            return Ok(None);
        };
        let trimmed = raw.trim();
        Ok(((self.validate)(trimmed)).then(|| trimmed.to_string()))
    }
}

/// Document-title metadata with the site suffix stripped.
struct TitleFromMetadata;

impl FieldStrategy for TitleFromMetadata {
    fn name(&self) -> &str {
        "title-metadata"
    }

    fn attempt(&self, page: &Page) -> Result<Option<String>> {
        let title = page.title()?;
        Ok(strip_site_suffix(&title))
    }
}

/// Run strategies in order until the first validated match.
fn first_match(page: &Page, strategies: &[&dyn FieldStrategy]) -> Option<String> {
    for strategy in strategies {
        match strategy.attempt(page) {
            Ok(Some(value)) => {
                log::debug!("strategy {} matched", strategy.name());
                return Some(value);
            }
            Ok(None) => {}
            Err(e) => log::debug!("strategy {} failed (ignored): {}", strategy.name(), e),
        }
    }
    None
}

/// Extract all heuristic fields from the rendered DOM.
pub fn extract(page: &Page) -> PartialRecord {
    PartialRecord {
        title: extract_title(page),
        artist_name: extract_artist(page),
        price: extract_price(page),
        description: extract_description(page),
        options: Vec::new(),
        images: Vec::new(),
    }
}

pub fn extract_title(page: &Page) -> Option<String> {
    const HEADING_JS: &str = r#"
        (() => {
            const el = document.querySelector('h1');
            if (!el) return null;
            const text = (el.innerText || '').trim();
            return text.length >= 3 ? text : null;
        })()
    "#;

    let heading = ScriptStrategy { name: "title-heading", script: HEADING_JS, validate: valid_title };
    first_match(page, &[&TitleFromMetadata, &heading])
}

pub fn extract_artist(page: &Page) -> Option<String> {
    const ARTIST_LINK_JS: &str = r#"
        (() => {
            const links = document.querySelectorAll('a[href*="/artist/"]');
            for (const link of links) {
                const text = (link.innerText || '').trim();
                if (text.length >= 2 && text.length <= 30) {
                    if (!text.includes('바로가기') && !text.includes('작가') &&
                        !text.includes('홈') && !text.includes('샵')) {
                        return text;
                    }
                }
            }
            return null;
        })()
    "#;

    const ARTIST_CLASS_JS: &str = r#"
        (() => {
            const selectors = [
                '[class*="artist-name"]',
                '[class*="artistName"]',
                '[class*="seller-name"]',
                '[class*="shop-name"]',
                '[class*="author"]'
            ];
            for (const sel of selectors) {
                const el = document.querySelector(sel);
                if (el) {
                    const text = (el.innerText || '').trim();
                    if (text.length >= 2 && text.length <= 30) return text;
                }
            }
            return null;
        })()
    "#;

    const META_AUTHOR_JS: &str = r#"
        (() => {
            const meta = document.querySelector('meta[name="author"]');
            if (!meta) return null;
            const content = (meta.getAttribute('content') || '').trim();
            return content.length >= 2 ? content : null;
        })()
    "#;

    let link = ScriptStrategy { name: "artist-link", script: ARTIST_LINK_JS, validate: valid_artist };
    let class = ScriptStrategy { name: "artist-class", script: ARTIST_CLASS_JS, validate: valid_artist };
    let meta = ScriptStrategy { name: "artist-meta", script: META_AUTHOR_JS, validate: valid_artist };
    first_match(page, &[&link, &class, &meta])
}

pub fn extract_price(page: &Page) -> Option<String> {
    const PRICE_CLASS_JS: &str = r#"
        (() => {
            const selectors = [
                '[class*="sale-price"]',
                '[class*="salePrice"]',
                '[class*="final-price"]',
                '[class*="finalPrice"]',
                '[class*="discount-price"]',
                '[class*="price"]'
            ];
            for (const sel of selectors) {
                for (const el of document.querySelectorAll(sel)) {
                    const match = (el.innerText || '').match(/([\d,]{3,})\s*원/);
                    if (match) return match[0];
                }
            }
            return null;
        })()
    "#;

    const PRICE_BODY_JS: &str = r#"
        (() => {
            const match = (document.body.innerText || '').match(/([\d,]{4,})\s*원/);
            return match ? match[0] : null;
        })()
    "#;

    let class = ScriptStrategy { name: "price-class", script: PRICE_CLASS_JS, validate: valid_price };
    let body = ScriptStrategy { name: "price-body", script: PRICE_BODY_JS, validate: valid_price };
    first_match(page, &[&class, &body])
}

/// The long-form description hides behind a details tab; activate it
/// first, then pick the longest sufficiently-long text block among
/// candidate containers.
pub fn extract_description(page: &Page) -> Option<String> {
    const LONGEST_BLOCK_JS: &str = r#"
        (() => {
            const selectors = ['article', '[class*="detail"]', '[class*="description"]', '[class*="content"]', 'main'];
            let longest = '';
            for (const sel of selectors) {
                document.querySelectorAll(sel).forEach(el => {
                    const t = el.innerText || '';
                    if (t.length > longest.length && t.length > 100) {
                        const noisy = t.includes('로그인') || t.includes('장바구니');
                        if (!noisy || t.length > 2000) {
                            longest = t;
                        }
                    }
                });
            }
            return longest || null;
        })()
    "#;

    if page.click_text(DETAIL_TAB_LABELS) {
        page.settle(1000);
    }

    let block = ScriptStrategy { name: "description-block", script: LONGEST_BLOCK_JS, validate: valid_description };
    first_match(page, &[&block]).map(|text| clip_chars(&text, DESCRIPTION_CAP))
}

fn strip_site_suffix(title: &str) -> Option<String> {
    let clean = title.replace(TITLE_SUFFIX, "");
    let clean = clean.trim();
    valid_title(clean).then(|| clean.to_string())
}

fn valid_title(text: &str) -> bool {
    text.chars().count() >= 3
}

fn valid_artist(text: &str) -> bool {
    let len = text.chars().count();
    (2..=30).contains(&len) && !ARTIST_NOISE.iter().any(|noise| text.contains(noise))
}

fn valid_price(text: &str) -> bool {
    text.contains('원') && text.chars().any(|c| c.is_ascii_digit())
}

fn valid_description(text: &str) -> bool {
    text.chars().count() > 100
}

fn clip_chars(text: &str, cap: usize) -> String {
    text.chars().take(cap).collect()
}
