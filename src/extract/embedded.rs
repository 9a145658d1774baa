//! Structured-data extraction from the page-embedded Nuxt payload.
//!
//! The product page is script-rendered and ships its state in
//! `window.__NUXT__`. When present, that payload is the
//! highest-confidence source: it is not subject to rendering races, so
//! its values win over DOM heuristics during the merge. No fixed schema
//! is guaranteed across page revisions, so the payload is treated as a
//! generic tagged tree and walked with bounded depth, matching
//! candidate fields by key name rather than by path.

use crate::browser::Page;
use crate::product::{OptionGroup, PartialRecord};
use regex::Regex;
use serde_json::Value;

/// Recursion limit for the payload walk
const MAX_DEPTH: usize = 12;

/// Node budget for the payload walk
const MAX_NODES: usize = 4096;

const TITLE_KEYS: &[&str] = &["productname", "title", "name"];
const ARTIST_KEYS: &[&str] = &["artistname", "sellername", "shopname", "nickname", "author"];
const DESCRIPTION_KEYS: &[&str] = &["description", "productdetail", "detail", "content"];
const PRICE_KEYS: &[&str] = &["saleprice", "finalprice", "discountprice", "sellingprice", "price"];

const OPTION_NAME_KEYS: &[&str] = &["name", "optionname", "title", "label"];
const OPTION_VALUE_KEYS: &[&str] = &["values", "items", "options", "list"];

const ARTIST_NOISE: &[&str] = &["바로가기", "작가홈", "미니샵", "http"];

/// Extract a partial record from the embedded payload.
///
/// Absence of the payload (or a payload we cannot parse) yields an
/// empty partial record; this extractor never fails the request.
pub fn extract(page: &Page, markup: &str) -> PartialRecord {
    match payload(page, markup) {
        Some(value) => {
            let partial = from_payload(&value);
            log::debug!(
                "embedded payload: title={} artist={} price={} description={} options={}",
                partial.title.is_some(),
                partial.artist_name.is_some(),
                partial.price.is_some(),
                partial.description.is_some(),
                partial.options.len()
            );
            partial
        }
        None => {
            log::debug!("no embedded payload found");
            PartialRecord::default()
        }
    }
}

/// Fetch the payload: live evaluation first (handles the
/// function-wrapped form), then a raw-markup scan for the inline
/// script body.
fn payload(page: &Page, markup: &str) -> Option<Value> {
    let script = r#"
        (() => {
            try {
                const data = window.__NUXT__;
                if (!data) return null;
                return JSON.stringify(data);
            } catch (e) {
                return null;
            }
        })()
    "#;
    if let Ok(Some(json)) = page.eval_string(script) {
        if let Ok(value) = serde_json::from_str(&json) {
            return Some(value);
        }
    }
    payload_from_markup(markup)
}

/// Markup fallback used when live evaluation returned nothing.
/// Only the plain-JSON form is recoverable here; the function-wrapped
/// form needs the live page and is silently skipped.
pub fn payload_from_markup(markup: &str) -> Option<Value> {
    let patterns = [
        r#"(?s)window\.__NUXT__\s*=\s*(\{.+?\})\s*;?\s*</script>"#,
        r#"(?s)<script[^>]*id="__NUXT_DATA__"[^>]*>(.+?)</script>"#,
    ];
    for pattern in patterns {
        let re = match Regex::new(pattern) {
            Ok(re) => re,
            Err(_) => continue,
        };
        if let Some(captures) = re.captures(markup) {
            if let Some(body) = captures.get(1) {
                if let Ok(value) = serde_json::from_str::<Value>(body.as_str()) {
                    return Some(value);
                }
            }
        }
    }
    None
}

/// Walk a parsed payload and collect field candidates.
pub fn from_payload(root: &Value) -> PartialRecord {
    let mut walker = Walker::default();
    walker.walk(root, None, 0);

    PartialRecord {
        title: walker.title.map(|c| c.value),
        artist_name: walker.artist.map(|c| c.value),
        price: walker.price.map(|c| c.value),
        description: walker.description.map(|c| c.value),
        options: walker.options,
        images: Vec::new(),
    }
}

/// A field candidate with the score that selected it. Lower scores
/// win for key-priority fields; description inverts this and keeps
/// the longest valid string.
struct Candidate {
    score: usize,
    value: String,
}

#[derive(Default)]
struct Walker {
    nodes: usize,
    title: Option<Candidate>,
    artist: Option<Candidate>,
    description: Option<Candidate>,
    price: Option<Candidate>,
    options: Vec<OptionGroup>,
}

impl Walker {
    fn walk(&mut self, value: &Value, key: Option<&str>, depth: usize) {
        if depth > MAX_DEPTH || self.nodes >= MAX_NODES {
            return;
        }
        self.nodes += 1;

        match value {
            Value::Object(map) => {
                self.try_option_group(map);
                for (child_key, child) in map {
                    self.walk(child, Some(child_key), depth + 1);
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.walk(item, key, depth + 1);
                }
            }
            Value::String(text) => {
                if let Some(key) = key {
                    self.try_string_field(key, text);
                }
            }
            Value::Number(number) => {
                if let Some(key) = key {
                    self.try_price(key, number.as_f64());
                }
            }
            _ => {}
        }
    }

    fn try_string_field(&mut self, key: &str, text: &str) {
        let norm = normalize_key(key);
        let trimmed = text.trim();

        if let Some(priority) = key_priority(&norm, TITLE_KEYS) {
            if valid_title(trimmed) && is_better(&self.title, priority) {
                self.title = Some(Candidate { score: priority, value: trimmed.to_string() });
            }
        }
        if let Some(priority) = key_priority(&norm, ARTIST_KEYS) {
            if valid_artist(trimmed) && is_better(&self.artist, priority) {
                self.artist = Some(Candidate { score: priority, value: trimmed.to_string() });
            }
        }
        if key_priority(&norm, DESCRIPTION_KEYS).is_some() && valid_description(trimmed) {
            // longest-valid-string wins for descriptions
            let longer = self.description.as_ref().map_or(true, |c| trimmed.len() > c.score);
            if longer {
                self.description = Some(Candidate { score: trimmed.len(), value: trimmed.to_string() });
            }
        }
        if let Some(priority) = key_priority(&norm, PRICE_KEYS) {
            if let Some(amount) = parse_amount(trimmed) {
                if is_better(&self.price, priority) {
                    self.price = Some(Candidate { score: priority, value: format_krw(amount) });
                }
            }
        }
    }

    fn try_price(&mut self, key: &str, number: Option<f64>) {
        let norm = normalize_key(key);
        let Some(priority) = key_priority(&norm, PRICE_KEYS) else {
            return;
        };
        let Some(amount) = number else { return };
        if !(100.0..=100_000_000.0).contains(&amount) {
            return;
        }
        if is_better(&self.price, priority) {
            self.price = Some(Candidate { score: priority, value: format_krw(amount as u64) });
        }
    }

    /// Structural match for an option object: a name-like key holding
    /// a short string next to a values-like key holding an array of
    /// scalars. No fixed schema is assumed.
    fn try_option_group(&mut self, map: &serde_json::Map<String, Value>) {
        let name = map.iter().find_map(|(key, value)| {
            if key_priority(&normalize_key(key), OPTION_NAME_KEYS).is_none() {
                return None;
            }
            let text = value.as_str()?.trim();
            (!text.is_empty() && text.chars().count() <= 30).then(|| text.to_string())
        });
        let Some(name) = name else { return };

        let values = map.iter().find_map(|(key, value)| {
            if key_priority(&normalize_key(key), OPTION_VALUE_KEYS).is_none() {
                return None;
            }
            let items = value.as_array()?;
            let strings: Vec<String> = items
                .iter()
                .filter_map(|item| item.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty() && s.chars().count() <= 80)
                .collect();
            (!strings.is_empty()).then_some(strings)
        });
        let Some(values) = values else { return };

        let group = OptionGroup::from_raw(name, values);
        if !group.is_empty() && !self.options.iter().any(|existing| existing.name == group.name) {
            self.options.push(group);
        }
    }
}

fn is_better(current: &Option<Candidate>, priority: usize) -> bool {
    current.as_ref().map_or(true, |c| priority < c.score)
}

fn normalize_key(key: &str) -> String {
    key.chars().filter(|c| c.is_ascii_alphanumeric()).collect::<String>().to_ascii_lowercase()
}

fn key_priority(normalized: &str, keys: &[&str]) -> Option<usize> {
    keys.iter().position(|&k| normalized == k)
}

fn valid_title(text: &str) -> bool {
    let len = text.chars().count();
    (3..=120).contains(&len)
}

fn valid_artist(text: &str) -> bool {
    let len = text.chars().count();
    (2..=30).contains(&len) && !ARTIST_NOISE.iter().any(|noise| text.contains(noise))
}

fn valid_description(text: &str) -> bool {
    text.chars().count() >= 100
}

/// Accept amounts written as bare digits or with grouping commas
fn parse_amount(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() || digits.len() != text.chars().filter(|c| *c != ',' && *c != '원' && !c.is_whitespace()).count() {
        return None;
    }
    let amount = digits.parse::<u64>().ok()?;
    (100..=100_000_000).contains(&amount).then_some(amount)
}

/// Format an amount the way the site displays it: grouped digits plus
/// the won unit, e.g. `18,000원`.
pub fn format_krw(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}원", grouped)
}
