//! Detail-image collection and canonicalization.
//!
//! Four capture channels feed one union: the rendered DOM (attributes,
//! srcset, background styles, with page coordinates), a regex scan of
//! the raw markup (catches script-injected assets the live DOM misses),
//! and image responses captured off the network during load and scroll
//! (catches transiently-rendered assets). The CDN serves the same asset
//! at many resolutions under one content identifier; canonicalization
//! keeps exactly the largest variant per identifier, in first-observed
//! document order.

use crate::browser::Page;
use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;

/// Upper bound on canonical images carried downstream; each one is a
/// vision-model call later.
pub const MAX_IMAGES: usize = 15;

/// Variants below this declared size are thumbnails, not detail images
const MIN_SIZE_SUFFIX: u32 = 300;

/// Scroll step, roughly half a viewport
const SCROLL_STEP: u64 = 400;

/// Settle delay per scroll step
const SCROLL_SETTLE_MS: u64 = 300;

/// Scroll step budget
const SCROLL_MAX_STEPS: u32 = 60;

/// URL substrings marking chrome assets, badges and foreign regions
const EXCLUDE_PATTERNS: &[&str] = &[
    "/icon",
    "/sprite",
    "/logo",
    "/avatar",
    "/badge",
    "/emoji",
    "/button",
    "/arrow",
    "/profile",
    "facebook.",
    "twitter.",
    "instagram.",
    "kakao.",
    "naver.",
    "/escrow",
    "/membership",
    "/banner",
    "/thumbnail",
    "/thumb_",
    "_thumb",
    "/review/",
    "/comment/",
    "/artist/",
    "/shop/",
    "data:image",
    ".svg",
];

/// An image URL observed at a page position
#[derive(Debug, Clone, Deserialize)]
pub struct ImageCandidate {
    pub url: String,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub x: f64,
}

/// Drive the lazy-load scroll, then union all capture channels and
/// canonicalize. `markup` should be read after the scroll so it
/// includes late-injected assets.
pub fn collect(page: &Page, markup: &str, network: &[String]) -> Vec<String> {
    let mut ordered: Vec<String> = Vec::new();

    const COLLECT_IMAGES_JS: &str = include_str!("collect_images.js");
    match page.eval_json::<Vec<ImageCandidate>>(COLLECT_IMAGES_JS) {
        Ok(Some(candidates)) => {
            log::debug!("dom image scan: {} candidates", candidates.len());
            ordered.extend(candidates.into_iter().map(|c| c.url));
        }
        Ok(None) => {}
        Err(e) => log::debug!("dom image scan failed (ignored): {}", e),
    }

    let from_markup = scan_markup(markup);
    log::debug!("markup image scan: {} candidates", from_markup.len());
    ordered.extend(from_markup);

    log::debug!("network capture: {} candidates", network.len());
    ordered.extend(network.iter().cloned());

    canonicalize(ordered)
}

/// Run the incremental scroll that makes lazy assets materialize.
/// A single jump to the bottom would leave most of them unloaded.
pub fn scroll_for_lazy_assets(page: &Page) {
    if let Err(e) = page.scroll_to_bottom(SCROLL_STEP, SCROLL_SETTLE_MS, SCROLL_MAX_STEPS) {
        log::debug!("scroll failed (ignored): {}", e);
    }
}

/// Regex scan of raw markup for CDN asset URLs, including the
/// escaped form used inside inline script payloads.
pub fn scan_markup(markup: &str) -> Vec<String> {
    let unescaped = markup.replace("\\/", "/");
    let patterns = [
        r"(?i)https?://image\.idus\.com/image/files/[a-f0-9]+(?:_\d+)?\.(?:jpg|jpeg|png|webp|gif)",
        r#"(?i)https?://cdn\.idus\.kr[^\s'")>]+\.(?:jpg|jpeg|png|webp|gif)"#,
    ];

    let mut found = Vec::new();
    for pattern in patterns {
        let Ok(re) = Regex::new(pattern) else { continue };
        for m in re.find_iter(&unescaped) {
            found.push(m.as_str().to_string());
        }
    }
    found
}

/// Reduce an ordered candidate stream to the canonical image list.
///
/// Candidates sharing a CDN content identifier collapse to the
/// largest declared variant (no size suffix means the original, which
/// outranks every sized variant); candidates without an identifier
/// dedupe exactly. Output order is the first observation of each
/// identity, so repeated runs over the same stream are stable, and
/// the result is idempotent under re-canonicalization.
pub fn canonicalize<I>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let id_re = match Regex::new(r"(?i)files/([a-f0-9]{6,})(?:_(\d+))?\.(?:jpg|jpeg|png|webp|gif)") {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };

    let mut canonical: IndexMap<String, (u32, String)> = IndexMap::new();

    for url in urls {
        if !url.starts_with("http") {
            continue;
        }
        if is_excluded(&url) {
            continue;
        }

        match id_re.captures(&url) {
            Some(captures) => {
                let id = captures[1].to_lowercase();
                let size = match captures.get(2) {
                    Some(suffix) => match suffix.as_str().parse::<u32>() {
                        Ok(size) if size >= MIN_SIZE_SUFFIX => size,
                        _ => continue,
                    },
                    // no suffix: the original asset, larger than any variant
                    None => u32::MAX,
                };
                match canonical.get_mut(&id) {
                    Some(existing) => {
                        if size > existing.0 {
                            *existing = (size, url);
                        }
                    }
                    None => {
                        canonical.insert(id, (size, url));
                    }
                }
            }
            None => {
                let key = format!("url:{}", url);
                canonical.entry(key).or_insert((0, url));
            }
        }
    }

    canonical.into_iter().map(|(_, (_, url))| url).take(MAX_IMAGES).collect()
}

fn is_excluded(url: &str) -> bool {
    let low = url.to_lowercase();
    EXCLUDE_PATTERNS.iter().any(|pattern| low.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_canonical_keeps_max_resolution() {
        let input = urls(&[
            "https://image.idus.com/image/files/abc123_100.jpg",
            "https://image.idus.com/image/files/abc123_720.jpg",
        ]);

        assert_eq!(
            canonicalize(input),
            vec!["https://image.idus.com/image/files/abc123_720.jpg"]
        );
    }

    #[test]
    fn test_canonical_keeps_size_800_over_100() {
        let input = urls(&[
            "https://image.idus.com/image/files/deadbeef01_100.jpg",
            "https://image.idus.com/image/files/deadbeef01_800.jpg",
        ]);

        let output = canonicalize(input);
        assert_eq!(output, vec!["https://image.idus.com/image/files/deadbeef01_800.jpg"]);
    }

    #[test]
    fn test_suffixless_original_outranks_sized_variants() {
        let input = urls(&[
            "https://image.idus.com/image/files/abc123_720.jpg",
            "https://image.idus.com/image/files/abc123.jpg",
        ]);

        assert_eq!(canonicalize(input), vec!["https://image.idus.com/image/files/abc123.jpg"]);
    }

    #[test]
    fn test_order_follows_first_observation() {
        let input = urls(&[
            "https://image.idus.com/image/files/aaa111_400.jpg",
            "https://image.idus.com/image/files/bbb222_400.jpg",
            "https://image.idus.com/image/files/aaa111_800.jpg",
        ]);

        // aaa111 upgrades to the 800 variant but keeps its slot
        assert_eq!(
            canonicalize(input),
            vec![
                "https://image.idus.com/image/files/aaa111_800.jpg",
                "https://image.idus.com/image/files/bbb222_400.jpg",
            ]
        );
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let input = urls(&[
            "https://image.idus.com/image/files/aaa111_400.jpg",
            "https://image.idus.com/image/files/bbb222.png",
            "https://www.idus.com/static/photo.jpg",
        ]);

        let once = canonicalize(input);
        let twice = canonicalize(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_exclusion_filtering() {
        let input = urls(&[
            "https://image.idus.com/image/files/abc123_720.jpg",
            "https://image.idus.com/logo/main.png",
            "https://image.idus.com/image/avatar/user.jpg",
            "https://image.idus.com/image/files/fff999.svg",
            "https://cdn.kakao.com/share.png",
        ]);

        assert_eq!(canonicalize(input), vec!["https://image.idus.com/image/files/abc123_720.jpg"]);
    }

    #[test]
    fn test_small_size_suffix_dropped() {
        let input = urls(&["https://image.idus.com/image/files/abc123_200.jpg"]);
        assert!(canonicalize(input).is_empty());
    }

    #[test]
    fn test_non_cdn_urls_dedupe_exactly() {
        let input = urls(&[
            "https://www.idus.com/static/detail-a.jpg",
            "https://www.idus.com/static/detail-a.jpg",
            "https://www.idus.com/static/detail-b.jpg",
        ]);

        assert_eq!(
            canonicalize(input),
            vec![
                "https://www.idus.com/static/detail-a.jpg",
                "https://www.idus.com/static/detail-b.jpg",
            ]
        );
    }

    #[test]
    fn test_output_is_capped() {
        let input: Vec<String> = (0..30)
            .map(|i| format!("https://image.idus.com/image/files/aa{:04x}00_720.jpg", i))
            .collect();

        assert_eq!(canonicalize(input).len(), MAX_IMAGES);
    }

    #[test]
    fn test_scan_markup_finds_escaped_urls() {
        let markup = r#"
            <img src="https://image.idus.com/image/files/abc123_720.jpg">
            <script>window.__NUXT__={"img":"https:\/\/image.idus.com\/image\/files\/def456_1280.webp"}</script>
        "#;

        let found = scan_markup(markup);
        assert!(found.contains(&"https://image.idus.com/image/files/abc123_720.jpg".to_string()));
        assert!(found.contains(&"https://image.idus.com/image/files/def456_1280.webp".to_string()));
    }
}
