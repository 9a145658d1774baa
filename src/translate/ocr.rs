//! OCR sub-pipeline.
//!
//! Runs strictly sequentially over the capped canonical image list,
//! the most latency- and cost-expensive stage, sharing the
//! orchestrator's rate gate. One image failing to download, decode or
//! survive throttling is skipped; it never aborts the rest of the
//! batch.

use crate::product::{ImageText, TargetLocale};
use crate::translate::prompts::{self, PromptKind};
use crate::translate::Translator;
use std::time::Duration;

/// Per-image download timeout
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Vision results shorter than this are noise, not recovered text
const MIN_TEXT_CHARS: usize = 10;

/// Extract and translate the text embedded in each image.
///
/// `order_index` records the image's position in the canonical list so
/// consumers can reconstruct reading order.
pub async fn read_images(translator: &Translator, images: &[String], locale: TargetLocale) -> Vec<ImageText> {
    if images.is_empty() || !translator.is_ready() {
        return Vec::new();
    }

    let http = match reqwest::Client::builder().timeout(FETCH_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            log::warn!("could not build image fetch client, skipping OCR: {}", e);
            return Vec::new();
        }
    };

    let mut results = Vec::new();
    for (index, url) in images.iter().enumerate() {
        log::debug!("ocr [{}/{}] {}", index + 1, images.len(), url);
        match read_one(translator, &http, url).await {
            Ok(Some(text)) => {
                let translated = translator.translate_text(&text, locale, PromptKind::Generic).await;
                results.push(ImageText {
                    image_url: url.clone(),
                    original_text: text,
                    translated_text: translated,
                    order_index: index,
                });
            }
            Ok(None) => log::debug!("no text in image {}", index),
            Err(e) => log::warn!("image {} skipped: {}", index, e),
        }
    }
    results
}

async fn read_one(translator: &Translator, http: &reqwest::Client, url: &str) -> crate::error::Result<Option<String>> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| crate::error::ScrapeError::HttpFailed(e.to_string()))?;

    if !response.status().is_success() {
        return Err(crate::error::ScrapeError::HttpFailed(format!(
            "image fetch returned {}",
            response.status()
        )));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let bytes = response.bytes().await.map_err(|e| crate::error::ScrapeError::HttpFailed(e.to_string()))?;

    let mime = infer_mime(content_type.as_deref(), &bytes);
    let text = translator.vision_text(prompts::OCR_INSTRUCTION, &bytes, mime).await?;
    Ok(accept_text(&text))
}

/// Content-Type header first, magic bytes as fallback, jpeg otherwise
pub fn infer_mime(content_type: Option<&str>, bytes: &[u8]) -> &'static str {
    if let Some(header) = content_type {
        let header = header.to_lowercase();
        if header.contains("png") {
            return "image/png";
        }
        if header.contains("webp") {
            return "image/webp";
        }
        if header.contains("gif") {
            return "image/gif";
        }
        if header.contains("jpeg") || header.contains("jpg") {
            return "image/jpeg";
        }
    }

    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        return "image/png";
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return "image/webp";
    }
    if bytes.starts_with(b"GIF8") {
        return "image/gif";
    }
    "image/jpeg"
}

/// Keep only genuine recovered text: the no-text sentinel and
/// too-short fragments are dropped.
pub fn accept_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed == prompts::NO_TEXT_SENTINEL {
        return None;
    }
    if trimmed.chars().count() < MIN_TEXT_CHARS {
        return None;
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_mime_from_header() {
        assert_eq!(infer_mime(Some("image/png"), &[]), "image/png");
        assert_eq!(infer_mime(Some("image/webp; charset=binary"), &[]), "image/webp");
        assert_eq!(infer_mime(Some("image/jpeg"), &[]), "image/jpeg");
    }

    #[test]
    fn test_infer_mime_from_magic_bytes() {
        assert_eq!(infer_mime(None, &[0x89, b'P', b'N', b'G', 0x0D, 0x0A]), "image/png");
        assert_eq!(infer_mime(None, b"GIF89a...."), "image/gif");
        assert_eq!(infer_mime(None, b"RIFF\x00\x00\x00\x00WEBPVP8 "), "image/webp");
        assert_eq!(infer_mime(Some("application/octet-stream"), b"\xFF\xD8\xFF\xE0"), "image/jpeg");
    }

    #[test]
    fn test_accept_text_drops_sentinel_and_noise() {
        assert_eq!(accept_text("NO_TEXT"), None);
        assert_eq!(accept_text("  NO_TEXT  "), None);
        assert_eq!(accept_text("짧음"), None);
        assert_eq!(
            accept_text("  수제 가죽 지갑 관리 방법 안내  "),
            Some("수제 가죽 지갑 관리 방법 안내".to_string())
        );
    }

    #[tokio::test]
    async fn test_read_images_passthrough_when_uninitialized() {
        let translator = Translator::disabled();
        let images = vec!["https://image.idus.com/image/files/abc123_720.jpg".to_string()];
        let texts = read_images(&translator, &images, TargetLocale::En).await;
        assert!(texts.is_empty());
    }
}
