//! Process-level service facade.
//!
//! Owns the two long-lived handles (the browser session and the
//! translation orchestrator) with an explicit start/shutdown
//! lifecycle. Everything else is per-request state.

use crate::browser::{BrowserSession, LaunchOptions};
use crate::error::{Result, ScrapeError};
use crate::extract;
use crate::product::{ProductRecord, TargetLocale, TranslatedProduct};
use crate::translate::Translator;

/// Service construction parameters
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub launch: LaunchOptions,

    /// Gemini API key; when absent, translation degrades to passthrough
    pub gemini_api_key: Option<String>,
}

/// Scraper plus translator behind one lifecycle.
pub struct ProductService {
    session: BrowserSession,
    translator: Translator,
}

impl ProductService {
    /// Launch the browser and probe the translation backend.
    ///
    /// A browser that cannot launch is fatal; an unusable translation
    /// backend is not: the service starts with passthrough translation.
    pub async fn start(config: ServiceConfig) -> Result<Self> {
        let session = BrowserSession::launch(config.launch)?;
        let translator = Translator::connect(config.gemini_api_key).await;
        Ok(Self { session, translator })
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    /// Scrape one product page into a canonical record
    pub fn scrape(&self, url: &str) -> Result<ProductRecord> {
        validate_url(url)?;

        let page = self.session.open_page()?;
        let result = extract::extract_product(&page, url);
        page.close();
        result
    }

    /// Scrape and translate in one pass
    pub async fn scrape_and_translate(&self, url: &str, locale: TargetLocale) -> Result<TranslatedProduct> {
        let record = self.scrape(url)?;
        Ok(self.translator.translate_product(&record, locale).await)
    }

    /// Release the browser. Safe to call on a partially failed start.
    pub fn shutdown(&self) {
        self.session.close();
    }
}

/// Inbound URLs must point at the target site
pub fn validate_url(url: &str) -> Result<()> {
    if url.starts_with("http") && url.contains("idus.com") {
        Ok(())
    } else {
        Err(ScrapeError::InvalidUrl(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url_accepts_product_pages() {
        assert!(validate_url("https://www.idus.com/v2/product/87beb859").is_ok());
        assert!(validate_url("http://idus.com/v2/product/x").is_ok());
    }

    #[test]
    fn test_validate_url_rejects_foreign_domains() {
        assert!(validate_url("https://example.com/product/1").is_err());
        assert!(validate_url("idus.com/product/1").is_err());
        assert!(validate_url("").is_err());
    }
}
