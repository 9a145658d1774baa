//! # idus-translator
//!
//! Extracts structured product data from idus.com product pages with a
//! headless browser, then produces a localized copy via the Gemini API,
//! including text recovered from the detail images.
//!
//! The target pages are script-rendered and expose no stable API, so
//! extraction fuses several imperfect sources into one canonical record:
//!
//! - **Embedded payload**: the page's `window.__NUXT__` state, walked as
//!   a generic tagged tree, the highest-confidence source when present
//! - **DOM heuristics**: ordered per-field strategy lists over the
//!   rendered document
//! - **Interactive reveal**: option values only materialize after the
//!   option UI is opened (and, for multi-group products, advanced)
//! - **Image capture**: DOM attributes, raw markup and network traffic,
//!   deduplicated across CDN resolution variants
//!
//! Translation is rate-limited, retried on throttling, and degrades to
//! passthrough whenever the backend is unavailable, so a request always
//! yields a complete record.
//!
//! ## Scraping a product
//!
//! ```rust,no_run
//! use idus_translator::{BrowserSession, LaunchOptions};
//! use idus_translator::extract;
//!
//! # fn main() -> idus_translator::Result<()> {
//! let session = BrowserSession::launch(LaunchOptions::default())?;
//! let page = session.open_page()?;
//!
//! let record = extract::extract_product(&page, "https://www.idus.com/v2/product/1234")?;
//! println!("{} by {} ({} images)", record.title, record.artist_name, record.images.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Scraping and translating behind the service facade
//!
//! ```rust,no_run
//! use idus_translator::{ProductService, ServiceConfig, TargetLocale};
//!
//! # #[tokio::main]
//! # async fn main() -> idus_translator::Result<()> {
//! let config = ServiceConfig {
//!     gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
//!     ..Default::default()
//! };
//! let service = ProductService::start(config).await?;
//!
//! let translated = service
//!     .scrape_and_translate("https://www.idus.com/v2/product/1234", TargetLocale::En)
//!     .await?;
//! println!("{}", translated.translated_title);
//!
//! service.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`browser`]: browser session management and per-request pages
//! - [`extract`]: the extraction pipeline and merge arbitration
//! - [`translate`]: translation orchestration, model client, OCR
//! - [`product`]: the shared data model
//! - [`service`]: process-level facade with start/shutdown lifecycle
//! - [`error`]: error types and result alias

pub mod browser;
pub mod error;
pub mod extract;
pub mod product;
pub mod service;
pub mod translate;

pub use browser::{BrowserSession, LaunchOptions, Page};
pub use error::{Result, ScrapeError};
pub use product::{
    ImageText, OptionGroup, PartialRecord, ProductRecord, TargetLocale, TranslatedProduct,
};
pub use service::{ProductService, ServiceConfig};
pub use translate::{ModelState, Translator, TranslatorConfig};
