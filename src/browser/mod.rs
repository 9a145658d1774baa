//! Browser session management.
//!
//! Wraps a Chrome/Chromium instance driven over the DevTools protocol.
//! The session lives for the whole process; every scrape request gets
//! its own [`Page`] with network-level image capture attached.

pub mod config;
pub mod session;

pub use config::LaunchOptions;
pub use session::{BrowserSession, Page};
