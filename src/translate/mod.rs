//! Translation orchestration.
//!
//! One orchestrator instance is shared by the whole process. It owns
//! the model client, the discovery state machine, and the rate gate
//! that serializes every external call (probe, translation and OCR
//! alike) against one shared API quota. Failure never propagates into
//! a record: a field that cannot be translated is returned unchanged.

pub mod gemini;
pub mod ocr;
pub mod prompts;

use crate::error::Result;
use crate::product::{is_sentinel, OptionGroup, ProductRecord, TargetLocale, TranslatedProduct};
use gemini::{GeminiClient, GenerationConfig};
use prompts::PromptKind;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Backend models probed in priority order at construction
pub const MODEL_CANDIDATES: &[&str] = &["gemini-1.5-flash", "gemini-1.5-pro", "gemini-pro"];

/// Model discovery state, driven by probe outcomes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelState {
    Unprobed,
    Probing(usize),
    Ready(String),
    Unavailable,
}

/// Tunables for pacing and retry
#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    /// Minimum spacing between any two external model calls
    pub min_call_interval: Duration,

    /// Attempts per call when the model throttles
    pub max_attempts: u32,

    /// Base wait on throttle; attempt N waits N times this
    pub retry_backoff: Duration,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            min_call_interval: Duration::from_secs(1),
            max_attempts: 3,
            retry_backoff: Duration::from_secs(2),
        }
    }
}

/// Process-wide spacing checkpoint. Callers line up on the mutex, and
/// each waits out the remainder of the interval before stamping the
/// checkpoint and proceeding.
struct RateGate {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateGate {
    fn new(min_interval: Duration) -> Self {
        Self { min_interval, last_call: Mutex::new(None) }
    }

    async fn wait(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Rate-limited, retried, model-fallback-aware translator.
pub struct Translator {
    client: Option<GeminiClient>,
    state: ModelState,
    gate: RateGate,
    config: TranslatorConfig,
}

impl Translator {
    /// Build an orchestrator with no backend; every call is a passthrough
    pub fn disabled() -> Self {
        Self::disabled_with(TranslatorConfig::default())
    }

    fn disabled_with(config: TranslatorConfig) -> Self {
        let gate = RateGate::new(config.min_call_interval);
        Self { client: None, state: ModelState::Unprobed, gate, config }
    }

    /// Connect to the production endpoint and probe for a working model.
    /// Construction never fails: an unusable backend just leaves the
    /// orchestrator uninitialized.
    pub async fn connect(api_key: Option<String>) -> Self {
        Self::connect_with(api_key, gemini::DEFAULT_BASE_URL, TranslatorConfig::default()).await
    }

    /// Connect against a custom endpoint with explicit tunables
    pub async fn connect_with(api_key: Option<String>, base_url: &str, config: TranslatorConfig) -> Self {
        let Some(api_key) = api_key.filter(|key| !key.is_empty()) else {
            log::warn!("no API key configured; translation runs as passthrough");
            return Self::disabled_with(config);
        };

        let client = match GeminiClient::with_base_url(api_key, base_url) {
            Ok(client) => client,
            Err(e) => {
                log::error!("could not build model client: {}", e);
                return Self::disabled_with(config);
            }
        };

        let gate = RateGate::new(config.min_call_interval);
        let state = Self::probe(&client, &gate).await;
        Self { client: Some(client), state, gate, config }
    }

    /// Probe candidate models until one answers a trivial completion.
    /// A hard credential failure halts probing immediately; quota or
    /// availability failures advance to the next candidate.
    async fn probe(client: &GeminiClient, gate: &RateGate) -> ModelState {
        for (index, model) in MODEL_CANDIDATES.iter().enumerate() {
            log::debug!("probing model {} ({:?})", model, ModelState::Probing(index));

            gate.wait().await;
            let config = GenerationConfig { temperature: None, max_output_tokens: Some(10) };
            match client.generate_text(model, "Say 'OK'", config).await {
                Ok(_) => {
                    log::info!("model selected: {}", model);
                    return ModelState::Ready(model.to_string());
                }
                Err(e) if e.is_auth() => {
                    log::error!("credential rejected, aborting model probe: {}", e);
                    return ModelState::Unavailable;
                }
                Err(e) => log::warn!("model {} not usable: {}", model, e),
            }
        }
        log::error!("no usable model found");
        ModelState::Unavailable
    }

    /// Whether a backend model was selected
    pub fn is_ready(&self) -> bool {
        matches!(self.state, ModelState::Ready(_))
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    /// Translate one piece of text; returns the input unchanged when
    /// the orchestrator is uninitialized, the text is blank or a
    /// sentinel, or the backend keeps failing.
    pub async fn translate_text(&self, text: &str, locale: TargetLocale, kind: PromptKind) -> String {
        if text.trim().is_empty() || is_sentinel(text) {
            return text.to_string();
        }
        let (ModelState::Ready(model), Some(client)) = (&self.state, &self.client) else {
            return text.to_string();
        };

        let prompt = prompts::render(kind, locale, text);
        let config = GenerationConfig { temperature: Some(0.2), max_output_tokens: Some(4000) };

        for attempt in 1..=self.config.max_attempts {
            self.gate.wait().await;
            match client.generate_text(model, &prompt, config.clone()).await {
                Ok(completion) => {
                    let stripped = prompts::strip_prefixes(&completion, locale);
                    if stripped.is_empty() {
                        return text.to_string();
                    }
                    return stripped;
                }
                Err(e) if e.is_throttle() && attempt < self.config.max_attempts => {
                    let wait = self.config.retry_backoff * attempt;
                    log::warn!("throttled (attempt {}), retrying in {:?}", attempt, wait);
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    log::warn!("translation failed, keeping original text: {}", e);
                    break;
                }
            }
        }
        text.to_string()
    }

    /// Run a vision completion through the shared gate and retry
    /// policy. Unlike text translation there is no original to fall
    /// back to, so exhaustion surfaces as an error for the caller to
    /// skip on.
    pub(crate) async fn vision_text(&self, instruction: &str, image_bytes: &[u8], mime_type: &str) -> Result<String> {
        let (ModelState::Ready(model), Some(client)) = (&self.state, &self.client) else {
            return Err(crate::error::ScrapeError::ModelUnavailable("orchestrator uninitialized".to_string()));
        };

        let mut attempt = 1;
        loop {
            self.gate.wait().await;
            match client.generate_vision(model, instruction, image_bytes, mime_type).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_throttle() && attempt < self.config.max_attempts => {
                    let wait = self.config.retry_backoff * attempt;
                    log::warn!("vision call throttled (attempt {}), retrying in {:?}", attempt, wait);
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn translate_options(&self, options: &[OptionGroup], locale: TargetLocale) -> Vec<OptionGroup> {
        let mut translated = Vec::with_capacity(options.len());
        for group in options {
            let name = self.translate_text(&group.name, locale, PromptKind::OptionLabel).await;
            let mut values = Vec::with_capacity(group.values.len());
            for value in &group.values {
                values.push(self.translate_text(value, locale, PromptKind::OptionLabel).await);
            }
            translated.push(OptionGroup { name, values });
        }
        translated
    }

    /// Translate a whole record into an immutable wrapper. An
    /// uninitialized orchestrator returns the record verbatim with no
    /// image texts.
    pub async fn translate_product(&self, record: &ProductRecord, locale: TargetLocale) -> TranslatedProduct {
        if !self.is_ready() {
            log::warn!("orchestrator uninitialized, returning record untranslated");
            return TranslatedProduct {
                original: record.clone(),
                translated_title: record.title.clone(),
                translated_description: record.description.clone(),
                translated_options: record.options.clone(),
                translated_image_texts: Vec::new(),
                target_locale: locale,
            };
        }

        log::info!("translating \"{}\" to {:?}", record.title, locale);

        let translated_title = self.translate_text(&record.title, locale, PromptKind::Title).await;
        let translated_description = self.translate_text(&record.description, locale, PromptKind::Description).await;
        let translated_options = self.translate_options(&record.options, locale).await;
        let translated_image_texts = ocr::read_images(self, &record.images, locale).await;

        TranslatedProduct {
            original: record.clone(),
            translated_title,
            translated_description,
            translated_options,
            translated_image_texts,
            target_locale: locale,
        }
    }
}
