//! ftk-enrich
//!
//! Enrichment provider boundary: descriptive-page probing and image
//! resolution. Every outcome here is soft for the caller — a vessel is never
//! dropped because enrichment failed; the engine records an absent page or
//! falls through the image chain to the default placeholder.

pub mod scrape;

pub use scrape::first_figure_image_src;

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Error type and probe outcome
// ---------------------------------------------------------------------------

/// Errors an [`EnrichmentProvider`] implementation may return.
///
/// These are *hard* failures (service unreachable, malformed content). The
/// soft outcome "no page for this vessel" is not an error: it is
/// [`PageProbe::Absent`].
#[derive(Debug)]
pub enum EnrichError {
    /// Network or transport failure.
    Transport(String),
    /// The service answered with a non-success status.
    Http { status: u16 },
    /// The page was fetched but no image reference could be extracted.
    NoImage { page_url: String },
}

impl fmt::Display for EnrichError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrichError::Transport(msg) => write!(f, "enrichment transport error: {msg}"),
            EnrichError::Http { status } => write!(f, "enrichment http error status={status}"),
            EnrichError::NoImage { page_url } => {
                write!(f, "no image reference found on page: {page_url}")
            }
        }
    }
}

impl std::error::Error for EnrichError {}

/// Outcome of a descriptive-page probe.
///
/// `Absent` is a valid terminal state: once a probe answers "no page", the
/// source is assumed immutable and incremental runs reuse the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageProbe {
    Found(String),
    Absent,
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Descriptive-page and image resolution for one vessel.
#[async_trait::async_trait]
pub trait EnrichmentProvider: Send + Sync {
    /// Human-readable name identifying this source (e.g. `"museum"`).
    fn source_name(&self) -> &'static str;

    /// Probe for a descriptive page by vessel name.
    async fn probe_page(&self, name: &str) -> Result<PageProbe, EnrichError>;

    /// Extract an image URL from a known descriptive page.
    async fn extract_image(&self, page_url: &str) -> Result<String, EnrichError>;

    /// Resolve an image through the fallback photo service, by ship id.
    async fn fallback_image(&self, ship_id: i64) -> Result<String, EnrichError>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// Configuration of the HTTP enrichment provider.
///
/// Templates carry a single placeholder: `{slug}` for the page URL,
/// `{ship_id}` for the fallback image URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    pub page_url_template: String,
    pub image_url_template: String,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            page_url_template:
                "https://museemaritime.larochelle.fr/au-dela-de-la-visite/a-decouvrir-a-proximite/yatchs-classiques/{slug}"
                    .to_string(),
            image_url_template:
                "https://photos.marinetraffic.com/ais/showphoto.aspx?shipid={ship_id}&size=thumb600"
                    .to_string(),
        }
    }
}

/// Slug used in page URLs: lowercased, whitespace runs become hyphens.
pub fn page_slug(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Enrichment provider scraping a museum-style site plus a photo service.
#[derive(Debug, Clone)]
pub struct HttpEnrichmentProvider {
    http: reqwest::Client,
    cfg: EnrichConfig,
}

impl HttpEnrichmentProvider {
    pub fn new(cfg: EnrichConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            cfg,
        }
    }
}

#[async_trait::async_trait]
impl EnrichmentProvider for HttpEnrichmentProvider {
    fn source_name(&self) -> &'static str {
        "museum"
    }

    async fn probe_page(&self, name: &str) -> Result<PageProbe, EnrichError> {
        let url = self
            .cfg
            .page_url_template
            .replace("{slug}", &page_slug(name));

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| EnrichError::Transport(e.to_string()))?;

        if resp.status().is_success() {
            // keep the final URL so redirects land on the canonical page
            Ok(PageProbe::Found(resp.url().to_string()))
        } else {
            Ok(PageProbe::Absent)
        }
    }

    async fn extract_image(&self, page_url: &str) -> Result<String, EnrichError> {
        let resp = self
            .http
            .get(page_url)
            .send()
            .await
            .map_err(|e| EnrichError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(EnrichError::Http {
                status: status.as_u16(),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| EnrichError::Transport(e.to_string()))?;

        first_figure_image_src(&body)
            .map(str::to_string)
            .ok_or_else(|| EnrichError::NoImage {
                page_url: page_url.to_string(),
            })
    }

    async fn fallback_image(&self, ship_id: i64) -> Result<String, EnrichError> {
        let url = self
            .cfg
            .image_url_template
            .replace("{ship_id}", &ship_id.to_string());

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| EnrichError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(EnrichError::Http {
                status: status.as_u16(),
            });
        }
        Ok(resp.url().to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
