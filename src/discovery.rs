//! Latest-version discovery against add-on landing pages.
//!
//! Each add-on source publishes its current download on an HTML landing
//! page. A [`DiscoveryStrategy`] knows where that page keeps the download
//! link and the version token; the two concrete strategies here cover the
//! two layouts in use (version embedded in the download filename, and a
//! separate page element carrying the version text). Adding a source means
//! adding a strategy, not touching the orchestrator.

use regex::Regex;
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use semver::Version;
use url::Url;

use crate::addon::{AddOn, AddonError};
use crate::version;

/// Outcome of a successful discovery: where the archive lives and which
/// version it carries.
#[derive(Debug, Clone)]
pub struct LatestRelease {
    /// Absolute archive URL, resolved against the landing page.
    pub archive_url: Url,
    /// Normalized latest version.
    pub version: Version,
}

/// Per-source capability that resolves the latest downloadable release
/// advertised on an add-on's landing page.
pub trait DiscoveryStrategy: Send + Sync {
    /// Fetches the landing page and extracts the current release.
    fn discover(&self, client: &Client, page_url: &str) -> Result<LatestRelease, AddonError>;
}

impl AddOn {
    /// Runs the bound discovery strategy and records the result on the
    /// add-on (`archive_url` and `version.latest`).
    pub fn discover_latest(&mut self, client: &Client) -> Result<LatestRelease, AddonError> {
        let release = self.strategy.discover(client, &self.page_url)?;
        self.archive_url = Some(release.archive_url.clone());
        self.version.latest = Some(release.version.clone());
        Ok(release)
    }
}

/// Builds the shared HTTP client used for page fetches and downloads.
///
/// No request timeout is set: a stalled transfer stalls only the one
/// pipeline that issued it.
pub fn http_client() -> Result<Client, AddonError> {
    Client::builder()
        .user_agent(format!("addonup/{}", env!("CARGO_PKG_VERSION")))
        .timeout(None)
        .build()
        .map_err(|e| AddonError::Network(e.to_string()))
}

/// Fetches a landing page and parses it into a queryable document.
///
/// Transport failures and non-success statuses both map to
/// [`AddonError::Network`]; strategies can assume a parsed document.
pub fn fetch_document(client: &Client, url: &str) -> Result<Html, AddonError> {
    let response = client
        .get(url)
        .send()
        .map_err(|e| AddonError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AddonError::Network(format!(
            "{} returned status {}",
            url, status
        )));
    }

    let body = response
        .text()
        .map_err(|e| AddonError::Network(e.to_string()))?;

    Ok(Html::parse_document(&body))
}

fn parse_selector(selector: &str) -> Result<Selector, AddonError> {
    Selector::parse(selector)
        .map_err(|e| AddonError::Config(format!("invalid selector {:?}: {}", selector, e)))
}

fn parse_page_url(page_url: &str) -> Result<Url, AddonError> {
    Url::parse(page_url)
        .map_err(|e| AddonError::Config(format!("invalid page URL {:?}: {}", page_url, e)))
}

/// Locates the first element matched by `selector` and returns its href,
/// resolved to an absolute URL against the landing page.
fn resolve_download_link(
    base: &Url,
    document: &Html,
    selector: &Selector,
) -> Result<(String, Url), AddonError> {
    let href = document
        .select(selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .ok_or_else(|| AddonError::ElementNotFound("download link".to_string()))?;

    let resolved = base
        .join(href)
        .map_err(|e| AddonError::Config(format!("cannot resolve link {:?}: {}", href, e)))?;

    Ok((href.to_string(), resolved))
}

/// Strategy for pages that embed the version in the download filename.
///
/// One selector locates the download anchor; a regex with one capture
/// group pulls the version token out of the link target.
pub struct FilenameVersionStrategy {
    link: Selector,
    version: Regex,
}

impl FilenameVersionStrategy {
    /// Creates the strategy from its fixed selector and version pattern.
    pub fn new(link_selector: &str, version_pattern: &str) -> Result<Self, AddonError> {
        let link = parse_selector(link_selector)?;
        let version = Regex::new(version_pattern).map_err(|e| {
            AddonError::Config(format!("invalid version pattern {:?}: {}", version_pattern, e))
        })?;
        Ok(Self { link, version })
    }

    fn extract(&self, base: &Url, document: &Html) -> Result<LatestRelease, AddonError> {
        let (href, archive_url) = resolve_download_link(base, document, &self.link)?;

        let token = self
            .version
            .captures(&href)
            .and_then(|captures| captures.get(1))
            .ok_or_else(|| AddonError::MalformedVersion(href.clone()))?;

        Ok(LatestRelease {
            archive_url,
            version: version::normalize(token.as_str())?,
        })
    }
}

impl DiscoveryStrategy for FilenameVersionStrategy {
    fn discover(&self, client: &Client, page_url: &str) -> Result<LatestRelease, AddonError> {
        let base = parse_page_url(page_url)?;
        let document = fetch_document(client, page_url)?;
        self.extract(&base, &document)
    }
}

/// Strategy for pages that print the version next to the download link.
///
/// One selector locates the download anchor, a second selector the
/// element whose text is the version token.
pub struct PageTextVersionStrategy {
    link: Selector,
    version: Selector,
}

impl PageTextVersionStrategy {
    /// Creates the strategy from its fixed link and version selectors.
    pub fn new(link_selector: &str, version_selector: &str) -> Result<Self, AddonError> {
        Ok(Self {
            link: parse_selector(link_selector)?,
            version: parse_selector(version_selector)?,
        })
    }

    fn extract(&self, base: &Url, document: &Html) -> Result<LatestRelease, AddonError> {
        let (_, archive_url) = resolve_download_link(base, document, &self.link)?;

        let token = document
            .select(&self.version)
            .next()
            .ok_or_else(|| AddonError::ElementNotFound("version text".to_string()))?
            .text()
            .collect::<String>();

        Ok(LatestRelease {
            archive_url,
            version: version::normalize(token.trim())?,
        })
    }
}

impl DiscoveryStrategy for PageTextVersionStrategy {
    fn discover(&self, client: &Client, page_url: &str) -> Result<LatestRelease, AddonError> {
        let base = parse_page_url(page_url)?;
        let document = fetch_document(client, page_url)?;
        self.extract(&base, &document)
    }
}

/// Ready-made descriptor for ElvUI, whose download filename carries the
/// version.
pub fn elvui() -> Result<AddOn, AddonError> {
    let strategy = FilenameVersionStrategy::new("a[href^='/downloads/elvui-']", r"-(\d+\.\d+)\.zip")?;
    Ok(AddOn::new(
        "ElvUI",
        "https://www.tukui.org/welcome.php",
        Box::new(strategy),
    ))
}

/// Ready-made descriptor for AddOnSkins, whose page prints the version in
/// a separate element.
pub fn addon_skins() -> Result<AddOn, AddonError> {
    let strategy = PageTextVersionStrategy::new(
        "a[href^='addons.php?download=']",
        "p.extras:first-child > b:first-child",
    )?;
    Ok(AddOn::new(
        "AddOnSkins",
        "https://www.tukui.org/addons.php?id=3",
        Box::new(strategy),
    ))
}
