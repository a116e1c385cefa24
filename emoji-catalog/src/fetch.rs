//! Remote bundle and locale fetching

use thiserror::Error;
use url::Url;

use crate::i18n::{needs_fetch, Translations};
use crate::interface::{EmojiVersion, Locale, VendorSet};
use crate::models::Bundle;

/// Where published bundles and locale files live by default
pub const DEFAULT_CDN: &str = "https://cdn.jsdelivr.net/npm/@emoji-mart/data@latest";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Source of bundles and locale strings that are not supplied inline.
#[async_trait::async_trait]
pub trait BundleFetcher: Send + Sync {
    async fn fetch_bundle(&self, version: EmojiVersion, set: VendorSet) -> FetchResult<Bundle>;

    async fn fetch_translations(&self, locale: Locale) -> FetchResult<Translations>;
}

fn base_url(cdn: &str) -> FetchResult<Url> {
    Ok(Url::parse(&format!("{}/", cdn.trim_end_matches('/')))?)
}

/// `<cdn>/sets/<version>/<set>.json`
pub fn bundle_url(cdn: &str, version: EmojiVersion, set: VendorSet) -> FetchResult<Url> {
    Ok(base_url(cdn)?.join(&format!("sets/{}/{}.json", version, set))?)
}

/// `<cdn>/i18n/<locale>.json`
pub fn translations_url(cdn: &str, locale: Locale) -> FetchResult<Url> {
    Ok(base_url(cdn)?.join(&format!("i18n/{}.json", locale.as_str()))?)
}

/// Fetches from a CDN over HTTPS.
pub struct HttpFetcher {
    client: reqwest::Client,
    cdn: String,
}

impl HttpFetcher {
    pub fn new(cdn: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            cdn: cdn.into(),
        }
    }

    async fn get_text(&self, url: Url) -> FetchResult<String> {
        log::debug!("fetching {}", url);
        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_CDN)
    }
}

#[async_trait::async_trait]
impl BundleFetcher for HttpFetcher {
    async fn fetch_bundle(&self, version: EmojiVersion, set: VendorSet) -> FetchResult<Bundle> {
        let body = self.get_text(bundle_url(&self.cdn, version, set)?).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn fetch_translations(&self, locale: Locale) -> FetchResult<Translations> {
        if !needs_fetch(locale) {
            return Ok(Translations::english());
        }
        let body = self.get_text(translations_url(&self.cdn, locale)?).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_url() {
        let url = bundle_url(DEFAULT_CDN, EmojiVersion::V12_1, VendorSet::Twitter).unwrap();
        assert_eq!(
            url.as_str(),
            "https://cdn.jsdelivr.net/npm/@emoji-mart/data@latest/sets/12.1/twitter.json"
        );
    }

    #[test]
    fn test_trailing_slash_is_tolerated() {
        let url = translations_url("https://example.com/data/", Locale::De).unwrap();
        assert_eq!(url.as_str(), "https://example.com/data/i18n/de.json");
    }

    #[test]
    fn test_invalid_cdn() {
        assert!(matches!(
            bundle_url("not a url", EmojiVersion::V14, VendorSet::Native),
            Err(FetchError::Url(_))
        ));
    }

    #[tokio::test]
    async fn test_english_never_fetched() {
        // Unroutable CDN: a network attempt would fail
        let fetcher = HttpFetcher::new("http://127.0.0.1:9");
        let strings = fetcher.fetch_translations(Locale::En).await.unwrap();
        assert_eq!(strings, Translations::english());
    }
}
