//! Recipe link validation.
//!
//! AI-proposed recipe URLs are frequently invented or point at the wrong
//! dish. `LinkSanitizer` guarantees that every link it returns sits on an
//! allow-listed recipe domain and plausibly matches the meal title, falling
//! back to a live keyword search and finally to a deterministic search-page
//! URL. No failure path ever blocks menu generation.

mod cache;
mod fetch;
mod keywords;
mod policy;
mod search;

pub use cache::LinkCache;
pub use fetch::{HttpFetcher, NullFetcher, PageFetcher};
pub use policy::LinkPolicy;

use keywords::{
    extract_recipe_keywords, has_essential_keyword_coverage, has_sufficient_keyword_overlap,
};
use search::find_recipe_from_keywords;
use std::sync::Arc;
use url::Url;

pub struct LinkSanitizer {
    policy: LinkPolicy,
    cache: LinkCache,
    fetcher: Arc<dyn PageFetcher>,
}

impl LinkSanitizer {
    pub fn new(policy: LinkPolicy, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            policy,
            cache: LinkCache::default(),
            fetcher,
        }
    }

    /// Returns a validated URL for `raw_url`, or None when the input is not
    /// even a usable http(s) URL. All other outcomes resolve to something:
    /// the original link, a recovered search hit, a link embedded in the
    /// title, or the synthesized fallback.
    pub async fn sanitize(&self, raw_url: Option<&str>, title: &str) -> Option<String> {
        let trimmed = raw_url?.trim().to_string();
        if trimmed.is_empty() {
            return None;
        }
        let initial = Url::parse(&trimmed).ok()?;
        match initial.scheme() {
            "http" | "https" => {}
            _ => return None,
        }

        if let Some(cached) = self.cache.get(&trimmed, title) {
            return Some(cached);
        }

        let resolved = self.resolve(&trimmed, &initial, title).await;
        self.cache.put(&trimmed, title, resolved.clone());
        Some(resolved)
    }

    async fn resolve(&self, trimmed: &str, initial: &Url, title: &str) -> String {
        let title_keywords = extract_recipe_keywords(&self.policy, title);

        // A search URL sometimes wraps the real target in its query.
        if initial.path().contains("/recherche") {
            if let Some(target) = self.unwrap_search_query(initial) {
                return target;
            }
        }

        let host = initial.host_str().unwrap_or_default().to_lowercase();
        if !self.policy.is_allowed_host(&host) {
            return self.recover(&title_keywords, title).await;
        }

        if !self.path_matches(initial, &title_keywords) {
            return self.recover(&title_keywords, title).await;
        }

        if let Some(redirected) = self
            .fetcher
            .head_location(trimmed, self.policy.redirect_timeout)
            .await
        {
            return match Url::parse(&redirected) {
                Ok(url) => {
                    let redirected_host = url.host_str().unwrap_or_default().to_lowercase();
                    if self.policy.is_allowed_host(&redirected_host)
                        && self.path_matches(&url, &title_keywords)
                    {
                        url.to_string()
                    } else {
                        self.recover(&title_keywords, title).await
                    }
                }
                Err(_) => self.recover(&title_keywords, title).await,
            };
        }

        if initial.path() == "/" || initial.path().len() < 2 {
            return self.recover(&title_keywords, title).await;
        }

        trimmed.to_string()
    }

    fn path_matches(&self, url: &Url, expected: &[String]) -> bool {
        let path = urlencoding::decode(url.path())
            .map(|p| p.into_owned())
            .unwrap_or_else(|_| url.path().to_string());
        let path_keywords = extract_recipe_keywords(&self.policy, &path);
        has_sufficient_keyword_overlap(expected, &path_keywords)
            && has_essential_keyword_coverage(&self.policy, expected, &path_keywords)
    }

    /// Live search first, then a recipe URL embedded in the title text, then
    /// the synthesized search-page fallback. Always yields a URL.
    async fn recover(&self, keywords: &[String], title: &str) -> String {
        if let Some(found) = find_recipe_from_keywords(&self.policy, &*self.fetcher, keywords).await
        {
            return found;
        }
        if let Some(embedded) = self.parse_allowed_recipe_url(title) {
            return embedded;
        }
        self.policy.fallback_url(title)
    }

    /// Accepts a value only when it parses to an allow-listed URL with a
    /// non-root path.
    fn parse_allowed_recipe_url(&self, value: &str) -> Option<String> {
        let url = Url::parse(value.trim()).ok()?;
        let host = url.host_str()?.to_lowercase();
        if !self.policy.is_allowed_host(&host) {
            return None;
        }
        if url.path() == "/" || url.path().is_empty() {
            return None;
        }
        Some(url.to_string())
    }

    fn unwrap_search_query(&self, url: &Url) -> Option<String> {
        let target = url
            .query_pairs()
            .find(|(key, _)| key == "aqt" || key == "q")
            .map(|(_, value)| value.into_owned())?;
        self.parse_allowed_recipe_url(&target)
    }
}
