//! Best-effort recovery search: when a proposed link fails validation, query
//! the recipe sites for the title keywords and keep the first result that
//! passes the same checks.

use super::fetch::PageFetcher;
use super::keywords::{
    extract_recipe_keywords, has_essential_keyword_coverage, has_sufficient_keyword_overlap,
};
use super::policy::LinkPolicy;
use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

struct SearchStrategy {
    base_url: &'static str,
    build_search_url: fn(&[String]) -> String,
    link_pattern: &'static Regex,
}

lazy_static! {
    static ref CUISINEAZ_LINK: Regex =
        Regex::new(r##"(?i)href="(/recettes/[^"#?]+\.aspx)""##).expect("cuisineaz link pattern");
    static ref MARMITON_LINK: Regex =
        Regex::new(r##"(?i)href="(/recettes/[^"#?]+)""##).expect("marmiton link pattern");
}

fn strategies() -> [SearchStrategy; 2] {
    [
        SearchStrategy {
            base_url: "https://www.cuisineaz.com",
            build_search_url: |keywords| {
                format!(
                    "https://www.cuisineaz.com/recherche?q={}",
                    urlencoding::encode(&keywords.join(" "))
                )
            },
            link_pattern: &CUISINEAZ_LINK,
        },
        SearchStrategy {
            base_url: "https://www.marmiton.org",
            build_search_url: |keywords| {
                format!(
                    "https://www.marmiton.org/recettes/recherche.aspx?aqt={}",
                    urlencoding::encode(&keywords.join(" "))
                )
            },
            link_pattern: &MARMITON_LINK,
        },
    ]
}

/// Pulls candidate recipe links out of a search results page, resolved
/// against the strategy's base URL, in first-seen order without duplicates.
fn extract_recipe_links(html: &str, base_url: &str, pattern: &Regex) -> Vec<String> {
    let base = match Url::parse(base_url) {
        Ok(u) => u,
        Err(_) => return Vec::new(),
    };
    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();
    for capture in pattern.captures_iter(html) {
        let Some(href) = capture.get(1) else { continue };
        let Ok(absolute) = base.join(href.as_str()) else { continue };
        let absolute = absolute.to_string();
        if seen.insert(absolute.clone()) {
            links.push(absolute);
        }
    }
    links
}

fn candidate_passes(policy: &LinkPolicy, expected: &[String], url: &Url) -> bool {
    let path = urlencoding::decode(url.path())
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| url.path().to_string());
    let candidate = extract_recipe_keywords(policy, &path);
    has_sufficient_keyword_overlap(expected, &candidate)
        && has_essential_keyword_coverage(policy, expected, &candidate)
}

/// Searches the configured recipe sites for `keywords` and returns the first
/// allow-listed candidate whose path passes overlap and essential coverage,
/// following at most one redirect per candidate. Network errors end the
/// strategy silently.
pub async fn find_recipe_from_keywords(
    policy: &LinkPolicy,
    fetcher: &dyn PageFetcher,
    keywords: &[String],
) -> Option<String> {
    if keywords.is_empty() {
        return None;
    }

    for strategy in strategies() {
        let search_url = (strategy.build_search_url)(keywords);
        let Some(html) = fetcher.get_text(&search_url, policy.search_timeout).await else {
            continue;
        };
        for candidate in extract_recipe_links(&html, strategy.base_url, strategy.link_pattern) {
            let Ok(url) = Url::parse(&candidate) else { continue };
            if !candidate_passes(policy, keywords, &url) {
                continue;
            }
            if let Some(redirected) = fetcher
                .head_location(&candidate, policy.redirect_timeout)
                .await
            {
                let Ok(redirected_url) = Url::parse(&redirected) else { continue };
                if !candidate_passes(policy, keywords, &redirected_url) {
                    continue;
                }
                let host = redirected_url.host_str().unwrap_or_default();
                if policy.is_allowed_host(host) {
                    return Some(redirected_url.to_string());
                }
                continue;
            }
            let host = url.host_str().unwrap_or_default();
            if policy.is_allowed_host(host) {
                return Some(url.to_string());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_absolute_deduplicated_links() {
        let html = r#"
            <a href="/recettes/recette_tarte-aux-pommes_1.aspx">one</a>
            <a href="/recettes/recette_tarte-aux-pommes_1.aspx">dup</a>
            <a href="/recettes/recette_gratin-dauphinois_2.aspx">two</a>
            <a href="/autre/page.aspx">ignored</a>
        "#;
        let links = extract_recipe_links(html, "https://www.cuisineaz.com", &CUISINEAZ_LINK);
        assert_eq!(
            links,
            vec![
                "https://www.cuisineaz.com/recettes/recette_tarte-aux-pommes_1.aspx",
                "https://www.cuisineaz.com/recettes/recette_gratin-dauphinois_2.aspx",
            ]
        );
    }

    #[test]
    fn marmiton_pattern_stops_at_query_and_fragment() {
        let html = r#"<a href="/recettes/recette_poulet-roti_3?utm=x">x</a>
                      <a href="/recettes/recette_poulet-roti_3">y</a>"#;
        let links = extract_recipe_links(html, "https://www.marmiton.org", &MARMITON_LINK);
        assert_eq!(
            links,
            vec![
                "https://www.marmiton.org/recettes/recette_poulet-roti_3",
            ]
        );
    }
}
