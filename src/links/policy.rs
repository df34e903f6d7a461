//! Data-driven validation policy: allow-listed domains, keyword stop words,
//! optional (descriptive) keywords and the synonym table.
//!
//! Everything heuristic lives here as plain data so tests and future tuning
//! can swap tables without touching the pipeline.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

pub const PRIMARY_RECIPE_DOMAIN: &str = "www.marmiton.org";

const ALLOWED_RECIPE_DOMAINS: &[&str] = &[
    "www.marmiton.org",
    "marmiton.org",
    "cuisine.journaldesfemmes.fr",
    "www.cuisineaz.com",
    "cuisineaz.com",
    "www.bbcgoodfood.com",
    "www.allrecipes.com",
    "www.jamieoliver.com",
    "www.delish.com",
];

const KEYWORD_STOP_WORDS: &[&str] = &[
    "avec", "aux", "des", "les", "dans", "pour", "sur", "sans", "entre",
    "quelque", "quelques", "recette", "plat", "plats", "facile", "faciles",
    "rapide", "rapides",
];

// Cooking-method and connective words: their absence from a candidate URL
// path does not disqualify it.
const OPTIONAL_KEYWORDS: &[&str] = &[
    "saute", "rotis", "rotie", "roties", "gratin", "grillade", "grille",
    "grillee", "grillees", "poelee", "poelees", "poele", "poeles", "curry",
    "sauce", "au", "aux", "du", "de", "des",
];

const KEYWORD_SYNONYMS: &[(&str, &[&str])] = &[
    ("cochon", &["cochon", "porc", "porcine", "porcelet"]),
    ("porc", &["porc", "cochon"]),
    ("porcines", &["porc", "porcine", "cochon"]),
    ("porcinet", &["porcelet", "porc", "cochon"]),
    ("porcelet", &["porcelet", "porc", "cochon"]),
    ("boeuf", &["boeuf", "beouf"]),
    ("boeufs", &["boeuf"]),
    ("pommes", &["pomme", "pommes"]),
    ("pomme", &["pomme", "pommes"]),
    ("terre", &["terre"]),
    ("patate", &["patate", "patates", "pommes"]),
    ("patates", &["patate", "patates", "pommes"]),
];

/// Validation tables plus the network budgets of the pipeline.
#[derive(Debug, Clone)]
pub struct LinkPolicy {
    pub allowed_domains: HashSet<String>,
    pub stop_words: HashSet<String>,
    pub optional_keywords: HashSet<String>,
    pub synonyms: HashMap<String, Vec<String>>,
    pub redirect_timeout: Duration,
    pub search_timeout: Duration,
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self {
            allowed_domains: ALLOWED_RECIPE_DOMAINS.iter().map(|s| (*s).to_string()).collect(),
            stop_words: KEYWORD_STOP_WORDS.iter().map(|s| (*s).to_string()).collect(),
            optional_keywords: OPTIONAL_KEYWORDS.iter().map(|s| (*s).to_string()).collect(),
            synonyms: KEYWORD_SYNONYMS
                .iter()
                .map(|(word, syns)| {
                    ((*word).to_string(), syns.iter().map(|s| (*s).to_string()).collect())
                })
                .collect(),
            redirect_timeout: Duration::from_secs(2),
            search_timeout: Duration::from_secs(3),
        }
    }
}

impl LinkPolicy {
    pub fn is_allowed_host(&self, host: &str) -> bool {
        self.allowed_domains.contains(&host.to_lowercase())
    }

    /// Deterministic last-resort link: a search page on the primary recipe
    /// site querying the meal title.
    pub fn fallback_url(&self, title: &str) -> String {
        let query = if title.trim().is_empty() {
            "recette facile famille"
        } else {
            title
        };
        format!(
            "https://{}/recettes/recherche.aspx?aqt={}",
            PRIMARY_RECIPE_DOMAIN,
            urlencoding::encode(query)
        )
    }
}
