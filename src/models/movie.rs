use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Catalog identifier of a movie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(pub u64);

impl From<u64> for MovieId {
    fn from(id: u64) -> Self {
        MovieId(id)
    }
}

impl Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A movie as returned by the catalog.
///
/// The same shape is stored verbatim in a user's saved list, so the field
/// names follow the catalog's JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub vote_average: f64,
}

impl Movie {
    /// Full poster URL for the given image size (e.g. "w500")
    pub fn poster_url(&self, image_base: &str, size: &str) -> Option<String> {
        self.poster_path
            .as_ref()
            .map(|path| format!("{}/{}{}", image_base.trim_end_matches('/'), size, path))
    }

    /// Release year, when the catalog supplied a parseable date
    pub fn release_year(&self) -> Option<i32> {
        NaiveDate::parse_from_str(&self.release_date, "%Y-%m-%d")
            .ok()
            .map(|date| date.year())
    }
}

/// One page of catalog results
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CatalogPage {
    #[serde(default)]
    pub results: Vec<Movie>,
    pub page: u32,
    pub total_pages: u32,
}

impl CatalogPage {
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Movie genre as listed by the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

/// Provider names offering a movie in one region, grouped by kind
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchProviders {
    pub flatrate: Vec<String>,
    pub rent: Vec<String>,
    pub buy: Vec<String>,
}

impl WatchProviders {
    pub fn is_empty(&self) -> bool {
        self.flatrate.is_empty() && self.rent.is_empty() && self.buy.is_empty()
    }

    /// Every provider once, in flatrate → rent → buy order
    pub fn distinct(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for name in self.flatrate.iter().chain(&self.rent).chain(&self.buy) {
            if !seen.contains(&name.as_str()) {
                seen.push(name.as_str());
            }
        }
        seen
    }
}
