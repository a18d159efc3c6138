/// TMDB (The Movie Database) catalog client
///
/// Every request carries `api_key` and `language` first, followed by the
/// request-specific parameters. Failures of any kind (transport, non-2xx
/// status, undecodable body) surface as `AppError::Network`; callers keep
/// whatever they were showing and the user retries.
use std::collections::HashMap;

use reqwest::Client as HttpClient;
use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{CatalogPage, Genre, Movie, MovieId, WatchProviders},
    services::catalog::{Catalog, CatalogRequest},
};

#[derive(Clone)]
pub struct TmdbCatalog {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    language: String,
    watch_region: String,
}

#[derive(Debug, Deserialize)]
struct GenreListResponse {
    genres: Vec<Genre>,
}

#[derive(Debug, Deserialize)]
struct WatchProvidersResponse {
    #[serde(default)]
    results: HashMap<String, RegionProviders>,
}

#[derive(Debug, Default, Deserialize)]
struct RegionProviders {
    #[serde(default)]
    flatrate: Vec<ProviderEntry>,
    #[serde(default)]
    rent: Vec<ProviderEntry>,
    #[serde(default)]
    buy: Vec<ProviderEntry>,
}

#[derive(Debug, Deserialize)]
struct ProviderEntry {
    provider_name: String,
}

impl TmdbCatalog {
    pub fn new(
        http_client: HttpClient,
        api_key: String,
        api_url: String,
        language: String,
        watch_region: String,
    ) -> AppResult<Self> {
        if api_key.trim().is_empty() {
            return Err(AppError::Config("TMDB API key cannot be empty".to_string()));
        }

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            language,
            watch_region,
        })
    }

    pub fn from_config(config: &Config, http_client: HttpClient) -> AppResult<Self> {
        Self::new(
            http_client,
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
            config.tmdb_language.clone(),
            config.watch_region.clone(),
        )
    }

    /// GET `path` with the common parameters plus `params`, decoding JSON
    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let mut query: Vec<(&str, &str)> = vec![
            ("api_key", self.api_key.as_str()),
            ("language", self.language.as_str()),
        ];
        query.extend(params.iter().map(|(k, v)| (*k, v.as_str())));

        tracing::debug!(path = %path, params = ?params, "Catalog request");

        let response = self
            .http_client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| AppError::Network(format!("Catalog request to {} failed: {}", path, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                path = %path,
                status = %status,
                body = %body,
                "Catalog request failed"
            );
            return Err(AppError::Network(format!(
                "Catalog returned status {} for {}",
                status, path
            )));
        }

        response.json::<T>().await.map_err(|e| {
            AppError::Network(format!("Failed to parse catalog response from {}: {}", path, e))
        })
    }
}

#[async_trait::async_trait]
impl Catalog for TmdbCatalog {
    async fn fetch_page(&self, request: &CatalogRequest, page: u32) -> AppResult<CatalogPage> {
        let params = request.query_params(page);
        let result: CatalogPage = self.get(request.endpoint(), &params).await?;

        tracing::info!(
            endpoint = %request.endpoint(),
            page = result.page,
            total_pages = result.total_pages,
            results = result.results.len(),
            provider = "tmdb",
            "Catalog page fetched"
        );

        Ok(result)
    }

    async fn movie(&self, id: MovieId) -> AppResult<Movie> {
        self.get(&format!("/movie/{}", id), &[]).await
    }

    async fn genres(&self) -> AppResult<Vec<Genre>> {
        let response: GenreListResponse = self.get("/genre/movie/list", &[]).await?;
        Ok(response.genres)
    }

    async fn watch_providers(&self, id: MovieId) -> AppResult<WatchProviders> {
        let response: WatchProvidersResponse = self
            .get(&format!("/movie/{}/watch/providers", id), &[])
            .await?;

        let providers = response
            .results
            .get(&self.watch_region)
            .map(|region| WatchProviders {
                flatrate: names(&region.flatrate),
                rent: names(&region.rent),
                buy: names(&region.buy),
            })
            .unwrap_or_default();

        tracing::info!(
            movie_id = %id,
            region = %self.watch_region,
            providers = providers.distinct().len(),
            "Watch providers fetched"
        );

        Ok(providers)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

fn names(entries: &[ProviderEntry]) -> Vec<String> {
    entries.iter().map(|e| e.provider_name.clone()).collect()
}
