/// Movie catalog abstraction
///
/// The catalog is a third-party metadata API. Screens never talk to it
/// directly: they describe what they want as a [`CatalogRequest`] and ask a
/// [`Catalog`] implementation for one page of it.
use crate::{
    error::AppResult,
    models::{CatalogPage, FilterSet, Genre, Movie, MovieId, WatchProviders},
};

pub mod tmdb;

pub use tmdb::TmdbCatalog;

/// What a listing shows, independent of the page being fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogRequest {
    /// Free-text search, refined by the filter set
    Search { query: String, filters: FilterSet },
    /// Discovery by genre, decade and sort order
    Discover { filters: FilterSet },
    Popular,
    Upcoming,
}

impl CatalogRequest {
    /// Search when a non-blank query is present, discovery otherwise
    pub fn from_input(query: Option<&str>, filters: FilterSet) -> Self {
        match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(query) => CatalogRequest::Search {
                query: query.to_string(),
                filters,
            },
            None => CatalogRequest::Discover { filters },
        }
    }

    /// Discovery restricted to a single genre
    pub fn genre(genre_id: u32) -> Self {
        CatalogRequest::Discover {
            filters: FilterSet::new().with_category(genre_id.to_string()),
        }
    }

    pub fn filters(&self) -> Option<&FilterSet> {
        match self {
            CatalogRequest::Search { filters, .. } | CatalogRequest::Discover { filters } => {
                Some(filters)
            }
            CatalogRequest::Popular | CatalogRequest::Upcoming => None,
        }
    }

    /// Same request with the filters replaced.
    ///
    /// Fixed listings have no facets, so filtering one turns it into discovery.
    pub fn with_filters(&self, filters: FilterSet) -> Self {
        match self {
            CatalogRequest::Search { query, .. } => CatalogRequest::Search {
                query: query.clone(),
                filters,
            },
            _ => CatalogRequest::Discover { filters },
        }
    }

    /// Catalog path relative to the API base
    pub fn endpoint(&self) -> &'static str {
        match self {
            CatalogRequest::Search { .. } => "/search/movie",
            CatalogRequest::Discover { .. } => "/discover/movie",
            CatalogRequest::Popular => "/movie/popular",
            CatalogRequest::Upcoming => "/movie/upcoming",
        }
    }

    /// Query parameters for one page, in the order the catalog receives them:
    /// query → page → genres → release-date range → sort.
    pub fn query_params(&self, page: u32) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();

        if let CatalogRequest::Search { query, .. } = self {
            params.push(("query", query.clone()));
        }
        params.push(("page", page.to_string()));

        if let Some(filters) = self.filters() {
            if !filters.categories().is_empty() {
                params.push(("with_genres", filters.categories().join(",")));
            }
            if let Some(period) = filters.active_time_period() {
                let (start, end) = period.date_range();
                params.push(("primary_release_date.gte", start.format("%Y-%m-%d").to_string()));
                params.push(("primary_release_date.lte", end.format("%Y-%m-%d").to_string()));
            }
            params.push(("sort_by", filters.sort().as_param().to_string()));
        }

        params
    }
}

/// Trait for movie catalog sources
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// Fetch one page of a listing
    async fn fetch_page(&self, request: &CatalogRequest, page: u32) -> AppResult<CatalogPage>;

    /// Fetch a single movie by id
    async fn movie(&self, id: MovieId) -> AppResult<Movie>;

    /// Genres offered as filter categories
    async fn genres(&self) -> AppResult<Vec<Genre>>;

    /// Where a movie can be watched in the configured region
    async fn watch_providers(&self, id: MovieId) -> AppResult<WatchProviders>;

    /// Catalog name for logging and debugging
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SortOrder, TimePeriod};

    fn keys(params: &[(&'static str, String)]) -> Vec<&'static str> {
        params.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn test_query_selects_search() {
        let request = CatalogRequest::from_input(Some("matrix"), FilterSet::new());
        assert_eq!(request.endpoint(), "/search/movie");
        assert_eq!(
            request.query_params(1),
            vec![
                ("query", "matrix".to_string()),
                ("page", "1".to_string()),
                ("sort_by", "popularity.desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_blank_query_selects_discover() {
        let request = CatalogRequest::from_input(Some("   "), FilterSet::new());
        assert_eq!(request.endpoint(), "/discover/movie");

        let request = CatalogRequest::from_input(None, FilterSet::new());
        assert!(matches!(request, CatalogRequest::Discover { .. }));
    }

    #[test]
    fn test_category_filter_joins_genres() {
        let filters = FilterSet::new().with_category("28").with_category("878");
        let request = CatalogRequest::from_input(None, filters);
        let params = request.query_params(3);

        assert!(params.contains(&("with_genres", "28,878".to_string())));
        assert!(params.contains(&("page", "3".to_string())));
    }

    #[test]
    fn test_only_first_time_period_is_applied() {
        let filters = FilterSet::new()
            .with_time_period("2010s".parse::<TimePeriod>().unwrap())
            .with_time_period("1990s".parse::<TimePeriod>().unwrap());
        let params = CatalogRequest::from_input(None, filters).query_params(1);

        assert!(params.contains(&("primary_release_date.gte", "2010-01-01".to_string())));
        assert!(params.contains(&("primary_release_date.lte", "2019-12-31".to_string())));
        assert_eq!(
            params
                .iter()
                .filter(|(k, _)| *k == "primary_release_date.gte")
                .count(),
            1
        );
    }

    #[test]
    fn test_parameter_order() {
        let filters = FilterSet::new()
            .with_category("28")
            .with_time_period("2000s".parse::<TimePeriod>().unwrap())
            .with_sort(SortOrder::Rating);
        let request = CatalogRequest::from_input(Some("heat"), filters);

        assert_eq!(
            keys(&request.query_params(1)),
            vec![
                "query",
                "page",
                "with_genres",
                "primary_release_date.gte",
                "primary_release_date.lte",
                "sort_by"
            ]
        );
    }

    #[test]
    fn test_fixed_listings_carry_only_page() {
        assert_eq!(CatalogRequest::Popular.endpoint(), "/movie/popular");
        assert_eq!(CatalogRequest::Upcoming.endpoint(), "/movie/upcoming");
        assert_eq!(keys(&CatalogRequest::Upcoming.query_params(2)), vec!["page"]);
    }

    #[test]
    fn test_genre_listing_is_discovery() {
        let request = CatalogRequest::genre(16);
        assert!(request
            .query_params(1)
            .contains(&("with_genres", "16".to_string())));
    }

    #[test]
    fn test_with_filters_keeps_query() {
        let filters = FilterSet::new().with_category("35");
        let search = CatalogRequest::from_input(Some("airplane"), FilterSet::new());

        match search.with_filters(filters.clone()) {
            CatalogRequest::Search { query, filters: applied } => {
                assert_eq!(query, "airplane");
                assert_eq!(applied, filters);
            }
            other => panic!("expected search, got {:?}", other),
        }

        assert_eq!(
            CatalogRequest::Popular.with_filters(filters.clone()),
            CatalogRequest::Discover { filters }
        );
    }
}
