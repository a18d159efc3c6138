use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use reqwest::Client as HttpClient;
use serde_json::{json, Value};

use marquee::error::AppError;
use marquee::models::{FilterSet, MovieId, TimePeriod};
use marquee::services::catalog::{Catalog, CatalogRequest, TmdbCatalog};
use marquee::services::listing::{ListViewController, ListingState};

/// Path and raw query of every request the fake catalog received
#[derive(Clone, Default)]
struct Recorded(Arc<Mutex<Vec<(String, String)>>>);

impl Recorded {
    fn record(&self, uri: &Uri) {
        self.0.lock().unwrap().push((
            uri.path().to_string(),
            uri.query().unwrap_or_default().to_string(),
        ));
    }

    fn requests(&self) -> Vec<(String, String)> {
        self.0.lock().unwrap().clone()
    }
}

const TOTAL_PAGES: u32 = 3;

fn requested_page(uri: &Uri) -> u32 {
    uri.query()
        .unwrap_or_default()
        .split('&')
        .find_map(|pair| pair.strip_prefix("page="))
        .and_then(|page| page.parse().ok())
        .unwrap_or(1)
}

async fn listing(State(recorded): State<Recorded>, uri: Uri) -> Json<Value> {
    recorded.record(&uri);
    let page = requested_page(&uri);
    let first = page * 10;

    Json(json!({
        "page": page,
        "total_pages": TOTAL_PAGES,
        "total_results": TOTAL_PAGES * 2,
        "results": [
            {"id": first, "title": format!("Movie {}", first), "poster_path": "/a.jpg",
             "overview": "", "release_date": "2012-05-04", "vote_average": 7.1},
            {"id": first + 1, "title": format!("Movie {}", first + 1), "poster_path": null,
             "overview": "", "release_date": "", "vote_average": 6.0}
        ]
    }))
}

async fn broken(State(recorded): State<Recorded>, uri: Uri) -> impl IntoResponse {
    recorded.record(&uri);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"status_message": "boom"})),
    )
}

async fn movie_details(State(recorded): State<Recorded>, uri: Uri) -> Json<Value> {
    recorded.record(&uri);
    Json(json!({
        "id": 603,
        "title": "The Matrix",
        "poster_path": "/matrix.jpg",
        "overview": "A hacker learns the truth.",
        "release_date": "1999-03-30",
        "vote_average": 8.2,
        "runtime": 136
    }))
}

async fn watch_providers(State(recorded): State<Recorded>, uri: Uri) -> Json<Value> {
    recorded.record(&uri);
    Json(json!({
        "id": 603,
        "results": {
            "TH": {
                "flatrate": [{"provider_name": "Netflix"}],
                "rent": [{"provider_name": "Apple TV"}, {"provider_name": "Google Play Movies"}],
                "buy": [{"provider_name": "Apple TV"}]
            }
        }
    }))
}

async fn genres(State(recorded): State<Recorded>, uri: Uri) -> Json<Value> {
    recorded.record(&uri);
    Json(json!({
        "genres": [{"id": 28, "name": "Action"}, {"id": 16, "name": "Animation"}]
    }))
}

async fn spawn_catalog() -> (String, Recorded) {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/search/movie", get(listing))
        .route("/discover/movie", get(listing))
        .route("/movie/popular", get(listing))
        .route("/movie/upcoming", get(broken))
        .route("/movie/:id", get(movie_details))
        .route("/movie/:id/watch/providers", get(watch_providers))
        .route("/genre/movie/list", get(genres))
        .with_state(recorded.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), recorded)
}

fn catalog(base_url: &str, region: &str) -> TmdbCatalog {
    TmdbCatalog::new(
        HttpClient::new(),
        "test-key".to_string(),
        base_url.to_string(),
        "en-US".to_string(),
        region.to_string(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_query_issues_text_search() {
    let (url, recorded) = spawn_catalog().await;
    let catalog = catalog(&url, "TH");

    let request = CatalogRequest::from_input(Some("matrix"), FilterSet::new());
    let page = catalog.fetch_page(&request, 1).await.unwrap();
    assert_eq!(page.page, 1);

    let requests = recorded.requests();
    assert_eq!(requests.len(), 1);
    let (path, query) = &requests[0];
    assert_eq!(path, "/search/movie");
    assert!(query.starts_with("api_key=test-key&language=en-US&query=matrix&page=1"));
    assert!(!query.contains("with_genres"));
}

#[tokio::test]
async fn test_category_without_query_issues_discovery() {
    let (url, recorded) = spawn_catalog().await;
    let catalog = catalog(&url, "TH");

    let filters = FilterSet::new()
        .with_category("28")
        .with_time_period(TimePeriod::new(2010).unwrap());
    let request = CatalogRequest::from_input(None, filters);
    catalog.fetch_page(&request, 1).await.unwrap();

    let (path, query) = &recorded.requests()[0];
    assert_eq!(path, "/discover/movie");
    assert!(query.contains("with_genres=28"));
    assert!(query.contains("primary_release_date.gte=2010-01-01"));
    assert!(query.contains("primary_release_date.lte=2019-12-31"));
    assert!(query.ends_with("sort_by=popularity.desc"));
}

#[tokio::test]
async fn test_listing_walks_every_page() {
    let (url, recorded) = spawn_catalog().await;
    let catalog: Arc<dyn Catalog> = Arc::new(catalog(&url, "TH"));

    let mut listing = ListViewController::new(catalog, CatalogRequest::Popular);
    listing.refresh().await.unwrap();
    while listing.load_more().await.unwrap().is_some() {}

    assert_eq!(listing.state(), ListingState::Exhausted { page: TOTAL_PAGES });
    assert_eq!(listing.results().len(), 6);
    assert_eq!(listing.results()[0].id, MovieId(10));
    assert_eq!(listing.results()[5].id, MovieId(31));

    let pages: Vec<u32> = recorded
        .requests()
        .iter()
        .map(|(_, query)| {
            query
                .split('&')
                .find_map(|pair| pair.strip_prefix("page="))
                .and_then(|page| page.parse().ok())
                .unwrap()
        })
        .collect();
    assert_eq!(pages, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_error_status_is_network_error() {
    let (url, _) = spawn_catalog().await;
    let catalog: Arc<dyn Catalog> = Arc::new(catalog(&url, "TH"));

    let err = catalog
        .fetch_page(&CatalogRequest::Upcoming, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Network(_)));

    let mut listing = ListViewController::new(catalog, CatalogRequest::Upcoming);
    assert!(listing.refresh().await.is_err());
    assert_eq!(listing.state(), ListingState::Idle);
    assert!(listing.results().is_empty());
}

#[tokio::test]
async fn test_unreachable_catalog_is_network_error() {
    let catalog = catalog("http://127.0.0.1:9", "TH");
    let err = catalog
        .fetch_page(&CatalogRequest::Popular, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Network(_)));
}

#[tokio::test]
async fn test_movie_details() {
    let (url, recorded) = spawn_catalog().await;
    let movie = catalog(&url, "TH").movie(MovieId(603)).await.unwrap();

    assert_eq!(movie.title, "The Matrix");
    assert_eq!(movie.release_year(), Some(1999));
    assert_eq!(recorded.requests()[0].0, "/movie/603");
}

#[tokio::test]
async fn test_watch_providers_for_region() {
    let (url, _) = spawn_catalog().await;

    let providers = catalog(&url, "TH")
        .watch_providers(MovieId(603))
        .await
        .unwrap();
    assert_eq!(providers.flatrate, vec!["Netflix"]);
    assert_eq!(providers.distinct(), vec!["Netflix", "Apple TV", "Google Play Movies"]);

    let elsewhere = catalog(&url, "US")
        .watch_providers(MovieId(603))
        .await
        .unwrap();
    assert!(elsewhere.is_empty());
}

#[tokio::test]
async fn test_genres() {
    let (url, _) = spawn_catalog().await;
    let genres = catalog(&url, "TH").genres().await.unwrap();

    assert_eq!(genres.len(), 2);
    assert_eq!(genres[0].name, "Action");
}
