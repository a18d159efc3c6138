use std::{path::Path, sync::Arc, time::Duration};

use reqwest::Client as HttpClient;

use crate::{
    backend::firebase::FirebaseBackend,
    cli::{Credentials, MyListAction, ProfileAction},
    config::Config,
    error::{AppError, AppResult, Outcome},
    models::{Movie, MovieId},
    services::{
        catalog::{Catalog, CatalogRequest, TmdbCatalog},
        listing::ListViewController,
        session::SessionProvider,
        watch_links::provider_link,
    },
};

/// Shared clients for one command invocation
pub struct AppContext {
    pub config: Config,
    pub http_client: HttpClient,
    pub catalog: Arc<dyn Catalog>,
}

impl AppContext {
    pub fn new(config: Config) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let catalog = TmdbCatalog::from_config(&config, http_client.clone())?;

        Ok(Self {
            config,
            http_client,
            catalog: Arc::new(catalog),
        })
    }

    /// Session provider backed by the configured Firebase project
    pub fn session(&self) -> AppResult<SessionProvider> {
        let firebase = self.config.firebase()?;
        let backend = FirebaseBackend::new(self.http_client.clone(), &firebase);

        Ok(SessionProvider::new(
            Arc::new(backend.auth),
            Arc::new(backend.documents),
            Arc::new(backend.storage),
        ))
    }

    async fn signed_in(&self, credentials: &Credentials) -> AppResult<SessionProvider> {
        let mut session = self.session()?;
        session
            .sign_in(&credentials.email, &credentials.password)
            .await?;
        Ok(session)
    }
}

fn print_movie(movie: &Movie, image_base: &str) {
    let year = movie
        .release_year()
        .map(|y| y.to_string())
        .unwrap_or_else(|| "----".to_string());
    println!(
        "{:>8}  {} ({})  {:.1}",
        movie.id, movie.title, year, movie.vote_average
    );
    if let Some(poster) = movie.poster_url(image_base, "w500") {
        println!("          {}", poster);
    }
}

fn report(action: &str, outcome: Outcome) {
    match outcome.message {
        None if outcome.success => println!("{}", action),
        Some(message) => println!("{} failed: {}", action, message),
        None => println!("{} failed", action),
    }
}

/// Loads up to `pages` pages of a listing and prints everything accumulated
pub async fn list_movies(ctx: &AppContext, request: CatalogRequest, pages: u32) -> AppResult<()> {
    let mut listing = ListViewController::new(Arc::clone(&ctx.catalog), request);

    listing.refresh().await?;

    while listing.cursor().page < pages {
        match listing.load_more().await {
            Ok(Some(_)) => {}
            Ok(None) => break,
            Err(e) => {
                println!("Stopped after page {}: {}", listing.cursor().page, e.user_message());
                break;
            }
        }
    }

    let cursor = listing.cursor();
    for movie in listing.results() {
        print_movie(movie, &ctx.config.tmdb_image_url);
    }
    println!(
        "{} movies, page {}{}",
        listing.results().len(),
        cursor.page,
        if cursor.has_more { " (more available)" } else { "" }
    );

    Ok(())
}

pub async fn list_genres(ctx: &AppContext) -> AppResult<()> {
    let genres = ctx.catalog.genres().await?;
    for genre in &genres {
        println!("{:>6}  {}", genre.id, genre.name);
    }
    Ok(())
}

pub async fn show_providers(ctx: &AppContext, movie_id: MovieId) -> AppResult<()> {
    let movie = ctx.catalog.movie(movie_id).await?;
    let providers = ctx.catalog.watch_providers(movie_id).await?;

    println!("{} ({})", movie.title, ctx.config.watch_region);
    if providers.is_empty() {
        println!("Not available for streaming in this region");
        return Ok(());
    }

    for (kind, names) in [
        ("Stream", &providers.flatrate),
        ("Rent", &providers.rent),
        ("Buy", &providers.buy),
    ] {
        if !names.is_empty() {
            println!("{}: {}", kind, names.join(", "));
        }
    }

    for name in providers.distinct() {
        if let Some(url) = provider_link(name, &movie.title)? {
            println!("  {} → {}", name, url);
        }
    }

    Ok(())
}

pub async fn sign_up(
    ctx: &AppContext,
    email: &str,
    password: &str,
    confirm_password: Option<&str>,
    username: &str,
) -> AppResult<()> {
    let mut session = ctx.session()?;
    let outcome: Outcome = session
        .sign_up(email, password, confirm_password.unwrap_or(password), username)
        .await
        .into();
    report("Sign up", outcome);
    Ok(())
}

pub async fn my_list(ctx: &AppContext, credentials: &Credentials, action: MyListAction) -> AppResult<()> {
    let mut session = ctx.signed_in(credentials).await?;

    match action {
        MyListAction::Show => {
            if session.my_list().is_empty() {
                println!("Your list is empty");
            }
            for movie in session.my_list() {
                print_movie(movie, &ctx.config.tmdb_image_url);
            }
        }
        MyListAction::Add { movie_id } => {
            let movie = ctx.catalog.movie(MovieId(movie_id)).await?;
            let title = movie.title.clone();
            let outcome: Outcome = session.add_to_my_list(movie).await.into();
            report(&format!("Saved {}", title), outcome);
        }
        MyListAction::Remove { movie_id } => {
            let outcome: Outcome = session.remove_saved(MovieId(movie_id)).await.into();
            report(&format!("Removed {}", movie_id), outcome);
        }
    }

    Ok(())
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

pub async fn profile(ctx: &AppContext, credentials: &Credentials, action: ProfileAction) -> AppResult<()> {
    let mut session = ctx.signed_in(credentials).await?;

    match action {
        ProfileAction::Show => {}
        ProfileAction::Username { name } => {
            let outcome: Outcome = session.update_username(&name).await.into();
            report("Username updated", outcome);
        }
        ProfileAction::Picture { path } => {
            let bytes = tokio::fs::read(&path).await.map_err(|e| {
                AppError::InvalidInput(format!("Could not read {}: {}", path.display(), e))
            })?;
            let outcome: Outcome = session
                .update_profile_picture(bytes, content_type_for(&path))
                .await
                .into();
            report("Profile picture uploaded", outcome);
        }
    }

    if let Some(profile) = session.profile() {
        println!("User:    {}", profile.user_id);
        println!("Name:    {}", profile.username);
        println!(
            "Picture: {}",
            profile.profile_picture.as_deref().unwrap_or("(none)")
        );
        println!("Saved:   {} movies", session.my_list().len());
    }

    Ok(())
}
