use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use marquee::cli::{commands, Cli, Commands};
use marquee::cli::commands::AppContext;
use marquee::models::MovieId;
use marquee::services::catalog::CatalogRequest;
use marquee::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Search {
            query,
            filters,
            paging,
        } => {
            let request = CatalogRequest::from_input(Some(&query), filters.to_filter_set());
            commands::list_movies(&ctx, request, paging.pages).await?;
        }
        Commands::Discover { filters, paging } => {
            let request = CatalogRequest::from_input(None, filters.to_filter_set());
            commands::list_movies(&ctx, request, paging.pages).await?;
        }
        Commands::Popular { paging } => {
            commands::list_movies(&ctx, CatalogRequest::Popular, paging.pages).await?;
        }
        Commands::Upcoming { paging } => {
            commands::list_movies(&ctx, CatalogRequest::Upcoming, paging.pages).await?;
        }
        Commands::Genres => {
            commands::list_genres(&ctx).await?;
        }
        Commands::Providers { movie_id } => {
            commands::show_providers(&ctx, MovieId(movie_id)).await?;
        }
        Commands::SignUp {
            email,
            password,
            confirm_password,
            username,
        } => {
            commands::sign_up(
                &ctx,
                &email,
                &password,
                confirm_password.as_deref(),
                &username,
            )
            .await?;
        }
        Commands::MyList {
            credentials,
            action,
        } => {
            commands::my_list(&ctx, &credentials, action).await?;
        }
        Commands::Profile {
            credentials,
            action,
        } => {
            commands::profile(&ctx, &credentials, action).await?;
        }
    }

    Ok(())
}
