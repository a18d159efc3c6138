pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::models::{FilterSet, SortOrder, TimePeriod};

#[derive(Parser)]
#[command(name = "marquee")]
#[command(about = "Browse the movie catalog and manage your watch list", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search movies by title
    Search {
        /// Free-text query; a blank query falls back to discovery
        query: String,

        #[command(flatten)]
        filters: FilterArgs,

        #[command(flatten)]
        paging: PageArgs,
    },
    /// Discover movies by genre, decade and sort order
    Discover {
        #[command(flatten)]
        filters: FilterArgs,

        #[command(flatten)]
        paging: PageArgs,
    },
    /// Currently popular movies
    Popular {
        #[command(flatten)]
        paging: PageArgs,
    },
    /// Upcoming releases
    Upcoming {
        #[command(flatten)]
        paging: PageArgs,
    },
    /// List the genres usable with --genre
    Genres,
    /// Where a movie can be watched, with links to each platform
    Providers {
        /// Catalog id of the movie
        movie_id: u64,
    },
    /// Create an account
    SignUp {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        /// Defaults to --password
        #[arg(long)]
        confirm_password: Option<String>,

        #[arg(long)]
        username: String,
    },
    /// Show or change your saved movies
    MyList {
        #[command(flatten)]
        credentials: Credentials,

        #[command(subcommand)]
        action: MyListAction,
    },
    /// Show or change your profile
    Profile {
        #[command(flatten)]
        credentials: Credentials,

        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
pub enum MyListAction {
    /// List saved movies
    Show,
    /// Save a movie by catalog id
    Add { movie_id: u64 },
    /// Remove a saved movie by catalog id
    Remove { movie_id: u64 },
}

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Print username, picture and saved-list size
    Show,
    /// Change the username
    Username { name: String },
    /// Upload a new profile picture (max 5MB)
    Picture { path: PathBuf },
}

#[derive(Args, Clone, Debug)]
pub struct FilterArgs {
    /// Genre id (repeatable), see `marquee genres`
    #[arg(long = "genre")]
    pub genres: Vec<u32>,

    /// Release decade such as 2010s (repeatable; only the first is applied)
    #[arg(long = "decade")]
    pub decades: Vec<TimePeriod>,

    /// popularity or rating
    #[arg(long, default_value = "popularity")]
    pub sort: SortOrder,
}

impl FilterArgs {
    pub fn to_filter_set(&self) -> FilterSet {
        let filters = self
            .genres
            .iter()
            .fold(FilterSet::new(), |set, genre| set.with_category(genre.to_string()));
        self.decades
            .iter()
            .fold(filters, |set, period| set.with_time_period(*period))
            .with_sort(self.sort)
    }
}

#[derive(Args, Clone, Copy, Debug)]
pub struct PageArgs {
    /// Number of pages to load
    #[arg(long, default_value_t = 1)]
    pub pages: u32,
}

#[derive(Args, Clone)]
pub struct Credentials {
    #[arg(long, env = "MARQUEE_EMAIL")]
    pub email: String,

    #[arg(long, env = "MARQUEE_PASSWORD", hide_env_values = true)]
    pub password: String,
}
