//! Movie browsing and watch-list client core.
//!
//! - `services::catalog` queries the movie catalog API
//! - `services::filter_composer` and `services::listing` drive filtered,
//!   paginated listings
//! - `services::session` and `services::my_list` manage the signed-in user,
//!   their profile and their saved list against a managed backend
//! - `cli` exposes all of it as the `marquee` command

pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult, Outcome};
