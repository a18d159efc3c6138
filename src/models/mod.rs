pub mod filters;
pub mod movie;
pub mod profile;

pub use filters::{FacetSelection, FilterSet, SortOrder, TimePeriod};
pub use movie::{CatalogPage, Genre, Movie, MovieId, WatchProviders};
pub use profile::{Identity, ProfileUpdate, UserDocument, UserProfile};
