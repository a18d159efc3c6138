use std::sync::Arc;

use crate::{
    backend::DocumentStore,
    error::AppResult,
    models::{Identity, Movie, MovieId},
};

/// Local mirror of a user's saved list.
///
/// Every mutation is written to the backend first; the mirror only changes
/// once the write is acknowledged, so it never shows a state that did not
/// persist.
pub struct MembershipStore {
    store: Arc<dyn DocumentStore>,
    mirror: Vec<Movie>,
}

impl MembershipStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            mirror: Vec::new(),
        }
    }

    /// Replaces the mirror with the list read from the backend
    pub fn seed(&mut self, movies: Vec<Movie>) {
        self.mirror.clear();
        for movie in movies {
            if !self.contains(movie.id) {
                self.mirror.push(movie);
            }
        }
    }

    pub async fn add(&mut self, identity: &Identity, movie: Movie) -> AppResult<()> {
        self.store.add_to_list(identity, &movie).await?;

        tracing::info!(user_id = %identity.user_id, movie_id = %movie.id, "Saved to list");

        if !self.contains(movie.id) {
            self.mirror.push(movie);
        }
        Ok(())
    }

    pub async fn remove(&mut self, identity: &Identity, movie: &Movie) -> AppResult<()> {
        self.store.remove_from_list(identity, movie).await?;

        tracing::info!(user_id = %identity.user_id, movie_id = %movie.id, "Removed from list");

        self.mirror.retain(|saved| saved.id != movie.id);
        Ok(())
    }

    pub fn contains(&self, id: MovieId) -> bool {
        self.mirror.iter().any(|saved| saved.id == id)
    }

    pub fn get(&self, id: MovieId) -> Option<&Movie> {
        self.mirror.iter().find(|saved| saved.id == id)
    }

    pub fn movies(&self) -> &[Movie] {
        &self.mirror
    }

    pub fn clear(&mut self) {
        self.mirror.clear();
    }
}
