/// Paginated listing controller
///
/// One controller owns the accumulated results of one listing (a search, a
/// genre, popular, ...). Fetching is split in two phases so the host decides
/// where the network call runs:
///
/// 1. `begin_initial` / `begin_load_more` move the state machine into a
///    loading state and hand out a [`PageTicket`]
/// 2. `complete` applies the fetched page (or the failure) for that ticket
///
/// Every reset bumps a generation counter. A ticket issued before the reset
/// completes as [`PageOutcome::Stale`] and leaves the listing untouched.
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{CatalogPage, FilterSet, Movie},
    services::catalog::{Catalog, CatalogRequest},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingState {
    /// Nothing loaded yet, or the first page failed
    Idle,
    Loading { page: u32 },
    Loaded { page: u32 },
    LoadingMore { page: u32 },
    /// The last page has been loaded
    Exhausted { page: u32 },
}

impl ListingState {
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            ListingState::Loading { .. } | ListingState::LoadingMore { .. }
        )
    }
}

/// Position of a listing in the catalog's pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub page: u32,
    pub has_more: bool,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self {
            page: 1,
            has_more: true,
        }
    }
}

/// Permission to fetch one page, tied to the listing generation it was issued in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTicket {
    generation: u64,
    page: u32,
    request: CatalogRequest,
}

impl PageTicket {
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn request(&self) -> &CatalogRequest {
        &self.request
    }

    /// Runs the catalog call this ticket stands for
    pub async fn execute(&self, catalog: &dyn Catalog) -> AppResult<CatalogPage> {
        catalog.fetch_page(&self.request, self.page).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page was applied; `received` movies arrived with it
    Applied { received: usize },
    /// The listing was reset while the page was in flight
    Stale,
}

pub struct ListViewController {
    catalog: Arc<dyn Catalog>,
    request: CatalogRequest,
    listing_id: Uuid,
    state: ListingState,
    /// State to fall back to when the in-flight page fails
    settled: ListingState,
    cursor: PageCursor,
    results: Vec<Movie>,
    generation: u64,
}

impl ListViewController {
    pub fn new(catalog: Arc<dyn Catalog>, request: CatalogRequest) -> Self {
        let listing_id = Uuid::new_v4();
        tracing::debug!(
            listing_id = %listing_id,
            catalog = catalog.name(),
            endpoint = %request.endpoint(),
            "Listing created"
        );

        Self {
            catalog,
            request,
            listing_id,
            state: ListingState::Idle,
            settled: ListingState::Idle,
            cursor: PageCursor::default(),
            results: Vec::new(),
            generation: 0,
        }
    }

    pub fn state(&self) -> ListingState {
        self.state
    }

    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    pub fn results(&self) -> &[Movie] {
        &self.results
    }

    pub fn request(&self) -> &CatalogRequest {
        &self.request
    }

    pub fn listing_id(&self) -> Uuid {
        self.listing_id
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.state = ListingState::Idle;
        self.settled = ListingState::Idle;
        self.cursor = PageCursor::default();
        self.results.clear();
    }

    fn ticket(&self, page: u32) -> PageTicket {
        PageTicket {
            generation: self.generation,
            page,
            request: self.request.clone(),
        }
    }

    /// Clears the listing and starts over from page 1
    pub fn begin_initial(&mut self) -> PageTicket {
        self.reset();
        self.state = ListingState::Loading { page: 1 };

        tracing::debug!(
            listing_id = %self.listing_id,
            generation = self.generation,
            endpoint = %self.request.endpoint(),
            "Listing reset"
        );

        self.ticket(1)
    }

    /// Switches to another listing and starts loading it
    pub fn change_request(&mut self, request: CatalogRequest) -> PageTicket {
        self.request = request;
        self.begin_initial()
    }

    /// Re-queries the current listing with newly committed filters
    pub fn apply_filters(&mut self, filters: FilterSet) -> PageTicket {
        let request = self.request.with_filters(filters);
        self.change_request(request)
    }

    /// Re-queries with a new search text, keeping the committed filters
    pub fn set_query(&mut self, query: Option<&str>) -> PageTicket {
        let filters = self.request.filters().cloned().unwrap_or_default();
        self.change_request(CatalogRequest::from_input(query, filters))
    }

    /// End-of-list signal.
    ///
    /// Returns `None` while a page is in flight, once the listing is
    /// exhausted, or when the last page reported no more results. From
    /// `Idle` (first page failed) it retries page 1.
    pub fn begin_load_more(&mut self) -> Option<PageTicket> {
        let (next, page) = match self.state {
            ListingState::Idle => (ListingState::Loading { page: 1 }, 1),
            ListingState::Loaded { page } if self.cursor.has_more => {
                (ListingState::LoadingMore { page: page + 1 }, page + 1)
            }
            state => {
                tracing::debug!(
                    listing_id = %self.listing_id,
                    state = ?state,
                    "Load more suppressed"
                );
                return None;
            }
        };

        self.settled = self.state;
        self.state = next;
        Some(self.ticket(page))
    }

    /// Applies the result of a ticket's fetch.
    ///
    /// Page 1 replaces the accumulated results, later pages append. On
    /// failure the listing returns to where it was before the fetch, so the
    /// same page can be requested again.
    pub fn complete(
        &mut self,
        ticket: PageTicket,
        result: AppResult<CatalogPage>,
    ) -> AppResult<PageOutcome> {
        if ticket.generation != self.generation {
            tracing::debug!(
                listing_id = %self.listing_id,
                ticket_generation = ticket.generation,
                generation = self.generation,
                page = ticket.page,
                "Ignoring stale page"
            );
            return Ok(PageOutcome::Stale);
        }

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(
                    listing_id = %self.listing_id,
                    page = ticket.page,
                    error = %e,
                    "Page fetch failed"
                );
                self.state = self.settled;
                return Err(e);
            }
        };

        let received = page.results.len();
        let has_more = ticket.page < page.total_pages;

        if ticket.page == 1 {
            self.results = page.results;
        } else {
            self.results.extend(page.results);
        }

        self.cursor = PageCursor {
            page: ticket.page,
            has_more,
        };
        self.state = if has_more {
            ListingState::Loaded { page: ticket.page }
        } else {
            ListingState::Exhausted { page: ticket.page }
        };
        self.settled = self.state;

        tracing::info!(
            listing_id = %self.listing_id,
            page = ticket.page,
            total_pages = page.total_pages,
            received,
            accumulated = self.results.len(),
            has_more,
            "Page applied"
        );

        Ok(PageOutcome::Applied { received })
    }

    /// Fetches a ticket's page from the catalog and applies it
    pub async fn fetch(&mut self, ticket: PageTicket) -> AppResult<PageOutcome> {
        let catalog = Arc::clone(&self.catalog);
        let result = ticket.execute(catalog.as_ref()).await;
        self.complete(ticket, result)
    }

    /// Reloads the listing from page 1
    pub async fn refresh(&mut self) -> AppResult<PageOutcome> {
        let ticket = self.begin_initial();
        self.fetch(ticket).await
    }

    /// Loads the next page if one may be requested now
    pub async fn load_more(&mut self) -> AppResult<Option<PageOutcome>> {
        match self.begin_load_more() {
            Some(ticket) => self.fetch(ticket).await.map(Some),
            None => Ok(None),
        }
    }
}
