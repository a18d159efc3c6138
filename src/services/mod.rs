pub mod catalog;
pub mod filter_composer;
pub mod listing;
pub mod my_list;
pub mod session;
pub mod watch_links;

pub use catalog::{Catalog, CatalogRequest, TmdbCatalog};
pub use filter_composer::FilterComposer;
pub use listing::{ListViewController, ListingState, PageCursor, PageOutcome, PageTicket};
pub use my_list::MembershipStore;
pub use session::SessionProvider;
pub use watch_links::StreamingPlatform;
