//! Listing engine and batch denormalization built on the store seam.

pub mod denorm;
pub mod listing;

pub use denorm::{names_from_ids, resolve_names};
pub use listing::{
    paginated_list, DetailHandler, ListQuery, ListRequest, ListingHandler, SearchHandler,
    SearchRequest,
};
