//! The dynamic query toolkit: pagination normalization, field allow-listing,
//! match clause building, timezone shifting, and the subarray reduction.

pub mod dedupe;
pub mod matcher;
pub mod pagination;
pub mod timezone;

pub use dedupe::dedupe_subarrays;
pub use matcher::{is_identifier_candidate, match_for_listing, matching_paths, reinterpret_identifiers};
pub use pagination::{sort_doc, PageData, PageParams, SortOrder};
pub use timezone::{change_timezone, change_timezone_minutes, offset_minutes, DEFAULT_TZ_OFFSET};
