//! HTTP handlers, one module per resource.

pub mod user;
pub use user::UserHandlers;
