//! HTTP route modules for the logistics API.
//!
//! - `orders`: order listing, creation, update and cancellation
//! - `recipients`: recipient CRUD with name filtering and pagination

pub mod orders;
pub mod recipients;
