//! Screen state for each route, independent of how it is drawn.
//!
//! Every operation that touches data takes the store as an argument, so the
//! same view logic runs against SQLite, a test fake, or any other backend.

pub mod create;
pub mod detail;
pub mod filter;
pub mod landing;
pub mod notify;
