//! Lookup backends serving expert tools.
//!
//! [`LocalCodeBackend`] answers code, file and memory lookups from a local
//! checkout. With the `web-tools` feature it can also forward web queries to
//! [`DuckDuckGoSearch`].

mod local;
#[cfg(feature = "web-tools")]
mod web;

pub use local::LocalCodeBackend;
#[cfg(feature = "web-tools")]
pub use web::DuckDuckGoSearch;
