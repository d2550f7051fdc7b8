//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: model identifiers an expert can be bound to
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod model;
