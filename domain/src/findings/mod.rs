//! Findings domain
//!
//! A [`entities::Finding`] is a severity-tagged observation contributed by an
//! expert. Findings are never edited or deleted: a later finding may name an
//! earlier one in `supersedes`, and [`dedupe::dedupe_findings`] keeps one
//! representative per (category, location) key while reporting the rest as
//! superseded.

pub mod dedupe;
pub mod entities;
pub mod parsing;
