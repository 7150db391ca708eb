//! Rendering of the current session state for the terminal.
//!
//! # Submodules
//!
//! - [`text`]: Human-readable filter bar, listings and pagination bar
//! - [`json`]: The current page as a JSON document for scripting
//!
//! Both renderers read the same [`crate::fetcher::FeedStatus`], so loading,
//! error, "no results" and results are shown exclusively of one another.

pub mod json;
pub mod text;
