//! Common utilities for building and using the srcfetch tools.

#![warn(missing_docs, unused_crate_dependencies)]

pub mod errors;
pub mod fs;
