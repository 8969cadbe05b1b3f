#![allow(clippy::len_without_is_empty)]

//! Streaming construction and query of Document Array Profiles (DAP) over a
//! prefix-free parse of a concatenated reference text.
//!
//! [`refs::RefCatalog`] tracks document boundaries over the text,
//! [`pfp`] supplies a read-only view over its prefix-free parse,
//! [`builder::DapBuilder`] streams that parse into a run-length BWT plus
//! per-run document-array profiles, and [`index::DapIndex`] reloads the
//! written streams into a queryable run-length FM-index.

pub mod builder;
pub mod converter;
pub mod error;
pub mod index;
pub mod options;
pub mod pfp;
pub mod refs;
pub mod suffix_array;
mod util;

pub use builder::DapBuilder;
pub use error::{Error, Result};
pub use index::DapIndex;
pub use refs::{DocId, RefCatalog};
