//! Theme color catalog for CSS variable completion.
//!
//! This crate owns everything the completion pipeline knows about editor theme colors:
//!
//! * [`ColorDescriptor`] and [`ColorCatalog`]: the validated data model shared with the harvester.
//! * [`ThemeKind`] and [`ColorDescriptor::resolve`]: per-theme default selection.
//! * [`schema`]: conversion of the host's workbench color schema into descriptors.
//! * [`CatalogRetriever`]: memoized retrieval, either from a refreshed on-disk cache of a remote
//!   document ([`FileCacheRetriever`]) or from a live host schema ([`LiveSchemaRetriever`]).
//!
//! Retrieval never fails from the caller's point of view. Network, parse and storage errors are
//! logged and degrade to the last known catalog, or to an empty one.
#![warn(missing_docs)]

mod descriptor;
mod error;
mod fetch;
mod flight;
pub mod retriever;
pub mod schema;
mod store;
mod theme;

pub use descriptor::{ColorCatalog, ColorDefault, ColorDescriptor, ThemedDefault};
pub use error::{CatalogError, Result};
pub use fetch::{Fetch, HttpFetcher};
pub use retriever::{CatalogRetriever, FileCacheOptions, FileCacheRetriever, LiveSchemaRetriever, SchemaSource};
pub use store::CatalogStore;
pub use theme::ThemeKind;
