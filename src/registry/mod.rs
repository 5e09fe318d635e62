//! Registry catalog discovery
//!
//! This module talks to the Harbor v2.0 catalog API to enumerate the
//! repositories of a project and the artifacts (digest + tags) of a
//! repository. Image bytes never pass through here; transfers are left to the
//! external copy tool.

pub mod catalog;
pub mod client;
pub mod encoding;

pub use catalog::{Artifact, Catalog, Repository, Tag};
pub use client::{
    CatalogClient, CatalogClientBuilder, CatalogTransport, HttpTransport, PAGE_SIZE,
};
