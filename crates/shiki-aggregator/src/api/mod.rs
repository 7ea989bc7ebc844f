//! Shikimori GraphQL API access.
//!
//! This module holds the fixed query catalog, the wire types, and an
//! authenticated, cancellable transport for the Shikimori endpoint.

pub mod catalog;
pub mod client;
pub mod context;
pub mod types;

pub use catalog::{Operation, QueryCatalog, QueryTemplate, ResponseShape, VarType, Variables};
pub use client::{AnimeTransport, Credentials, ShikimoriClient};
pub use context::CallContext;
pub use types::*;
