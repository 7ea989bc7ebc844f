//! Anime metadata aggregation over the Shikimori GraphQL API.
//!
//! This library builds parameterized upstream queries, sends them with the
//! configured credentials, and normalizes the responses into the shared
//! `Anime` model.

pub mod api;
pub mod error;
pub mod normalizer;
pub mod season;
pub mod service;

pub use api::{AnimeTransport, CallContext, Credentials, Operation, QueryCatalog, ShikimoriClient};
pub use error::{AggregatorError, TransportError};
pub use season::resolve_current_season;
pub use service::AggregationService;
