//! Aggregation service.
//!
//! Each operation defaults caller input, binds the query variables, drives
//! the transport and normalizes the result. Calls are independent and the
//! service holds no mutable state, so one instance can be shared freely.

use crate::api::catalog::{Operation, QueryCatalog, QueryTemplate, Variables};
use crate::api::client::AnimeTransport;
use crate::api::context::CallContext;
use crate::api::types::AnimeEnvelope;
use crate::error::{AggregatorError, Result};
use crate::normalizer::{to_anime_list, to_single_anime};
use crate::season::resolve_current_season;
use chrono::{DateTime, Utc};
use shared::{Anime, AnimeStatus};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Search term used when the caller sends an empty query
pub const DEFAULT_SEARCH: &str = "bakemono";
/// Result limit for search and new releases
pub const DEFAULT_LIMIT: i64 = 10;
/// Result limit for the ranked listing
pub const DEFAULT_TOP_LIMIT: i64 = 30;
pub const DEFAULT_PAGE: i64 = 1;
/// Status filter applied to new releases
pub const NEW_RELEASE_STATUS: AnimeStatus = AnimeStatus::Ongoing;

fn positive_or(value: i64, default: i64) -> i64 {
    if value > 0 {
        value
    } else {
        default
    }
}

/// Orchestrates catalog, transport and normalizer per logical operation
pub struct AggregationService<T: AnimeTransport> {
    transport: Arc<T>,
    catalog: QueryCatalog,
}

impl<T: AnimeTransport> Clone for AggregationService<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            catalog: self.catalog,
        }
    }
}

impl<T: AnimeTransport> AggregationService<T> {
    /// Create a new aggregation service
    pub fn new(transport: T) -> Self {
        Self::with_shared(Arc::new(transport))
    }

    /// Create a service around an already shared transport
    pub fn with_shared(transport: Arc<T>) -> Self {
        Self {
            transport,
            catalog: QueryCatalog::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn fetch(
        &self,
        operation: Operation,
        variables: Variables,
        ctx: &CallContext,
    ) -> Result<AnimeEnvelope> {
        let template: &QueryTemplate = self.catalog.lookup(operation)?;
        let variables = template.bind(variables)?;

        self.transport
            .execute(template, &variables, ctx)
            .await
            .map_err(|e| {
                warn!(operation = %operation, error = %e, "Upstream call failed");
                AggregatorError::transport(operation, e)
            })
    }

    /// Search anime by name
    ///
    /// A blank search falls back to `DEFAULT_SEARCH`; a non-positive limit to
    /// `DEFAULT_LIMIT`.
    pub async fn search_anime(
        &self,
        ctx: &CallContext,
        search: &str,
        limit: i64,
    ) -> Result<Vec<Anime>> {
        let search = match search.trim() {
            "" => DEFAULT_SEARCH,
            term => term,
        };
        let limit = positive_or(limit, DEFAULT_LIMIT);

        info!(search = search, limit = limit, "Searching anime");

        let variables = Variables::new().set("search", search).set("limit", limit);
        let animes = to_anime_list(self.fetch(Operation::Search, variables, ctx).await?);

        if animes.is_empty() {
            info!(search = search, "No anime matched search");
        }
        Ok(animes)
    }

    /// Fetch the ranked listing
    ///
    /// `genre` is only bound when non-blank.
    pub async fn get_top_anime(
        &self,
        ctx: &CallContext,
        limit: i64,
        page: i64,
        genre: Option<&str>,
    ) -> Result<Vec<Anime>> {
        let limit = positive_or(limit, DEFAULT_TOP_LIMIT);
        let page = positive_or(page, DEFAULT_PAGE);
        let genre = genre.map(str::trim).filter(|g| !g.is_empty());

        let mut variables = Variables::new().set("limit", limit).set("page", page);
        if let Some(genre) = genre {
            variables = variables.set("genre", genre);
        }

        let animes = to_anime_list(self.fetch(Operation::TopRanked, variables, ctx).await?);

        info!(
            count = animes.len(),
            limit = limit,
            page = page,
            genre = genre.unwrap_or("-"),
            "Loaded top anime"
        );
        Ok(animes)
    }

    /// Fetch a single anime by upstream id
    ///
    /// A blank id or an empty upstream result yields `NotFound`.
    pub async fn get_anime_by_id(&self, ctx: &CallContext, id: &str) -> Result<Anime> {
        let id = id.trim();
        if id.is_empty() {
            return Err(AggregatorError::NotFound {
                operation: Operation::DetailById,
                id: id.to_string(),
            });
        }

        debug!(id = id, "Fetching anime details");

        let variables = Variables::new().set("id", id);
        let envelope = self.fetch(Operation::DetailById, variables, ctx).await?;
        to_single_anime(envelope, Operation::DetailById, id)
    }

    /// Fetch several anime by id in one upstream call
    ///
    /// Blank ids are dropped; with nothing left the upstream is not called.
    pub async fn get_animes_by_ids(
        &self,
        ctx: &CallContext,
        ids: &[String],
    ) -> Result<Vec<Anime>> {
        let ids: Vec<&str> = ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .collect();

        if ids.is_empty() {
            debug!("Empty id list, skipping upstream call");
            return Ok(Vec::new());
        }

        let requested = ids.len();
        let variables = Variables::new().set("ids", ids);
        let animes = to_anime_list(self.fetch(Operation::BatchByIds, variables, ctx).await?);

        debug!(requested = requested, returned = animes.len(), "Fetched anime batch");
        Ok(animes)
    }

    /// Fetch ongoing titles of the current season
    pub async fn get_new_releases(&self, ctx: &CallContext, limit: i64) -> Result<Vec<Anime>> {
        self.get_new_releases_at(ctx, limit, Utc::now()).await
    }

    /// Fetch ongoing titles of the season containing `now`
    pub async fn get_new_releases_at(
        &self,
        ctx: &CallContext,
        limit: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Anime>> {
        let limit = positive_or(limit, DEFAULT_LIMIT);
        let season = resolve_current_season(&now).to_string();

        let variables = Variables::new()
            .set("limit", limit)
            .set("season", season.as_str())
            .set("status", NEW_RELEASE_STATUS.as_str());
        let animes = to_anime_list(self.fetch(Operation::NewReleases, variables, ctx).await?);

        info!(count = animes.len(), season = %season, "Loaded new releases");
        Ok(animes)
    }
}
