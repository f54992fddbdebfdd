//! Catalog listing endpoint.
//!
//! Endpoint:
//!   GET /_catalog?op=list&path={relative path}
//!
//! `path` defaults to the catalog root. `list` is the only operation.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, OriginalUri, Query, State},
    routing::get,
    Json, Router,
};

use crate::services::catalog::{self, CatalogEntry};
use crate::services::paths;
use crate::AppState;
use ota_common::{AppError, AppResult};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/_catalog", get(catalog_request))
        .with_state(state)
}

// ─── Types ───────────────────────────────────────────────────

/// Query parameters as given. Blank values are ignored and the first
/// occurrence of a repeated key wins.
#[derive(Debug, Default, PartialEq, Eq)]
struct CatalogQuery {
    op: Option<String>,
    path: Option<String>,
}

impl CatalogQuery {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_str() {
                "op" => &mut query.op,
                "path" => &mut query.path,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }
}

#[derive(Debug, PartialEq, Eq)]
enum CatalogOp {
    List,
}

impl CatalogOp {
    fn parse(op: &str) -> AppResult<Self> {
        match op {
            "list" => Ok(Self::List),
            other => Err(AppError::Protocol(format!("{other} unknown operation"))),
        }
    }
}

// ─── Handler ─────────────────────────────────────────────────

async fn catalog_request(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> AppResult<Json<Vec<CatalogEntry>>> {
    let request = uri
        .path_and_query()
        .map_or_else(|| uri.path(), |pq| pq.as_str());

    let params = match query {
        Ok(Query(pairs)) => CatalogQuery::from_pairs(pairs),
        Err(e) => {
            tracing::debug!(error = %e, "Unparseable catalog query");
            CatalogQuery::default()
        }
    };

    let op = match params.op.as_deref() {
        None => Err(AppError::Protocol(format!("{request} invalid catalog request"))),
        Some(op) => CatalogOp::parse(op),
    }
    .inspect_err(|e| tracing::info!("{}", e))?;

    match op {
        CatalogOp::List => list_directory(&state, params.path.as_deref().unwrap_or(".")).await,
    }
}

async fn list_directory(state: &AppState, requested: &str) -> AppResult<Json<Vec<CatalogEntry>>> {
    let dir = paths::resolve(&state.catalog_root, requested)
        .inspect_err(|e| tracing::info!("{}", e))?;

    let entries = catalog::build_catalog(&dir).await.map_err(|e| {
        tracing::error!(dir = %dir.display(), error = %e, "Failed to list catalog directory");
        AppError::Io(e)
    })?;
    tracing::debug!(dir = %dir.display(), entries = entries.len(), "Catalog listed");

    Ok(Json(entries))
}
