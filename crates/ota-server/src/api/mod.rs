//! HTTP routes.
//!
//! `/_catalog` lists the catalog; every other path is a firmware download.
//! Only GET (and HEAD) is served; other methods get 405.

mod catalog;
mod downloads;
pub mod middleware;

use crate::AppState;
use axum::Router;
use std::sync::Arc;

/// Build the router with all routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(catalog::router(state.clone()))
        .merge(downloads::router(state))
}
