//! Firmware download endpoint.
//!
//! Every path other than `/_catalog` names a file under the catalog root.
//! Only genuine ESP8266/ESP32 http updaters are served.

use std::sync::Arc;

use axum::{extract::Path, extract::State, routing::get, Router};

use crate::api::middleware::UpdateClient;
use crate::services::firmware::FirmwareImage;
use crate::services::paths;
use crate::AppState;
use ota_common::{AppError, AppResult};

/// Build the downloads router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(download_root))
        .route("/{*path}", get(download_firmware))
        .with_state(state)
}

async fn download_root(
    State(state): State<Arc<AppState>>,
    client: UpdateClient,
) -> AppResult<FirmwareImage> {
    serve_firmware(&state, client, "").await
}

async fn download_firmware(
    State(state): State<Arc<AppState>>,
    client: UpdateClient,
    Path(path): Path<String>,
) -> AppResult<FirmwareImage> {
    serve_firmware(&state, client, &path).await
}

/// Read the requested file in full and hand it back with its digest.
///
/// Any I/O failure (missing file, directory, permissions) becomes a 500
/// carrying the error text; nothing is streamed in that case.
async fn serve_firmware(
    state: &AppState,
    client: UpdateClient,
    requested: &str,
) -> AppResult<FirmwareImage> {
    let file_path = paths::resolve(&state.catalog_root, requested.trim_start_matches('/'))
        .inspect_err(|e| tracing::info!("{}", e))?;
    tracing::debug!(arch = client.arch().tag(), file = %file_path.display(), "Request file");

    let image = FirmwareImage::load(&file_path).await.map_err(|e| {
        tracing::error!(file = %file_path.display(), error = %e, "Failed to read firmware");
        AppError::Io(e)
    })?;

    tracing::info!(
        arch = client.arch().tag(),
        file = %image.metadata.disposition_filename,
        size = image.metadata.size,
        md5 = %image.metadata.content_md5,
        "Serving firmware"
    );
    Ok(image)
}
