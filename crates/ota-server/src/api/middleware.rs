//! Update-client gate — Axum `FromRequestParts` extractor.
//!
//! Firmware routes take `UpdateClient` as an argument, so a request that
//! does not come from an ESP8266/ESP32 http updater is refused before the
//! handler touches the filesystem.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::services::identity::{self, Architecture};
use ota_common::AppError;

pub const UPDATER_ONLY: &str = "The request available only from ESP8266 or ESP32 http updater.";

/// A request proven to come from a genuine http updater.
#[derive(Debug, Clone, Copy)]
pub struct UpdateClient(pub Architecture);

impl UpdateClient {
    pub fn arch(&self) -> Architecture {
        self.0
    }
}

impl<S> FromRequestParts<S> for UpdateClient
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity::classify(&parts.headers)
            .map(UpdateClient)
            .map_err(|reason| {
                tracing::info!(path = %parts.uri.path(), %reason, "Firmware request refused");
                AppError::Rejected(UPDATER_ONLY.into())
            })
    }
}
