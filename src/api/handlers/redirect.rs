//! Handler for short link redirects.

use axum::{
    extract::{ConnectInfo, Path, State, rejection::PathRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::request_metadata::extract_request_metadata;

/// Redirects a short code to its destination URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Copy click metadata (IP, user agent, referer, edge hints) out of the request
/// 2. Resolve the code: exists, active, not expired, budget left
/// 3. Queue a click job for the background worker (fire-and-forget)
/// 4. Return `302 Found` with `Location` set to the destination
///
/// # Errors
///
/// - 404 `Link not found`, also for a path segment that does not decode
///   to UTF-8
/// - 403 `Link is inactive`
/// - 410 `Link has expired`
/// - 429 `Click limit exceeded`
/// - 500 on store failures
pub async fn redirect_handler(
    State(state): State<AppState>,
    code: Result<Path<String>, PathRejection>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let Path(code) = code.map_err(|rejection| {
        debug!(error = %rejection, "Undecodable short code");
        AppError::NotFound
    })?;

    let metadata = extract_request_metadata(&headers, addr.ip(), state.behind_proxy);

    let location = state
        .redirect_service
        .handle_redirect(&code, metadata)
        .await?;

    debug!(code = %code, "Redirecting");

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

/// Fallback for every path that is not a short code, including `/`.
pub async fn not_found_handler() -> AppError {
    AppError::NotFound
}
