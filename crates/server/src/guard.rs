//! Cross-origin protection
//!
//! The guard runs in front of every route, CORS preflights included.
//! Requests without an `Origin` header (SDKs, curl, same-origin page loads)
//! pass through. Requests whose origin the validator rejects get a 403 and
//! never reach a handler, so a hostile page cannot read or clear the buffer.

use axum::extract::{Request, State};
use axum::http::header::ORIGIN;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use spotlight_origin::OriginValidator;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::warn;

use crate::error::ApiError;

/// Reject requests from origins the validator does not allow
pub async fn origin_guard(
    State(validator): State<OriginValidator>,
    request: Request,
    next: Next,
) -> Response {
    let Some(origin) = request.headers().get(ORIGIN) else {
        return next.run(request).await;
    };

    let origin = match origin.to_str() {
        Ok(origin) => origin.to_owned(),
        Err(_) => {
            return ApiError::Forbidden("non-ASCII origin".into()).into_response();
        }
    };

    if !validator.is_allowed(&origin).await {
        warn!(
            origin = %origin,
            method = %request.method(),
            path = %request.uri().path(),
            "cross-origin request rejected"
        );
        return ApiError::Forbidden(origin).into_response();
    }

    next.run(request).await
}

/// CORS for origins that passed the guard: mirror whatever was asked
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}
