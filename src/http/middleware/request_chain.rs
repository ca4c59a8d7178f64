//! Runs the request chain around every route.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::chain::RequestChain;

/// The downstream router is the chain's terminal handler.
pub async fn request_chain_middleware(
    State(chain): State<Arc<RequestChain>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    chain
        .handle(request, |req| async move { Ok(next.run(req).await) })
        .await
        .unwrap_or_else(IntoResponse::into_response)
}
