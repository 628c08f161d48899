use axum::{
    extract::{Extension, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use stockpulse_pipeline::QuoteError;
use stockpulse_store::SnapshotStore;

use crate::api::{ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct PriceParams {
    symbol: Option<String>,
}

/// `GET /api/v1/price?symbol=XYZ` — best-effort quote proxy over the
/// provider fallback chain.
pub(super) async fn get_price<S>(
    State(state): State<AppState<S>>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<PriceParams>,
) -> Response
where
    S: SnapshotStore + Clone + 'static,
{
    let Some(symbol) = params
        .symbol
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    else {
        return ApiError::new(req_id.0, "validation_error", "symbol parameter is required")
            .into_response();
    };

    match state.quotes.fetch(symbol).await {
        Ok(quote) => Json(ApiResponse {
            data: quote,
            meta: ResponseMeta::new(req_id.0),
        })
        .into_response(),
        Err(QuoteError::Unavailable { symbol }) => ApiError::new(
            req_id.0,
            "not_found",
            format!("no quote provider returned data for {symbol}"),
        )
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "quote proxy failed");
            ApiError::new(req_id.0, "internal_error", "quote lookup failed").into_response()
        }
    }
}
