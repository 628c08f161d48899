use axum::{
    extract::{Extension, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use stockpulse_core::{Snapshot, SnapshotStatus, SymbolAggregate};
use stockpulse_store::{SnapshotStore, SNAPSHOT_KEY};

use crate::api::{map_store_error, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

/// The read endpoint's payload: the persisted snapshot verbatim, or an
/// explicit "no data yet" placeholder when no run has ever completed.
#[derive(Debug, Serialize)]
pub(super) struct StocksData {
    stocks: Vec<SymbolAggregate>,
    generated_at: Option<DateTime<Utc>>,
    communities_scanned: usize,
    status: SnapshotStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

impl StocksData {
    fn placeholder() -> Self {
        Self {
            stocks: Vec::new(),
            generated_at: None,
            communities_scanned: 0,
            status: SnapshotStatus::Ok,
            message: Some("no data available; the worker has not run yet"),
        }
    }
}

impl From<Snapshot> for StocksData {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            stocks: snapshot.stocks,
            generated_at: Some(snapshot.generated_at),
            communities_scanned: snapshot.communities_scanned,
            status: snapshot.status,
            message: None,
        }
    }
}

/// `GET /api/v1/stocks` — the dashboard's single read endpoint.
pub(super) async fn get_stocks<S>(
    State(state): State<AppState<S>>,
    Extension(req_id): Extension<RequestId>,
) -> Response
where
    S: SnapshotStore + Clone + 'static,
{
    let meta = ResponseMeta::new(req_id.0.clone());

    match state.store.get(SNAPSHOT_KEY).await {
        Ok(Some(snapshot)) => Json(ApiResponse {
            data: StocksData::from(snapshot),
            meta,
        })
        .into_response(),
        Ok(None) => Json(ApiResponse {
            data: StocksData::placeholder(),
            meta,
        })
        .into_response(),
        Err(e) => map_store_error(req_id.0, &e).into_response(),
    }
}
