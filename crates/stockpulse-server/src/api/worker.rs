use axum::{
    extract::{Extension, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use stockpulse_core::SnapshotStatus;
use stockpulse_store::{SnapshotStore, SNAPSHOT_KEY};

use crate::api::{map_store_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;
use crate::notify::UpdateEvent;

#[derive(Debug, Serialize)]
pub(super) struct WorkerRunData {
    status: SnapshotStatus,
    stock_count: usize,
    communities_scanned: usize,
    generated_at: DateTime<Utc>,
    notified_clients: usize,
}

/// `POST /api/v1/worker` — run one pipeline pass to completion.
///
/// Bearer auth happens in middleware, before any pipeline work. Runs are
/// serialized behind the state's run lock, so a second trigger during a run
/// waits its turn instead of interleaving snapshot writes. Listeners are only
/// notified after a successful run has been persisted.
pub(super) async fn trigger_run<S>(
    State(state): State<AppState<S>>,
    Extension(req_id): Extension<RequestId>,
) -> Response
where
    S: SnapshotStore + Clone + 'static,
{
    let _run_guard = state.run_lock.lock().await;

    tracing::info!("trigger received; starting pipeline run");
    let snapshot = stockpulse_pipeline::run(&state.config, &state.rules).await;

    if let Err(e) = state.store.set(SNAPSHOT_KEY, &snapshot).await {
        return map_store_error(req_id.0, &e).into_response();
    }

    match snapshot.status {
        SnapshotStatus::Ok => {
            let notified = state.notifier.broadcast(&UpdateEvent::update());
            tracing::info!(
                stocks = snapshot.stocks.len(),
                notified,
                "pipeline run persisted and broadcast"
            );
            Json(ApiResponse {
                data: WorkerRunData {
                    status: snapshot.status,
                    stock_count: snapshot.stocks.len(),
                    communities_scanned: snapshot.communities_scanned,
                    generated_at: snapshot.generated_at,
                    notified_clients: notified,
                },
                meta: ResponseMeta::new(req_id.0),
            })
            .into_response()
        }
        SnapshotStatus::Error => {
            // The error snapshot is persisted so the dashboard can show a
            // distinguishable error state, but listeners are not signalled.
            ApiError::new(req_id.0, "internal_error", "pipeline run failed").into_response()
        }
    }
}
