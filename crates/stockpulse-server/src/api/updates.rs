use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Extension, State},
    response::sse::{Event, Sse},
    response::IntoResponse,
    Json,
};
use futures::stream::Stream;
use futures::StreamExt;
use serde::Serialize;

use stockpulse_store::SnapshotStore;

use crate::api::{ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;
use crate::notify::UpdateEvent;

/// Reconnect delay advertised to clients on the initial event.
const RECONNECT_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Serialize)]
pub(super) struct NotifyData {
    notified: bool,
    active_connections: usize,
}

/// `GET /api/v1/updates` — long-lived one-directional event stream.
///
/// The subscription queues a `connected` event immediately; `keepalive`
/// events arrive on the notifier's heartbeat interval and one `update` per
/// completed pipeline run. When the client goes away the subscription drops
/// and unregisters itself.
pub(super) async fn stream_updates<S>(
    State(state): State<AppState<S>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: SnapshotStore + Clone + 'static,
{
    let subscription = state.notifier.subscribe();

    let stream = subscription.map(|event| {
        let sse_event = match Event::default().json_data(&event) {
            Ok(ev) => ev,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode update event");
                Event::default().data("{}")
            }
        };
        let sse_event = if matches!(event, UpdateEvent::Connected { .. }) {
            sse_event.retry(RECONNECT_DELAY)
        } else {
            sse_event
        };
        Ok(sse_event)
    });

    Sse::new(stream)
}

/// `POST /api/v1/notify` — external worker hook.
///
/// An out-of-process pipeline run (CLI, CI job) calls this after persisting
/// its snapshot so connected dashboards refresh. Bearer-protected in the
/// router.
pub(super) async fn notify_clients<S>(
    State(state): State<AppState<S>>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse
where
    S: SnapshotStore + Clone + 'static,
{
    let active_connections = state.notifier.broadcast(&UpdateEvent::update());
    tracing::info!(active_connections, "external update notification fanned out");

    Json(ApiResponse {
        data: NotifyData {
            notified: true,
            active_connections,
        },
        meta: ResponseMeta::new(req_id.0),
    })
}
