use std::convert::Infallible;

use axum::{
    extract::{Query, State},
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    routing::get,
    Extension, Router,
};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    events::{Event, SubscriptionFilter},
    handlers::AppState,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ChangeParams {
    pub medicine_id: Option<Uuid>,
    pub aisle_id: Option<Uuid>,
}

impl ChangeParams {
    pub fn filter(&self, user_id: &str) -> SubscriptionFilter {
        let mut filter = SubscriptionFilter::for_user(user_id);
        if let Some(id) = self.medicine_id {
            filter = filter.medicine(id);
        }
        if let Some(id) = self.aisle_id {
            filter = filter.aisle(id);
        }
        filter
    }
}

pub fn change_routes() -> Router<AppState> {
    Router::new().route("/", get(stream_changes))
}

fn to_sse(event: Event) -> SseEvent {
    match SseEvent::default().event(event.name()).json_data(&event) {
        Ok(sse) => sse,
        Err(e) => {
            warn!(error = %e, event = event.name(), "failed to encode change event");
            SseEvent::default().event("error").data("encoding failed")
        }
    }
}

/// Live stream of the caller's committed changes
#[utoipa::path(
    get,
    path = "/api/v1/changes",
    params(ChangeParams),
    responses(
        (status = 200, description = "Server-sent change events", content_type = "text/event-stream"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "changes"
)]
pub async fn stream_changes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ChangeParams>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let subscription = state.feed.subscribe(params.filter(&user.user_id));
    info!(
        user_id = %user.user_id,
        subscribers = state.feed.subscriber_count(),
        "change subscription opened"
    );
    let stream = subscription
        .into_stream()
        .map(|event| Ok::<_, Infallible>(to_sse(event)));
    Sse::new(stream).keep_alive(KeepAlive::default())
}
