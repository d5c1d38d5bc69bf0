//! Live recipe list as Server-Sent Events.

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use tokio_stream::{wrappers::WatchStream, Stream, StreamExt};

use crate::state::RecipeSnapshot;
use crate::AppState;

/// SSE event name carrying a full recipe snapshot.
pub const RECIPES_EVENT: &str = "recipes";

fn snapshot_event(snapshot: &RecipeSnapshot) -> Event {
    match serde_json::to_string(snapshot) {
        Ok(json) => Event::default()
            .event(RECIPES_EVENT)
            .id(snapshot.revision_id.to_string())
            .data(json),
        Err(e) => {
            tracing::error!("Failed to encode recipe snapshot: {}", e);
            Event::default().event("error").data(e.to_string())
        }
    }
}

/// GET /api/recipes/stream - Current snapshot, then one per change.
///
/// The subscription is dropped together with the response body when the
/// client disconnects.
pub async fn stream_recipes(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = WatchStream::new(state.recipes.subscribe_recipes())
        .map(|snapshot| Ok(snapshot_event(&snapshot)));

    Sse::new(stream).keep_alive(KeepAlive::default())
}
