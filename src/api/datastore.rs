//! Datastore API endpoints.

use axum::extract::State;

use super::{error, success, ApiResult};
use crate::models::RevisionInfo;
use crate::AppState;

/// GET /api/datastore/revision - Get the current revision info.
pub async fn get_revision(State(state): State<AppState>) -> ApiResult<RevisionInfo> {
    match state.repo.get_revision_info().await {
        Ok(revision_info) => {
            let revision_id = revision_info.revision_id;
            success(revision_info, revision_id)
        }
        Err(e) => error(e, 0),
    }
}
