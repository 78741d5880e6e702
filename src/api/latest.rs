use super::{query_store, ApiError, ApiState};
use crate::latest::{resolve, LatestSnapshot};
use axum::{extract::State, response::Json};
use std::sync::Arc;
use tracing::debug;

/// GET /api/latest - Latest value per sensor category
///
/// Absent categories read 0; `updated` falls back to now.
pub(super) async fn get_latest(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<LatestSnapshot>, ApiError> {
    Ok(Json(load_snapshot(&state).await?))
}

pub(super) async fn load_snapshot(state: &ApiState) -> Result<LatestSnapshot, ApiError> {
    let rows = query_store(&state.store, |store| store.fetch_latest_per_topic()).await?;
    let snapshot = resolve(&rows)?;

    debug!(
        rows = rows.len(),
        updated = %snapshot.updated,
        "Resolved latest snapshot"
    );
    Ok(snapshot)
}
