use super::ApiState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

/// GET / - Serves the configured dashboard page
pub(super) async fn index(State(state): State<Arc<ApiState>>) -> Response {
    let Some(path) = state.config.api.dashboard_path.as_ref() else {
        return not_found("no dashboard configured (set api.dashboard_path)");
    };

    match tokio::fs::read_to_string(path).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read dashboard");
            not_found("dashboard file could not be read")
        }
    }
}

fn not_found(reason: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Html(format!(
            r#"<!doctype html>
<html>
<head><title>sensorcast</title></head>
<body style="font-family: system-ui; padding: 2rem;">
    <h1>dashboard unavailable</h1>
    <p>{}</p>
    <p>the API is still reachable at <code>/api/latest</code> and <code>/api/forecast</code>.</p>
</body>
</html>"#,
            reason
        )),
    )
        .into_response()
}
