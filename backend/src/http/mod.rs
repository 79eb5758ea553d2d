// HTTP handlers and routing.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State as AxumState};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tracing::{debug, warn};
use viridis_core::model::SubmitRequest;
use viridis_core::validate::ValidationError;

use crate::app::AppState;
use crate::engine::SubmitError;
use crate::utils::now_epoch_ms;
use crate::ws::ws_handler;

mod types;
pub use types::*;

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/color", get(get_color).put(put_color))
        .route("/api/palette", get(get_palette))
        .route("/api/submitters/:id", get(get_submitter))
        .route("/ws/color", get(ws_handler))
        .with_state(app_state)
}

impl IntoResponse for SubmitError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            SubmitError::Validation(_) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response()
            }
            SubmitError::Throttled { remaining_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorResponse {
                    success: false,
                    message,
                    remaining_time: Some(remaining_secs),
                }),
            )
                .into_response(),
            SubmitError::Store(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse::new(message))).into_response()
            }
        }
    }
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

async fn get_color(
    AxumState(app_state): AxumState<AppState>,
    query: Option<Query<ColorQuery>>,
) -> impl IntoResponse {
    let query = query.map(|Query(query)| query).unwrap_or_default();
    let engine = &app_state.engine;
    let radius_km = query.radius_km().unwrap_or(engine.config().default_radius_km);
    Json(engine.snapshot(query.location(), radius_km, now_epoch_ms()).await)
}

async fn put_color(
    AxumState(app_state): AxumState<AppState>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!(reason = %rejection.body_text(), "submission body rejected");
            return SubmitError::from(ValidationError::InvalidBody(rejection.body_text())).into_response();
        }
    };

    match app_state.engine.submit(&request, now_epoch_ms()).await {
        Ok(_) => Json(SubmitResponse { success: true }).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_palette(AxumState(app_state): AxumState<AppState>) -> impl IntoResponse {
    Json(app_state.engine.palette().to_document())
}

async fn get_submitter(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<String>,
) -> Response {
    match app_state.engine.store().submitter(&id).await {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("Unknown submitter {id}"))),
        )
            .into_response(),
        Err(err) => {
            warn!(?err, submitter = %id, "submitter lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to read submitter")),
            )
                .into_response()
        }
    }
}
