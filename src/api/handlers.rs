use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};

use crate::api::{
    types::{ErrorResponse, HealthResponse, SummariseRequest, SummariseResponse},
    AppState,
};

pub async fn summarise(
    State(state): State<AppState>,
    payload: Result<Json<SummariseRequest>, JsonRejection>,
) -> Result<Json<SummariseResponse>, Response> {
    // Same {"detail": ...} shape as the dispatcher's errors; status kept.
    let Json(req) = payload.map_err(|rejection| {
        let status = rejection.status();
        let body = ErrorResponse {
            detail: rejection.body_text(),
        };
        (status, Json(body)).into_response()
    })?;

    let result = state
        .dispatcher
        .handle(req.into())
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(Json(result.into()))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        model_loaded: state.dispatcher.readiness().is_loaded(),
    })
}
