use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::{
        common::DeletedResponse,
        description::{DescriptionInput, DescriptionResponse, DescriptionSummary},
    },
    error::{AppError, ErrorBody},
    routes::extract::ApiJson,
    services::description_service,
    state::SharedState,
};

/// Rule-set descriptions shared by all games.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/descriptions",
            get(list_descriptions).post(create_description),
        )
        .route(
            "/descriptions/{id}",
            get(get_description)
                .put(update_description)
                .delete(delete_description),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/descriptions",
    tag = "descriptions",
    responses(
        (status = 200, description = "All descriptions ordered by name", body = [DescriptionResponse]),
        (status = 503, description = "Storage unavailable", body = ErrorBody)
    )
)]
pub async fn list_descriptions(
    State(state): State<SharedState>,
) -> Result<Json<Vec<DescriptionResponse>>, AppError> {
    Ok(Json(description_service::list_descriptions(&state).await?))
}

/// Create a user description. The name must not be taken.
#[utoipa::path(
    post,
    path = "/api/v1/descriptions",
    tag = "descriptions",
    request_body = DescriptionInput,
    responses(
        (status = 201, description = "Description created", body = DescriptionSummary),
        (status = 400, description = "Invalid or duplicate description", body = ErrorBody)
    )
)]
pub async fn create_description(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<DescriptionInput>,
) -> Result<(StatusCode, Json<DescriptionSummary>), AppError> {
    let created = description_service::create_description(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/descriptions/{id}",
    tag = "descriptions",
    params(("id" = String, Path, description = "Identifier of the description")),
    responses(
        (status = 200, description = "Description", body = DescriptionResponse),
        (status = 404, description = "Unknown description", body = ErrorBody)
    )
)]
pub async fn get_description(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<DescriptionResponse>, AppError> {
    Ok(Json(description_service::get_description(&state, &id).await?))
}

/// Replace the name and text of a description. Default descriptions are read-only.
#[utoipa::path(
    put,
    path = "/api/v1/descriptions/{id}",
    tag = "descriptions",
    params(("id" = String, Path, description = "Identifier of the description")),
    request_body = DescriptionInput,
    responses(
        (status = 200, description = "Description updated", body = DescriptionSummary),
        (status = 400, description = "Invalid input, duplicate name or default description", body = ErrorBody),
        (status = 404, description = "Unknown description", body = ErrorBody)
    )
)]
pub async fn update_description(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<DescriptionInput>,
) -> Result<Json<DescriptionSummary>, AppError> {
    Ok(Json(
        description_service::update_description(&state, &id, payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/descriptions/{id}",
    tag = "descriptions",
    params(("id" = String, Path, description = "Identifier of the description")),
    responses(
        (status = 200, description = "Description deleted", body = DeletedResponse),
        (status = 404, description = "Unknown description", body = ErrorBody)
    )
)]
pub async fn delete_description(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, AppError> {
    Ok(Json(
        description_service::delete_description(&state, &id).await?,
    ))
}
