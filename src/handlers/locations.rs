use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::entities::location;
use crate::errors::ServiceError;
use crate::services::locations::{CreateLocationInput, ListLocationsQuery, UpdateLocationInput};
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

pub fn location_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_locations).post(create_location))
        .route(
            "/:id",
            get(get_location).put(update_location).delete(delete_location),
        )
}

pub async fn list_locations(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<ListLocationsQuery>,
) -> ApiResult<PaginatedResponse<location::Model>> {
    let limit = state.config.page_size(query.limit);
    let page = state
        .services
        .locations
        .list_locations(&ctx, query, limit)
        .await?;
    Ok(Json(ApiResponse::success(page.into())))
}

pub async fn create_location(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(input): Json<CreateLocationInput>,
) -> Result<(StatusCode, Json<ApiResponse<location::Model>>), ServiceError> {
    let location = state.services.locations.create_location(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(location))))
}

pub async fn get_location(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<location::Model> {
    let location = state.services.locations.find_location(&ctx, id).await?;
    Ok(Json(ApiResponse::success(location)))
}

pub async fn update_location(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateLocationInput>,
) -> ApiResult<location::Model> {
    let location = state
        .services
        .locations
        .update_location(&ctx, id, input)
        .await?;
    Ok(Json(ApiResponse::success(location)))
}

pub async fn delete_location(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.locations.delete_location(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
