use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::entities::{order, order_item};
use crate::errors::ServiceError;
use crate::services::orders::{
    CreateOrderInput, ListOrdersQuery, OrderItemInput, OrderWithItems, UpdateOrderItemInput,
};
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order).delete(delete_order))
        .route("/:id/items", post(add_order_item))
        .route(
            "/:id/items/:item_id",
            put(update_order_item).delete(remove_order_item),
        )
        .route("/:id/send", post(send_order))
        .route("/:id/cancel", post(cancel_order))
        .route("/:id/close", post(close_order))
}

pub async fn list_orders(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<ListOrdersQuery>,
) -> ApiResult<PaginatedResponse<order::Model>> {
    let limit = state.config.page_size(query.limit);
    let page = state.services.orders.list_orders(&ctx, query, limit).await?;
    Ok(Json(ApiResponse::success(page.into())))
}

pub async fn create_order(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(input): Json<CreateOrderInput>,
) -> Result<(StatusCode, Json<ApiResponse<OrderWithItems>>), ServiceError> {
    let order = state.services.orders.create_order(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

pub async fn get_order(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<OrderWithItems> {
    let order = state.services.orders.find_order(&ctx, id).await?;
    Ok(Json(ApiResponse::success(order)))
}

pub async fn delete_order(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.orders.delete_order(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_order_item(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
    Json(input): Json<OrderItemInput>,
) -> Result<(StatusCode, Json<ApiResponse<order_item::Model>>), ServiceError> {
    let item = state.services.orders.add_order_item(&ctx, id, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(item))))
}

pub async fn update_order_item(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<UpdateOrderItemInput>,
) -> ApiResult<order_item::Model> {
    let item = state
        .services
        .orders
        .update_order_item(&ctx, id, item_id, input)
        .await?;
    Ok(Json(ApiResponse::success(item)))
}

pub async fn remove_order_item(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ServiceError> {
    state
        .services
        .orders
        .remove_order_item(&ctx, id, item_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn send_order(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<order::Model> {
    let order = state.services.orders.send_order(&ctx, id).await?;
    Ok(Json(ApiResponse::success(order)))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<order::Model> {
    let order = state.services.orders.cancel_order(&ctx, id).await?;
    Ok(Json(ApiResponse::success(order)))
}

pub async fn close_order(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<order::Model> {
    let order = state.services.orders.close_order(&ctx, id).await?;
    Ok(Json(ApiResponse::success(order)))
}
