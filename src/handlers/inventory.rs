use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::entities::{location_inventory, stock_adjustment};
use crate::errors::ServiceError;
use crate::services::inventory::{
    AdjustStockInput, ListAdjustmentsQuery, ReorderSettingsInput, StockAdjustmentResult,
    StockTransferResult, TransferStockInput,
};
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/locations/:location_id", get(list_location_inventory))
        .route(
            "/locations/:location_id/items/:item_id",
            get(get_location_inventory),
        )
        .route(
            "/locations/:location_id/items/:item_id/reorder",
            put(set_reorder_settings),
        )
        .route("/adjustments", get(list_stock_adjustments).post(adjust_stock))
        .route("/transfers", post(transfer_stock))
}

pub async fn list_location_inventory(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(location_id): Path<Uuid>,
) -> ApiResult<Vec<location_inventory::Model>> {
    let rows = state
        .services
        .inventory
        .list_location_inventory(&ctx, location_id)
        .await?;
    Ok(Json(ApiResponse::success(rows)))
}

pub async fn get_location_inventory(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path((location_id, item_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<location_inventory::Model> {
    let row = state
        .services
        .inventory
        .get_location_inventory(&ctx, item_id, location_id)
        .await?;
    Ok(Json(ApiResponse::success(row)))
}

pub async fn set_reorder_settings(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path((location_id, item_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<ReorderSettingsInput>,
) -> ApiResult<location_inventory::Model> {
    let row = state
        .services
        .inventory
        .set_reorder_settings(&ctx, location_id, item_id, input)
        .await?;
    Ok(Json(ApiResponse::success(row)))
}

pub async fn adjust_stock(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(input): Json<AdjustStockInput>,
) -> Result<(StatusCode, Json<ApiResponse<StockAdjustmentResult>>), ServiceError> {
    let result = state.services.inventory.adjust_stock(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(result))))
}

pub async fn transfer_stock(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(input): Json<TransferStockInput>,
) -> Result<(StatusCode, Json<ApiResponse<StockTransferResult>>), ServiceError> {
    let result = state.services.inventory.transfer_stock(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(result))))
}

pub async fn list_stock_adjustments(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<ListAdjustmentsQuery>,
) -> ApiResult<PaginatedResponse<stock_adjustment::Model>> {
    let limit = state.config.page_size(query.limit);
    let page = state
        .services
        .inventory
        .list_stock_adjustments(&ctx, query, limit)
        .await?;
    Ok(Json(ApiResponse::success(page.into())))
}
