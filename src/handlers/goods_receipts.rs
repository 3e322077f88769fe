use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::entities::{goods_receipt, goods_receipt_line};
use crate::errors::ServiceError;
use crate::services::receiving::{
    AddReceiptLineInput, ConfirmedReceipt, CreateGoodsReceiptInput, GoodsReceiptWithLines,
    ListGoodsReceiptsQuery, UpdateReceiptLineInput,
};
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

pub fn goods_receipt_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_goods_receipts).post(create_goods_receipt))
        .route("/:id", get(get_goods_receipt).delete(delete_goods_receipt))
        .route("/:id/lines", post(add_receipt_line))
        .route(
            "/lines/:line_id",
            put(update_receipt_line).delete(remove_receipt_line),
        )
        .route("/:id/confirm", post(confirm_goods_receipt))
        .route("/:id/cancel", post(cancel_goods_receipt))
}

pub async fn list_goods_receipts(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<ListGoodsReceiptsQuery>,
) -> ApiResult<PaginatedResponse<goods_receipt::Model>> {
    let limit = state.config.page_size(query.limit);
    let page = state
        .services
        .goods_receipts
        .list_goods_receipts(&ctx, query, limit)
        .await?;
    Ok(Json(ApiResponse::success(page.into())))
}

pub async fn create_goods_receipt(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(input): Json<CreateGoodsReceiptInput>,
) -> Result<(StatusCode, Json<ApiResponse<goods_receipt::Model>>), ServiceError> {
    let receipt = state
        .services
        .goods_receipts
        .create_goods_receipt(&ctx, input)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(receipt))))
}

pub async fn get_goods_receipt(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<GoodsReceiptWithLines> {
    let receipt = state.services.goods_receipts.find_goods_receipt(&ctx, id).await?;
    Ok(Json(ApiResponse::success(receipt)))
}

pub async fn delete_goods_receipt(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.goods_receipts.delete_goods_receipt(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_receipt_line(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
    Json(input): Json<AddReceiptLineInput>,
) -> Result<(StatusCode, Json<ApiResponse<goods_receipt_line::Model>>), ServiceError> {
    let line = state
        .services
        .goods_receipts
        .add_receipt_line(&ctx, id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(line))))
}

pub async fn update_receipt_line(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(line_id): Path<Uuid>,
    Json(input): Json<UpdateReceiptLineInput>,
) -> ApiResult<goods_receipt_line::Model> {
    let line = state
        .services
        .goods_receipts
        .update_receipt_line(&ctx, line_id, input)
        .await?;
    Ok(Json(ApiResponse::success(line)))
}

pub async fn remove_receipt_line(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(line_id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state
        .services
        .goods_receipts
        .remove_receipt_line(&ctx, line_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn confirm_goods_receipt(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<ConfirmedReceipt> {
    let confirmed = state
        .services
        .goods_receipts
        .confirm_goods_receipt(&ctx, id)
        .await?;
    Ok(Json(ApiResponse::with_message(
        confirmed,
        "Goods receipt confirmed",
    )))
}

pub async fn cancel_goods_receipt(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<goods_receipt::Model> {
    let receipt = state
        .services
        .goods_receipts
        .cancel_goods_receipt(&ctx, id)
        .await?;
    Ok(Json(ApiResponse::success(receipt)))
}
