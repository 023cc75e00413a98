//! 顾客账单接口
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/tabs | POST | 开启账单 `{restaurant_id}` |
//! | /api/tabs | GET | 我的账单 (新的在前) |
//! | /api/tabs/{tab_id} | GET | 账单详情 |
//! | /api/tabs/{tab_id}/items | POST | 加菜 `{menu_item_id, quantity=1}` |
//! | /api/tabs/{tab_id}/items/{item_id}/served | PUT | 上菜状态 `{served}` (经理) |
//! | /api/tabs/{tab_id}/close | POST | 结账 `{payment_method_id}` |
//!
//! All routes require a bearer token.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post, put},
};
use serde::Deserialize;
use shared::error::{ApiResponse, AppResult};
use shared::models::{
    CustomerTabView, MenuItemId, PaymentMethodId, RestaurantId, Tab, TabId, TabItem, TabItemId,
    TabView,
};

use super::json_body;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::validation::validate_id;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/tabs", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(open_tab).get(list_my_tabs))
        .route("/{tab_id}", get(get_tab))
        .route("/{tab_id}/items", post(add_item))
        .route("/{tab_id}/items/{item_id}/served", put(set_served))
        .route("/{tab_id}/close", post(close_tab))
}

#[derive(Debug, Deserialize)]
pub struct OpenTabRequest {
    pub restaurant_id: RestaurantId,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub menu_item_id: MenuItemId,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct ServedRequest {
    pub served: bool,
}

#[derive(Debug, Deserialize)]
pub struct CloseTabRequest {
    pub payment_method_id: PaymentMethodId,
}

async fn open_tab(
    State(state): State<ServerState>,
    user: CurrentUser,
    payload: Result<Json<OpenTabRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<Tab>>)> {
    let req = json_body(payload)?;
    let restaurant_id = validate_id(req.restaurant_id, "restaurant_id")?;

    let tab = state.tabs.open_tab(&user, restaurant_id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(tab))))
}

async fn list_my_tabs(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<CustomerTabView>>>> {
    let tabs = state.tabs.list_my_tabs(&user).await?;
    Ok(Json(ApiResponse::success(tabs)))
}

async fn get_tab(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(tab_id): Path<TabId>,
) -> AppResult<Json<ApiResponse<TabView>>> {
    let view = state.tabs.get_tab(&user, tab_id).await?;
    Ok(Json(ApiResponse::success(view)))
}

async fn add_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(tab_id): Path<TabId>,
    payload: Result<Json<AddItemRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<TabItem>>> {
    let req = json_body(payload)?;
    let menu_item_id = validate_id(req.menu_item_id, "menu_item_id")?;

    let item = state
        .tabs
        .add_item(&user, tab_id, menu_item_id, req.quantity)
        .await?;
    Ok(Json(ApiResponse::success(item)))
}

async fn set_served(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path((tab_id, item_id)): Path<(TabId, TabItemId)>,
    payload: Result<Json<ServedRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<TabItem>>> {
    let req = json_body(payload)?;
    let item = state
        .tabs
        .set_item_served(&user, tab_id, item_id, req.served)
        .await?;
    Ok(Json(ApiResponse::success(item)))
}

async fn close_tab(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(tab_id): Path<TabId>,
    payload: Result<Json<CloseTabRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Tab>>> {
    let req = json_body(payload)?;
    let payment_method_id = validate_id(req.payment_method_id, "payment_method_id")?;

    let tab = state.tabs.close_tab(&user, tab_id, payment_method_id).await?;
    Ok(Json(ApiResponse::success(tab)))
}
