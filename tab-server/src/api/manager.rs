//! 经理接口
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/manager/status | GET | 是否为经理及所管理的餐厅 |
//! | /api/manager/tabs | GET | 所有管理餐厅的未结账单 |
//! | /api/manager/restaurants/{id}/tabs | GET | 单个餐厅的未结账单 (最早的在前) |

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use shared::error::{ApiResponse, AppResult};
use shared::models::{ManagerStatus, RestaurantId, RestaurantTabs};

use crate::auth::CurrentUser;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/manager", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/status", get(status))
        .route("/tabs", get(list_tabs))
        .route("/restaurants/{restaurant_id}/tabs", get(list_restaurant_tabs))
}

async fn status(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<ManagerStatus>>> {
    let status = state.tabs.manager_status(&user).await?;
    Ok(Json(ApiResponse::success(status)))
}

async fn list_tabs(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<RestaurantTabs>>>> {
    let groups = state.tabs.list_manager_tabs(&user).await?;
    Ok(Json(ApiResponse::success(groups)))
}

async fn list_restaurant_tabs(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(restaurant_id): Path<RestaurantId>,
) -> AppResult<Json<ApiResponse<RestaurantTabs>>> {
    let group = state
        .tabs
        .list_restaurant_open_tabs(&user, restaurant_id)
        .await?;
    Ok(Json(ApiResponse::success(group)))
}
