use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};

use wishlist_core::model::UserPatch;
use wishlist_core::{users, wishes};
use wishlist_types::api::{Claims, PageQuery, UpdateUserRequest, UserIdResponse};
use wishlist_types::models::{User, Wish};

use crate::auth::AppState;
use crate::error::ApiResult;
use crate::{page, run_blocking};

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    let user = run_blocking(&state, move |state| users::read_user(&state.db, &id)).await?;
    Ok(Json(user.view()))
}

pub async fn list_user_wishes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Vec<Wish>>> {
    let page = page(&query)?;
    let list = run_blocking(&state, move |state| wishes::list_wishes(&state.db, &id, page)).await?;
    Ok(Json(list.iter().map(|w| w.view()).collect()))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    let patch = UserPatch {
        first_name: req.first_name,
        last_name: req.last_name,
    };
    let user =
        run_blocking(&state, move |state| users::update_user(&state.db, &claims.sub, patch)).await?;
    Ok(Json(user.view()))
}

pub async fn delete_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<UserIdResponse>> {
    let id = run_blocking(&state, move |state| users::delete_user(&state.db, &claims.sub)).await?;
    Ok(Json(UserIdResponse { id }))
}
