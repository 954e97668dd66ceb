use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use wishlist_core::friendship;
use wishlist_types::api::{Claims, PageQuery, UserIdResponse};
use wishlist_types::models::User;

use crate::auth::AppState;
use crate::error::ApiResult;
use crate::{page, run_blocking};

pub async fn list_friends(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Vec<User>>> {
    let page = page(&query)?;
    let friends = run_blocking(&state, move |state| {
        friendship::list_friends(&state.db, &claims.sub, &id, page)
    })
    .await?;
    Ok(Json(friends.iter().map(|u| u.view()).collect()))
}

pub async fn list_friend_requests(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Vec<User>>> {
    let page = page(&query)?;
    let requesters = run_blocking(&state, move |state| {
        friendship::list_friend_requests(&state.db, &claims.sub, &id, page)
    })
    .await?;
    Ok(Json(requesters.iter().map(|u| u.view()).collect()))
}

pub async fn send_request(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let requestee = run_blocking(&state, move |state| {
        friendship::send_request(&state.db, &claims.sub, &user_id)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(UserIdResponse { id: requestee.id })))
}

pub async fn withdraw_request(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<UserIdResponse>> {
    let requestee = run_blocking(&state, move |state| {
        friendship::withdraw_request(&state.db, &claims.sub, &user_id)
    })
    .await?;
    Ok(Json(UserIdResponse { id: requestee.id }))
}

pub async fn accept_request(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<UserIdResponse>> {
    let requester = run_blocking(&state, move |state| {
        friendship::accept_request(&state.db, &claims.sub, &user_id)
    })
    .await?;
    Ok(Json(UserIdResponse { id: requester.id }))
}

pub async fn reject_request(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<UserIdResponse>> {
    let requester = run_blocking(&state, move |state| {
        friendship::reject_request(&state.db, &claims.sub, &user_id)
    })
    .await?;
    Ok(Json(UserIdResponse { id: requester.id }))
}
