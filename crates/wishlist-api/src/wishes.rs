use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use wishlist_core::model::{NewWish, WishPatch};
use wishlist_core::{Stage, WishId, fulfillment, wishes};
use wishlist_types::api::{Claims, CreateWishRequest, PageQuery, UpdateWishRequest, WishIdResponse};
use wishlist_types::models::{User, Wish};

use crate::auth::AppState;
use crate::error::ApiResult;
use crate::{page, run_blocking, validate};

pub async fn get_wish(
    State(state): State<AppState>,
    Path(id): Path<WishId>,
) -> ApiResult<Json<Wish>> {
    let wish = run_blocking(&state, move |state| wishes::read_wish(&state.db, id)).await?;
    Ok(Json(wish.view()))
}

pub async fn create_wish(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateWishRequest>,
) -> ApiResult<impl IntoResponse> {
    validate::optional_url("link", &req.link)?;
    validate::optional_url("image", &req.image)?;

    let new = NewWish {
        name: req.name,
        description: req.description,
        link: req.link,
        image: req.image,
    };
    let wish = run_blocking(&state, move |state| {
        wishes::create_wish(&state.db, &claims.sub, new, Utc::now())
    })
    .await?;

    Ok((StatusCode::CREATED, Json(wish.view())))
}

pub async fn update_wish(
    State(state): State<AppState>,
    Path(id): Path<WishId>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateWishRequest>,
) -> ApiResult<Json<Wish>> {
    if let Some(link) = &req.link {
        validate::optional_url("link", link)?;
    }
    if let Some(image) = &req.image {
        validate::optional_url("image", image)?;
    }

    let patch = WishPatch {
        name: req.name,
        description: req.description,
        link: req.link,
        image: req.image,
    };
    let wish = run_blocking(&state, move |state| {
        wishes::update_wish(&state.db, &claims.sub, id, patch)
    })
    .await?;
    Ok(Json(wish.view()))
}

pub async fn delete_wish(
    State(state): State<AppState>,
    Path(id): Path<WishId>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<WishIdResponse>> {
    let id = run_blocking(&state, move |state| wishes::delete_wish(&state.db, &claims.sub, id)).await?;
    Ok(Json(WishIdResponse { id }))
}

// -- Fulfillment --

pub async fn express_interest(
    State(state): State<AppState>,
    Path(id): Path<WishId>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let wish = run_blocking(&state, move |state| {
        fulfillment::express_interest(&state.db, state.policy, &claims.sub, id)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(WishIdResponse { id: wish.id })))
}

pub async fn claim(
    State(state): State<AppState>,
    Path(id): Path<WishId>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<WishIdResponse>> {
    let id = run_blocking(&state, move |state| fulfillment::claim(&state.db, &claims.sub, id)).await?;
    Ok(Json(WishIdResponse { id }))
}

pub async fn accept_claim(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(WishId, String)>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<WishIdResponse>> {
    let wish = run_blocking(&state, move |state| {
        fulfillment::accept_claim(&state.db, &claims.sub, id, &user_id)
    })
    .await?;
    Ok(Json(WishIdResponse { id: wish.id }))
}

pub async fn reject_claim(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(WishId, String)>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<WishIdResponse>> {
    let wish = run_blocking(&state, move |state| {
        fulfillment::reject_claim(&state.db, &claims.sub, id, &user_id)
    })
    .await?;
    Ok(Json(WishIdResponse { id: wish.id }))
}

pub async fn list_claimers(
    state: State<AppState>,
    id: Path<WishId>,
    claims: Extension<Claims>,
    query: Query<PageQuery>,
) -> ApiResult<Json<Vec<User>>> {
    list_stage(state, id, claims, query, Stage::Claimers).await
}

pub async fn list_fulfillers(
    state: State<AppState>,
    id: Path<WishId>,
    claims: Extension<Claims>,
    query: Query<PageQuery>,
) -> ApiResult<Json<Vec<User>>> {
    list_stage(state, id, claims, query, Stage::Fulfillers).await
}

async fn list_stage(
    State(state): State<AppState>,
    Path(id): Path<WishId>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<PageQuery>,
    stage: Stage,
) -> ApiResult<Json<Vec<User>>> {
    let page = page(&query)?;
    let members = run_blocking(&state, move |state| {
        fulfillment::list_stage_members(&state.db, &claims.sub, id, stage, page)
    })
    .await?;
    Ok(Json(members.iter().map(|u| u.view()).collect()))
}
