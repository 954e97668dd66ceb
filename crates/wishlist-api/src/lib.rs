pub mod auth;
pub mod error;
pub mod friends;
pub mod mail;
pub mod middleware;
pub mod users;
pub mod validate;
pub mod wishes;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tracing::error;

use wishlist_core::Page;
use wishlist_types::api::PageQuery;

use crate::auth::{AppState, AppStateInner};
use crate::error::{ApiError, ApiResult};

/// All routes, with bearer auth applied to the protected half. Transport
/// layers (CORS, tracing) are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}/wishes", get(users::list_user_wishes))
        .route("/wishes/{id}", get(wishes::get_wish))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/auth/verify", post(auth::verify_email))
        .route("/auth/code", post(auth::resend_code))
        .route(
            "/users/me",
            axum::routing::patch(users::update_me).delete(users::delete_me),
        )
        .route("/users/{id}/friends", get(friends::list_friends))
        .route("/users/{id}/friend-requests", get(friends::list_friend_requests))
        .route(
            "/friend-requests/{user_id}",
            post(friends::send_request).delete(friends::withdraw_request),
        )
        .route("/friend-requests/{user_id}/accept", post(friends::accept_request))
        .route("/friend-requests/{user_id}/reject", post(friends::reject_request))
        .route("/wishes", post(wishes::create_wish))
        .route(
            "/wishes/{id}",
            axum::routing::patch(wishes::update_wish).delete(wishes::delete_wish),
        )
        .route("/wishes/{id}/interest", post(wishes::express_interest))
        .route("/wishes/{id}/claim", post(wishes::claim))
        .route(
            "/wishes/{id}/claimers/{user_id}/accept",
            post(wishes::accept_claim),
        )
        .route(
            "/wishes/{id}/claimers/{user_id}/reject",
            post(wishes::reject_claim),
        )
        .route("/wishes/{id}/claimers", get(wishes::list_claimers))
        .route("/wishes/{id}/fulfillers", get(wishes::list_fulfillers))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Run synchronous store work off the async runtime.
pub(crate) async fn run_blocking<T, E, F>(state: &AppState, f: F) -> ApiResult<T>
where
    F: FnOnce(&AppStateInner) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })?
        .map_err(Into::into)
}

pub(crate) fn page(query: &PageQuery) -> ApiResult<Page> {
    Ok(Page::new(query.page, query.limit)?)
}
