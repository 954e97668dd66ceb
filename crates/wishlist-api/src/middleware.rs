use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::auth::{AppState, decode_token, subject_exists};
use crate::error::{ApiError, TokenError};
use crate::run_blocking;

/// Extract and validate the bearer token, then make sure its subject still
/// exists. The decoded claims are handed to handlers as an extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(TokenError::MissingBearer)?;

    let claims = decode_token(&state.jwt_secret, token)?;

    let check = claims.clone();
    run_blocking(&state, move |state| subject_exists(&state.db, &check)).await?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
