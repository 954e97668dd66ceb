use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind as JwtErrorKind,
};
use tracing::{error, info};

use wishlist_core::model::NewUser;
use wishlist_core::{Entity, FulfillmentPolicy, RelationStore, WorkflowError, users, verification};
use wishlist_db::Database;
use wishlist_types::api::{
    Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UserIdResponse,
    VerifyEmailRequest,
};

use crate::error::{ApiError, ApiResult, TokenError};
use crate::mail::Mailer;
use crate::{run_blocking, validate};

pub const TOKEN_ISSUER: &str = "Wishlist";
pub const TOKEN_TTL_DAYS: i64 = 7;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub mailer: Mailer,
    pub policy: FulfillmentPolicy,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    validate::password(&req.password)?;
    validate::email(&req.email)?;

    let RegisterRequest {
        id,
        email,
        password,
        first_name,
        last_name,
    } = req;

    let (user, code) = run_blocking(&state, move |state| {
        let password_hash = hash_password(&password)?;
        let user = users::register(
            &state.db,
            NewUser {
                id,
                email,
                password_hash,
                first_name,
                last_name,
            },
        )?;
        let code = verification::issue_code(&state.db, &user.id, Utc::now())?;
        Ok::<_, ApiError>((user, code))
    })
    .await?;

    // The account stays even if delivery fails; the code can be re-sent.
    state
        .mailer
        .send_verification_code(&user.email, &user.id, &code)
        .await
        .map_err(ApiError::Mail)?;

    let token = create_token(&state.jwt_secret, &user.id, &user.email).map_err(ApiError::Internal)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.id,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = run_blocking(&state, move |state| {
        let user = state
            .db
            .find_user(&req.id)
            .map_err(WorkflowError::from)?
            .ok_or(ApiError::BadCredentials)?;

        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Stored hash unreadable: {}", e)))?;
        Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .map_err(|_| ApiError::BadCredentials)?;
        Ok::<_, ApiError>(user)
    })
    .await?;

    let token = create_token(&state.jwt_secret, &user.id, &user.email).map_err(ApiError::Internal)?;
    info!(user = %user.id, "login");

    Ok(Json(LoginResponse {
        user_id: user.id,
        token,
    }))
}

pub async fn verify_email(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<VerifyEmailRequest>,
) -> ApiResult<Json<UserIdResponse>> {
    let id = claims.sub.clone();
    run_blocking(&state, move |state| {
        verification::verify_email(&state.db, &claims.sub, &req.code, Utc::now())
    })
    .await?;

    Ok(Json(UserIdResponse { id }))
}

/// Issue a new code for an unverified user and mail it.
pub async fn resend_code(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let (user, code) = run_blocking(&state, move |state| {
        let user = users::read_user(&state.db, &claims.sub)?;
        if user.email_verified {
            return Err(WorkflowError::AlreadyVerified);
        }
        let code = verification::issue_code(&state.db, &user.id, Utc::now())?;
        Ok((user, code))
    })
    .await?;

    state
        .mailer
        .send_verification_code(&user.email, &user.id, &code)
        .await
        .map_err(ApiError::Mail)?;

    Ok((StatusCode::CREATED, Json(UserIdResponse { id: user.id })))
}

fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Password hashing failed: {}", e);
            ApiError::Internal(anyhow::anyhow!("Password hashing failed: {}", e))
        })
}

pub fn create_token(secret: &str, user_id: &str, email: &str) -> anyhow::Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        iss: TOKEN_ISSUER.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[TOKEN_ISSUER]);

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            JwtErrorKind::ExpiredSignature => TokenError::Expired,
            JwtErrorKind::InvalidToken
            | JwtErrorKind::Base64(_)
            | JwtErrorKind::Json(_)
            | JwtErrorKind::Utf8(_) => TokenError::Malformed,
            _ => TokenError::Invalid,
        })
}

/// `NotFound(User)` for a token whose subject has since been deleted.
pub(crate) fn subject_exists(db: &Database, claims: &Claims) -> Result<(), WorkflowError> {
    match db.find_user(&claims.sub)? {
        Some(_) => Ok(()),
        None => Err(WorkflowError::NotFound(Entity::User)),
    }
}
