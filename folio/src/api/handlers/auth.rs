//! Authentication endpoints: register, login, token refresh, and
//! self-service profile management.

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::{
    api::models::{
        auth::{AuthResponse, LoginRequest, PasswordChange, ProfileUpdate, RefreshRequest, RefreshResponse, RegisterRequest},
        users::{CurrentUser, Role, UserResponse},
    },
    auth::{password, token},
    config::Config,
    db::{
        errors::DbError,
        handlers::{Repository, Users},
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    errors::{Error, Result},
    AppState,
};

/// Enforce the configured password length bounds.
///
/// Length rules live in config rather than on the request type, so they
/// are checked here instead of through the validator derive.
fn validate_password(password: &str, config: &Config) -> Result<()> {
    let rules = &config.auth.password;
    if password.len() < rules.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", rules.min_length),
        });
    }
    if password.len() > rules.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be no more than {} characters", rules.max_length),
        });
    }
    Ok(())
}

/// Hash a password on a blocking thread to keep the runtime responsive
async fn hash_password(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || password::hash_string(&password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })?
}

async fn verify_password(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || password::verify_string(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })?
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid input or email/username already taken"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(State(state): State<AppState>, Json(request): Json<RegisterRequest>) -> Result<(StatusCode, Json<AuthResponse>)> {
    request.validate()?;
    validate_password(&request.password, &state.config)?;

    let password_hash = hash_password(request.password).await?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut users = Users::new(&mut conn);

    // New accounts always start as viewers. Roles are granted by an admin
    // afterwards through the users endpoints.
    let user = users
        .create(&UserCreateDBRequest {
            email: request.email,
            username: request.username,
            password_hash,
            role: Role::Viewer,
            first_name: request.first_name,
            last_name: request.last_name,
        })
        .await?;

    let access_token = token::create_access_token(user.id, &user.email, user.role, &state.config)?;
    let refresh_token = token::create_refresh_token(user.id, &state.config)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserResponse::from(user),
            access_token,
            refresh_token,
        }),
    ))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = AuthResponse),
        (status = 401, description = "Invalid credentials or deactivated account"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<AuthResponse>> {
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut users = Users::new(&mut conn);

    // Unknown email and wrong password answer identically so the response
    // does not reveal which accounts exist.
    let user = users.get_by_email(&request.email).await?.ok_or_else(|| Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    })?;

    if !verify_password(request.password, user.password_hash.clone()).await? {
        return Err(Error::Unauthenticated {
            message: Some("Invalid email or password".to_string()),
        });
    }

    if !user.is_active {
        return Err(Error::Unauthenticated {
            message: Some("Account is deactivated".to_string()),
        });
    }

    users.record_login(user.id).await?;

    let access_token = token::create_access_token(user.id, &user.email, user.role, &state.config)?;
    let refresh_token = token::create_refresh_token(user.id, &state.config)?;

    Ok(Json(AuthResponse {
        user: UserResponse::from(user),
        access_token,
        refresh_token,
    }))
}

/// Exchange a refresh token for a fresh access token
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 401, description = "Invalid or expired refresh token"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn refresh(State(state): State<AppState>, Json(request): Json<RefreshRequest>) -> Result<Json<RefreshResponse>> {
    let claims = token::verify_refresh_token(&request.refresh_token, &state.config)?;

    // Re-check the account: a refresh token must stop working once the
    // user is deleted or deactivated, even before it expires.
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut users = Users::new(&mut conn);

    let user = users.get_by_id(claims.sub).await?.ok_or_else(|| Error::Unauthenticated {
        message: Some("User no longer exists".to_string()),
    })?;

    if !user.is_active {
        return Err(Error::Unauthenticated {
            message: Some("Account is deactivated".to_string()),
        });
    }

    let access_token = token::create_access_token(user.id, &user.email, user.role, &state.config)?;

    Ok(Json(RefreshResponse {
        user: UserResponse::from(user),
        access_token,
    }))
}

/// Current user's profile
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn me(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<UserResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut users = Users::new(&mut conn);

    match users.get_by_id(current_user.id).await? {
        Some(user) => Ok(Json(UserResponse::from(user))),
        None => Err(Error::NotFound {
            resource: "User".to_string(),
        }),
    }
}

/// Update the current user's profile
#[utoipa::path(
    put,
    path = "/auth/me",
    tag = "auth",
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Invalid input or email already taken"),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_me(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ProfileUpdate>,
) -> Result<Json<UserResponse>> {
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut users = Users::new(&mut conn);

    let updated = users
        .update(
            current_user.id,
            &UserUpdateDBRequest {
                email: request.email,
                username: None,
                password_hash: None,
                role: None,
                is_active: None,
                first_name: request.first_name,
                last_name: request.last_name,
            },
        )
        .await?;

    Ok(Json(UserResponse::from(updated)))
}

/// Change the current user's password
#[utoipa::path(
    put,
    path = "/auth/me/password",
    tag = "auth",
    request_body = PasswordChange,
    responses(
        (status = 200, description = "Password changed", body = UserResponse),
        (status = 400, description = "New password does not meet requirements"),
        (status = 401, description = "Current password is wrong"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn change_password(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<PasswordChange>,
) -> Result<Json<UserResponse>> {
    request.validate()?;
    validate_password(&request.new_password, &state.config)?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut users = Users::new(&mut conn);

    let user = users.get_by_id(current_user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
    })?;

    if !verify_password(request.current_password, user.password_hash).await? {
        return Err(Error::Unauthenticated {
            message: Some("Current password is incorrect".to_string()),
        });
    }

    let password_hash = hash_password(request.new_password).await?;

    let updated = users
        .update(
            current_user.id,
            &UserUpdateDBRequest {
                email: None,
                username: None,
                password_hash: Some(password_hash),
                role: None,
                is_active: None,
                first_name: None,
                last_name: None,
            },
        )
        .await?;

    Ok(Json(UserResponse::from(updated)))
}
