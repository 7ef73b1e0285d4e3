//! User endpoints. Account management requires the admin role; the
//! profile lookup is public and the stats endpoint is self-or-admin.
//! Self-service profile changes live under the auth endpoints instead.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    api::models::{
        pagination::{PaginatedResponse, Pagination},
        users::{CurrentUser, Role, UserCreate, UserListFilter, UserResponse, UserStats, UserUpdate},
    },
    auth::{password, policy},
    db::{
        errors::DbError,
        handlers::{users::UserFilter, Repository, Users},
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    errors::{Error, Result},
    types::UserId,
    AppState,
};

const SORT_COLUMNS: &[&str] = &["created_at", "updated_at", "email", "username", "role", "last_login_at"];

fn build_filter(pagination: &Pagination, query: UserListFilter) -> UserFilter {
    let mut filter = UserFilter::new(pagination.offset(), pagination.limit());
    filter.sort_column = pagination.sort_column(SORT_COLUMNS, "created_at");
    filter.sort_order = pagination.sort_order();
    filter.role = query.role;
    filter.is_active = query.is_active;
    filter.search = query.search;
    filter
}

/// List users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    params(Pagination, UserListFilter),
    responses(
        (status = 200, description = "Paginated users", body = PaginatedResponse<UserResponse>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
    Query(query): Query<UserListFilter>,
) -> Result<Json<PaginatedResponse<UserResponse>>> {
    policy::require_role(&current_user, &[Role::Admin])?;

    let filter = build_filter(&pagination, query);

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut users = Users::new(&mut conn);

    let total = users.count(&filter).await?;
    let items: Vec<UserResponse> = users.list(&filter).await?.into_iter().map(UserResponse::from).collect();

    Ok(Json(PaginatedResponse::new(items, total, &pagination)))
}

/// Content stats for one user
#[utoipa::path(
    get,
    path = "/users/{user_id}/stats",
    tag = "users",
    params(("user_id" = uuid::Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Content counts and view tally", body = UserStats),
        (status = 403, description = "Only the user themselves or an admin may view stats"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn user_stats(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(user_id): Path<UserId>,
) -> Result<Json<UserStats>> {
    if current_user.id != user_id && current_user.role != Role::Admin {
        return Err(Error::Forbidden {
            message: "You may only view your own stats".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut users = Users::new(&mut conn);

    if users.get_by_id(user_id).await?.is_none() {
        return Err(Error::NotFound {
            resource: "User".to_string(),
        });
    }

    let stats = users.content_stats(user_id).await?;

    Ok(Json(UserStats {
        posts_count: stats.posts_count,
        projects_count: stats.projects_count,
        downloads_count: stats.downloads_count,
        total_views: stats.total_views,
    }))
}

/// Get a user's public profile by id
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    tag = "users",
    params(("user_id" = uuid::Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 404, description = "User not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_user(State(state): State<AppState>, Path(user_id): Path<UserId>) -> Result<Json<UserResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut users = Users::new(&mut conn);

    match users.get_by_id(user_id).await? {
        Some(user) => Ok(Json(UserResponse::from(user))),
        None => Err(Error::NotFound {
            resource: "User".to_string(),
        }),
    }
}

/// Create a user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = UserCreate,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid input or email/username already taken"),
        (status = 403, description = "Admin role required"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    policy::require_role(&current_user, &[Role::Admin])?;
    request.validate()?;

    let rules = &state.config.auth.password;
    if request.password.len() < rules.min_length || request.password.len() > rules.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be between {} and {} characters", rules.min_length, rules.max_length),
        });
    }

    let password = request.password;
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string(&password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut users = Users::new(&mut conn);

    let user = users
        .create(&UserCreateDBRequest {
            email: request.email,
            username: request.username,
            password_hash,
            role: request.role.unwrap_or(Role::Viewer),
            first_name: request.first_name,
            last_name: request.last_name,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Update a user
#[utoipa::path(
    put,
    path = "/users/{user_id}",
    tag = "users",
    params(("user_id" = uuid::Uuid, Path, description = "User ID")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Invalid input or self-demotion attempt"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(user_id): Path<UserId>,
    Json(request): Json<UserUpdate>,
) -> Result<Json<UserResponse>> {
    policy::require_role(&current_user, &[Role::Admin])?;
    request.validate()?;

    // Admins cannot lock themselves out. Another admin has to do it.
    if user_id == current_user.id {
        if matches!(request.role, Some(role) if role != Role::Admin) {
            return Err(Error::BadRequest {
                message: "You cannot change your own role".to_string(),
            });
        }
        if request.is_active == Some(false) {
            return Err(Error::BadRequest {
                message: "You cannot deactivate your own account".to_string(),
            });
        }
    }

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut users = Users::new(&mut conn);

    let updated = users
        .update(
            user_id,
            &UserUpdateDBRequest {
                email: request.email,
                username: request.username,
                password_hash: None,
                role: request.role,
                is_active: request.is_active,
                first_name: request.first_name,
                last_name: request.last_name,
            },
        )
        .await?;

    Ok(Json(UserResponse::from(updated)))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users/{user_id}",
    tag = "users",
    params(("user_id" = uuid::Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Self-deletion attempt"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_user(State(state): State<AppState>, current_user: CurrentUser, Path(user_id): Path<UserId>) -> Result<StatusCode> {
    policy::require_role(&current_user, &[Role::Admin])?;

    if user_id == current_user.id {
        return Err(Error::BadRequest {
            message: "You cannot delete your own account".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut users = Users::new(&mut conn);

    if users.delete(user_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound {
            resource: "User".to_string(),
        })
    }
}
