//! Blog post endpoints.
//!
//! Reads are public but visibility-capped: callers without a staff role
//! only ever see published posts, regardless of the filters they pass.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    api::models::{
        pagination::{PaginatedResponse, Pagination},
        posts::{PostCreate, PostListFilter, PostResponse, PostUpdate, SearchQuery},
        users::CurrentUser,
    },
    auth::{policy, MaybeUser},
    db::{
        errors::DbError,
        handlers::{posts::PostFilter, Posts, Repository},
        models::posts::{PostCreateDBRequest, PostDBResponse, PostUpdateDBRequest},
    },
    errors::{Error, Result},
    types::PostId,
    AppState,
};

const SORT_COLUMNS: &[&str] = &["created_at", "updated_at", "publish_date", "title", "view_count"];

fn build_filter(pagination: &Pagination, query: PostListFilter, user: Option<&CurrentUser>) -> PostFilter {
    let mut filter = PostFilter::new(pagination.offset(), pagination.limit());
    filter.sort_column = pagination.sort_column(SORT_COLUMNS, "created_at");
    filter.sort_order = pagination.sort_order();
    filter.search = query.search;
    filter.category = query.category;
    filter.tag = query.tag;
    filter.author_id = query.author;
    // Non-staff callers are forced onto published rows no matter what
    // publication filter they asked for.
    filter.is_published = if policy::can_view_unpublished(user) {
        query.published
    } else {
        Some(true)
    };
    filter
}

/// List posts
#[utoipa::path(
    get,
    path = "/posts",
    tag = "posts",
    params(Pagination, PostListFilter),
    responses(
        (status = 200, description = "Paginated posts", body = PaginatedResponse<PostResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_posts(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(pagination): Query<Pagination>,
    Query(query): Query<PostListFilter>,
) -> Result<Json<PaginatedResponse<PostResponse>>> {
    let filter = build_filter(&pagination, query, user.as_ref());

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut posts = Posts::new(&mut conn);

    let total = posts.count(&filter).await?;
    let items: Vec<PostResponse> = posts.list(&filter).await?.into_iter().map(PostResponse::from).collect();

    Ok(Json(PaginatedResponse::new(items, total, &pagination)))
}

/// Full-text search over posts
#[utoipa::path(
    get,
    path = "/posts/search",
    tag = "posts",
    params(Pagination, SearchQuery),
    responses(
        (status = 200, description = "Matching posts", body = PaginatedResponse<PostResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn search_posts(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(pagination): Query<Pagination>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<PaginatedResponse<PostResponse>>> {
    let filter = build_filter(
        &pagination,
        PostListFilter {
            search: Some(query.q),
            ..Default::default()
        },
        user.as_ref(),
    );

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut posts = Posts::new(&mut conn);

    let total = posts.count(&filter).await?;
    let items: Vec<PostResponse> = posts.list(&filter).await?.into_iter().map(PostResponse::from).collect();

    Ok(Json(PaginatedResponse::new(items, total, &pagination)))
}

/// Distinct categories across published posts
#[utoipa::path(
    get,
    path = "/posts/categories",
    tag = "posts",
    responses((status = 200, description = "Category names", body = Vec<String>))
)]
#[tracing::instrument(skip_all)]
pub async fn post_categories(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut posts = Posts::new(&mut conn);

    Ok(Json(posts.categories().await?))
}

/// Distinct tags across published posts
#[utoipa::path(
    get,
    path = "/posts/tags",
    tag = "posts",
    responses((status = 200, description = "Tag names", body = Vec<String>))
)]
#[tracing::instrument(skip_all)]
pub async fn post_tags(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut posts = Posts::new(&mut conn);

    Ok(Json(posts.tags().await?))
}

/// Get a post by slug
#[utoipa::path(
    get,
    path = "/posts/{slug}",
    tag = "posts",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Post details", body = PostResponse),
        (status = 404, description = "Post not found or unpublished"),
    )
)]
#[tracing::instrument(skip_all, fields(slug = %slug))]
pub async fn get_post(State(state): State<AppState>, MaybeUser(user): MaybeUser, Path(slug): Path<String>) -> Result<Json<PostResponse>> {
    let staff = policy::can_view_unpublished(user.as_ref());

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut posts = Posts::new(&mut conn);

    // Unpublished posts answer 404 rather than 403 so their existence
    // does not leak to anonymous callers.
    let post = posts.get_by_slug(&slug, !staff).await?.ok_or_else(|| Error::NotFound {
        resource: "Post".to_string(),
    })?;

    // Staff previews do not count as views.
    if !staff {
        posts.increment_view_count(post.id).await?;
    }

    Ok(Json(PostResponse::from(post)))
}

/// Create a post
#[utoipa::path(
    post,
    path = "/posts",
    tag = "posts",
    request_body = PostCreate,
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 400, description = "Invalid input or duplicate title"),
        (status = 403, description = "Editor or admin role required"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_post(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<PostCreate>,
) -> Result<(StatusCode, Json<PostResponse>)> {
    policy::require_staff(&current_user)?;
    request.validate()?;

    let slug = Posts::slug_for(&request.title);

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut posts = Posts::new(&mut conn);

    let post = posts
        .create(&PostCreateDBRequest {
            title: request.title,
            slug,
            excerpt: request.excerpt,
            content: request.content,
            author_id: current_user.id,
            publish_date: request.publish_date,
            category: request.category,
            tags: request.tags,
            image_url: request.image_url,
            is_published: request.is_published,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

/// Look up a post for a mutation: by slug, or by id when the selector
/// parses as one. Unpublished rows are included because the permission
/// check decides access, not visibility.
async fn find_post(posts: &mut Posts<'_>, selector: &str) -> Result<PostDBResponse> {
    let found = match selector.parse::<PostId>() {
        Ok(id) => posts.get_by_id(id).await?,
        Err(_) => posts.get_by_slug(selector, false).await?,
    };
    found.ok_or_else(|| Error::NotFound {
        resource: "Post".to_string(),
    })
}

/// Update a post
#[utoipa::path(
    put,
    path = "/posts/{selector}",
    tag = "posts",
    params(("selector" = String, Path, description = "Post slug or ID")),
    request_body = PostUpdate,
    responses(
        (status = 200, description = "Updated post", body = PostResponse),
        (status = 400, description = "Invalid input or duplicate title"),
        (status = 403, description = "Not the author and not staff"),
        (status = 404, description = "Post not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_post(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(selector): Path<String>,
    Json(request): Json<PostUpdate>,
) -> Result<Json<PostResponse>> {
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut posts = Posts::new(&mut conn);

    let existing = find_post(&mut posts, &selector).await?;

    if !policy::can_modify_content(&current_user, existing.author_id) {
        return Err(Error::Forbidden {
            message: "You do not have permission to modify this post".to_string(),
        });
    }

    // A new title means a new slug; the unique constraint catches
    // collisions with other posts.
    let slug = request
        .title
        .as_deref()
        .filter(|title| *title != existing.title)
        .map(Posts::slug_for);

    let updated = posts
        .update(
            existing.id,
            &PostUpdateDBRequest {
                title: request.title,
                slug,
                excerpt: request.excerpt,
                content: request.content,
                publish_date: request.publish_date,
                category: request.category,
                tags: request.tags,
                image_url: request.image_url,
                is_published: request.is_published,
            },
        )
        .await?;

    Ok(Json(PostResponse::from(updated)))
}

/// Delete a post
#[utoipa::path(
    delete,
    path = "/posts/{selector}",
    tag = "posts",
    params(("selector" = String, Path, description = "Post slug or ID")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 403, description = "Not the author and not staff"),
        (status = 404, description = "Post not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_post(State(state): State<AppState>, current_user: CurrentUser, Path(selector): Path<String>) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut posts = Posts::new(&mut conn);

    let existing = find_post(&mut posts, &selector).await?;

    if !policy::can_modify_content(&current_user, existing.author_id) {
        return Err(Error::Forbidden {
            message: "You do not have permission to delete this post".to_string(),
        });
    }

    posts.delete(existing.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use uuid::Uuid;

    fn caller(role: Role) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            username: "user".to_string(),
            role,
        }
    }

    fn asking_for_unpublished() -> PostListFilter {
        PostListFilter {
            published: Some(false),
            ..Default::default()
        }
    }

    #[test]
    fn anonymous_listing_is_forced_to_published() {
        let filter = build_filter(&Pagination::default(), asking_for_unpublished(), None);
        assert_eq!(filter.is_published, Some(true));
    }

    #[test]
    fn viewer_listing_is_forced_to_published() {
        let user = caller(Role::Viewer);
        let filter = build_filter(&Pagination::default(), asking_for_unpublished(), Some(&user));
        assert_eq!(filter.is_published, Some(true));
    }

    #[test]
    fn staff_listing_keeps_requested_publication_filter() {
        let editor = caller(Role::Editor);
        let filter = build_filter(&Pagination::default(), asking_for_unpublished(), Some(&editor));
        assert_eq!(filter.is_published, Some(false));

        let admin = caller(Role::Admin);
        let filter = build_filter(&Pagination::default(), PostListFilter::default(), Some(&admin));
        assert_eq!(filter.is_published, None);
    }

    #[test]
    fn sort_column_is_resolved_against_the_allow_list() {
        let pagination = Pagination {
            sort: Some("view_count".to_string()),
            ..Default::default()
        };
        let filter = build_filter(&pagination, PostListFilter::default(), None);
        assert_eq!(filter.sort_column, "view_count");

        let pagination = Pagination {
            sort: Some("author_id; DROP TABLE posts".to_string()),
            ..Default::default()
        };
        let filter = build_filter(&pagination, PostListFilter::default(), None);
        assert_eq!(filter.sort_column, "created_at");
    }
}
