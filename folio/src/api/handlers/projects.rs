//! Portfolio project endpoints. Same visibility and ownership rules as
//! posts, with a curated featured list on top.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    api::models::{
        pagination::{PaginatedResponse, Pagination},
        projects::{ProjectCreate, ProjectListFilter, ProjectResponse, ProjectUpdate},
        users::CurrentUser,
    },
    auth::{policy, MaybeUser},
    db::{
        errors::DbError,
        handlers::{projects::ProjectFilter, Projects, Repository},
        models::projects::{ProjectCreateDBRequest, ProjectDBResponse, ProjectUpdateDBRequest},
    },
    errors::{Error, Result},
    types::ProjectId,
    AppState,
};

const SORT_COLUMNS: &[&str] = &["created_at", "updated_at", "title", "start_date", "end_date", "view_count", "sort_order"];

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct FeaturedQuery {
    /// Maximum number of featured projects to return
    pub limit: Option<i64>,
}

fn build_filter(pagination: &Pagination, query: ProjectListFilter, user: Option<&CurrentUser>) -> ProjectFilter {
    let mut filter = ProjectFilter::new(pagination.offset(), pagination.limit());
    filter.sort_column = pagination.sort_column(SORT_COLUMNS, "created_at");
    filter.sort_order = pagination.sort_order();
    filter.search = query.search;
    filter.category = query.category;
    filter.tag = query.tag;
    filter.technology = query.technology;
    filter.status = query.status;
    filter.is_featured = query.featured;
    filter.is_published = if policy::can_view_unpublished(user) {
        query.published
    } else {
        Some(true)
    };
    filter
}

/// List projects
#[utoipa::path(
    get,
    path = "/projects",
    tag = "projects",
    params(Pagination, ProjectListFilter),
    responses(
        (status = 200, description = "Paginated projects", body = PaginatedResponse<ProjectResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_projects(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(pagination): Query<Pagination>,
    Query(query): Query<ProjectListFilter>,
) -> Result<Json<PaginatedResponse<ProjectResponse>>> {
    let filter = build_filter(&pagination, query, user.as_ref());

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut projects = Projects::new(&mut conn);

    let total = projects.count(&filter).await?;
    let items: Vec<ProjectResponse> = projects.list(&filter).await?.into_iter().map(ProjectResponse::from).collect();

    Ok(Json(PaginatedResponse::new(items, total, &pagination)))
}

/// Published featured projects in curated order
#[utoipa::path(
    get,
    path = "/projects/featured",
    tag = "projects",
    params(FeaturedQuery),
    responses((status = 200, description = "Featured projects", body = Vec<ProjectResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn featured_projects(State(state): State<AppState>, Query(query): Query<FeaturedQuery>) -> Result<Json<Vec<ProjectResponse>>> {
    let limit = query.limit.unwrap_or(6).clamp(1, 50);

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut projects = Projects::new(&mut conn);

    let items: Vec<ProjectResponse> = projects.featured(limit).await?.into_iter().map(ProjectResponse::from).collect();

    Ok(Json(items))
}

/// Distinct categories across published projects
#[utoipa::path(
    get,
    path = "/projects/categories",
    tag = "projects",
    responses((status = 200, description = "Category names", body = Vec<String>))
)]
#[tracing::instrument(skip_all)]
pub async fn project_categories(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut projects = Projects::new(&mut conn);

    Ok(Json(projects.categories().await?))
}

/// Distinct tags across published projects
#[utoipa::path(
    get,
    path = "/projects/tags",
    tag = "projects",
    responses((status = 200, description = "Tag names", body = Vec<String>))
)]
#[tracing::instrument(skip_all)]
pub async fn project_tags(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut projects = Projects::new(&mut conn);

    Ok(Json(projects.tags().await?))
}

/// Distinct technologies across published projects
#[utoipa::path(
    get,
    path = "/projects/technologies",
    tag = "projects",
    responses((status = 200, description = "Technology names", body = Vec<String>))
)]
#[tracing::instrument(skip_all)]
pub async fn project_technologies(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut projects = Projects::new(&mut conn);

    Ok(Json(projects.technologies().await?))
}

/// Get a project by slug
#[utoipa::path(
    get,
    path = "/projects/{slug}",
    tag = "projects",
    params(("slug" = String, Path, description = "Project slug")),
    responses(
        (status = 200, description = "Project details", body = ProjectResponse),
        (status = 404, description = "Project not found or unpublished"),
    )
)]
#[tracing::instrument(skip_all, fields(slug = %slug))]
pub async fn get_project(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(slug): Path<String>,
) -> Result<Json<ProjectResponse>> {
    let staff = policy::can_view_unpublished(user.as_ref());

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut projects = Projects::new(&mut conn);

    let project = projects.get_by_slug(&slug, !staff).await?.ok_or_else(|| Error::NotFound {
        resource: "Project".to_string(),
    })?;

    if !staff {
        projects.increment_view_count(project.id).await?;
    }

    Ok(Json(ProjectResponse::from(project)))
}

/// Create a project
#[utoipa::path(
    post,
    path = "/projects",
    tag = "projects",
    request_body = ProjectCreate,
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Invalid input or duplicate title"),
        (status = 403, description = "Editor or admin role required"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_project(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ProjectCreate>,
) -> Result<(StatusCode, Json<ProjectResponse>)> {
    policy::require_staff(&current_user)?;
    request.validate()?;

    let slug = Projects::slug_for(&request.title);

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut projects = Projects::new(&mut conn);

    let project = projects
        .create(&ProjectCreateDBRequest {
            title: request.title,
            slug,
            description: request.description,
            content: request.content,
            author_id: current_user.id,
            category: request.category,
            tags: request.tags,
            technologies: request.technologies,
            image_url: request.image_url,
            gallery: request.gallery,
            status: request.status,
            priority: request.priority,
            start_date: request.start_date,
            end_date: request.end_date,
            project_url: request.project_url,
            github_url: request.github_url,
            demo_url: request.demo_url,
            client: request.client,
            budget: request.budget,
            is_published: request.is_published,
            is_featured: request.is_featured,
            sort_order: request.sort_order,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ProjectResponse::from(project))))
}

/// Look up a project for a mutation, by slug or id
async fn find_project(projects: &mut Projects<'_>, selector: &str) -> Result<ProjectDBResponse> {
    let found = match selector.parse::<ProjectId>() {
        Ok(id) => projects.get_by_id(id).await?,
        Err(_) => projects.get_by_slug(selector, false).await?,
    };
    found.ok_or_else(|| Error::NotFound {
        resource: "Project".to_string(),
    })
}

/// Update a project
#[utoipa::path(
    put,
    path = "/projects/{selector}",
    tag = "projects",
    params(("selector" = String, Path, description = "Project slug or ID")),
    request_body = ProjectUpdate,
    responses(
        (status = 200, description = "Updated project", body = ProjectResponse),
        (status = 400, description = "Invalid input or duplicate title"),
        (status = 403, description = "Not the author and not staff"),
        (status = 404, description = "Project not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_project(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(selector): Path<String>,
    Json(request): Json<ProjectUpdate>,
) -> Result<Json<ProjectResponse>> {
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut projects = Projects::new(&mut conn);

    let existing = find_project(&mut projects, &selector).await?;

    if !policy::can_modify_content(&current_user, existing.author_id) {
        return Err(Error::Forbidden {
            message: "You do not have permission to modify this project".to_string(),
        });
    }

    let slug = request
        .title
        .as_deref()
        .filter(|title| *title != existing.title)
        .map(Projects::slug_for);

    let updated = projects
        .update(
            existing.id,
            &ProjectUpdateDBRequest {
                title: request.title,
                slug,
                description: request.description,
                content: request.content,
                category: request.category,
                tags: request.tags,
                technologies: request.technologies,
                image_url: request.image_url,
                gallery: request.gallery,
                status: request.status,
                priority: request.priority,
                start_date: request.start_date,
                end_date: request.end_date,
                project_url: request.project_url,
                github_url: request.github_url,
                demo_url: request.demo_url,
                client: request.client,
                budget: request.budget,
                is_published: request.is_published,
                is_featured: request.is_featured,
                sort_order: request.sort_order,
            },
        )
        .await?;

    Ok(Json(ProjectResponse::from(updated)))
}

/// Delete a project
#[utoipa::path(
    delete,
    path = "/projects/{selector}",
    tag = "projects",
    params(("selector" = String, Path, description = "Project slug or ID")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 403, description = "Not the author and not staff"),
        (status = 404, description = "Project not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_project(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(selector): Path<String>,
) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut projects = Projects::new(&mut conn);

    let existing = find_project(&mut projects, &selector).await?;

    if !policy::can_modify_content(&current_user, existing.author_id) {
        return Err(Error::Forbidden {
            message: "You do not have permission to delete this project".to_string(),
        });
    }

    projects.delete(existing.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
