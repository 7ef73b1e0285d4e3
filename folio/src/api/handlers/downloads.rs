//! Download endpoints.
//!
//! Creation and file replacement arrive as multipart forms: one `file`
//! part plus text parts mirroring the JSON field names. The stored file is
//! cleaned up whenever anything after the upload fails, so a rejected
//! request never leaves an orphaned file behind.

use std::str::FromStr;

use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio_util::io::ReaderStream;
use validator::Validate;

use crate::{
    api::models::{
        downloads::{DownloadCreate, DownloadListFilter, DownloadResponse, DownloadUpdate},
        pagination::{PaginatedResponse, Pagination},
        users::CurrentUser,
    },
    auth::{policy, MaybeUser},
    config::UploadConfig,
    db::{
        errors::DbError,
        handlers::{downloads::DownloadFilter, Downloads, Repository},
        models::downloads::{DownloadCreateDBRequest, DownloadDBResponse, DownloadUpdateDBRequest},
    },
    errors::{Error, Result},
    types::DownloadId,
    uploads::{self, StoredFile},
    AppState,
};

const SORT_COLUMNS: &[&str] = &["created_at", "updated_at", "title", "download_count", "file_size", "sort_order"];

/// Text fields of the download multipart form, named after the JSON API
#[derive(Debug, Default)]
struct DownloadForm {
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    tags: Option<Vec<String>>,
    thumbnail_url: Option<String>,
    version: Option<String>,
    license: Option<String>,
    requirements: Option<String>,
    instructions: Option<String>,
    requires_auth: Option<bool>,
    price: Option<Decimal>,
    is_published: Option<bool>,
    is_featured: Option<bool>,
    sort_order: Option<i32>,
    publish_date: Option<NaiveDate>,
    expiry_date: Option<NaiveDate>,
}

fn parse_form_value<T: FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| Error::BadRequest {
        message: format!("Invalid value for '{name}': {e}"),
    })
}

impl DownloadForm {
    fn apply(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "title" => self.title = Some(value.to_string()),
            "description" => self.description = Some(value.to_string()),
            "category" => self.category = Some(value.to_string()),
            "tags" => {
                self.tags = Some(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string)
                        .collect(),
                )
            }
            "thumbnailUrl" => self.thumbnail_url = Some(value.to_string()),
            "version" => self.version = Some(value.to_string()),
            "license" => self.license = Some(value.to_string()),
            "requirements" => self.requirements = Some(value.to_string()),
            "instructions" => self.instructions = Some(value.to_string()),
            "requiresAuth" => self.requires_auth = Some(parse_form_value(name, value)?),
            "price" => self.price = Some(parse_form_value(name, value)?),
            "isPublished" => self.is_published = Some(parse_form_value(name, value)?),
            "isFeatured" => self.is_featured = Some(parse_form_value(name, value)?),
            "sortOrder" => self.sort_order = Some(parse_form_value(name, value)?),
            "publishDate" => self.publish_date = Some(parse_form_value(name, value)?),
            "expiryDate" => self.expiry_date = Some(parse_form_value(name, value)?),
            // Unknown fields are ignored for forward compatibility
            _ => {}
        }
        Ok(())
    }
}

/// Drain the multipart form into text fields plus at most one stored file.
///
/// Any failure removes the file that may already be on disk before the
/// error propagates.
async fn read_download_form(mut multipart: Multipart, config: &UploadConfig) -> Result<(DownloadForm, Option<StoredFile>)> {
    let mut form = DownloadForm::default();
    let mut stored: Option<StoredFile> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                discard(&mut stored).await;
                return Err(Error::BadRequest {
                    message: format!("Failed to read multipart data: {e}"),
                });
            }
        };

        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            if stored.is_some() {
                discard(&mut stored).await;
                return Err(Error::BadRequest {
                    message: "Only one file attachment is allowed".to_string(),
                });
            }
            match uploads::save_field(field, config).await {
                Ok(file) => stored = Some(file),
                Err(e) => {
                    discard(&mut stored).await;
                    return Err(e);
                }
            }
        } else {
            let value = match field.text().await {
                Ok(value) => value,
                Err(e) => {
                    discard(&mut stored).await;
                    return Err(Error::BadRequest {
                        message: format!("Failed to read field '{name}': {e}"),
                    });
                }
            };
            if let Err(e) = form.apply(&name, &value) {
                discard(&mut stored).await;
                return Err(e);
            }
        }
    }

    Ok((form, stored))
}

async fn discard(stored: &mut Option<StoredFile>) {
    if let Some(file) = stored.take() {
        uploads::remove_file(&file.path).await;
    }
}

fn build_filter(pagination: &Pagination, query: DownloadListFilter, user: Option<&CurrentUser>) -> DownloadFilter {
    let mut filter = DownloadFilter::new(pagination.offset(), pagination.limit());
    filter.sort_column = pagination.sort_column(SORT_COLUMNS, "created_at");
    filter.sort_order = pagination.sort_order();
    filter.search = query.search;
    filter.category = query.category;
    filter.tag = query.tag;
    filter.is_featured = query.featured;
    filter.is_published = if policy::can_view_unpublished(user) {
        query.published
    } else {
        Some(true)
    };
    filter
}

/// List downloads
#[utoipa::path(
    get,
    path = "/downloads",
    tag = "downloads",
    params(Pagination, DownloadListFilter),
    responses(
        (status = 200, description = "Paginated downloads", body = PaginatedResponse<DownloadResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_downloads(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(pagination): Query<Pagination>,
    Query(query): Query<DownloadListFilter>,
) -> Result<Json<PaginatedResponse<DownloadResponse>>> {
    let filter = build_filter(&pagination, query, user.as_ref());

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut downloads = Downloads::new(&mut conn);

    let total = downloads.count(&filter).await?;
    let items: Vec<DownloadResponse> = downloads.list(&filter).await?.into_iter().map(DownloadResponse::from).collect();

    Ok(Json(PaginatedResponse::new(items, total, &pagination)))
}

/// Distinct categories across published downloads
#[utoipa::path(
    get,
    path = "/downloads/categories",
    tag = "downloads",
    responses((status = 200, description = "Category names", body = Vec<String>))
)]
#[tracing::instrument(skip_all)]
pub async fn download_categories(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut downloads = Downloads::new(&mut conn);

    Ok(Json(downloads.categories().await?))
}

/// Distinct tags across published downloads
#[utoipa::path(
    get,
    path = "/downloads/tags",
    tag = "downloads",
    responses((status = 200, description = "Tag names", body = Vec<String>))
)]
#[tracing::instrument(skip_all)]
pub async fn download_tags(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut downloads = Downloads::new(&mut conn);

    Ok(Json(downloads.tags().await?))
}

/// Get download metadata by slug
#[utoipa::path(
    get,
    path = "/downloads/{slug}",
    tag = "downloads",
    params(("slug" = String, Path, description = "Download slug")),
    responses(
        (status = 200, description = "Download details", body = DownloadResponse),
        (status = 404, description = "Download not found or unpublished"),
    )
)]
#[tracing::instrument(skip_all, fields(slug = %slug))]
pub async fn get_download(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(slug): Path<String>,
) -> Result<Json<DownloadResponse>> {
    let staff = policy::can_view_unpublished(user.as_ref());

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut downloads = Downloads::new(&mut conn);

    // Metadata reads do not touch the download counter; only the file
    // fetch endpoint does.
    let download = downloads.get_by_slug(&slug, !staff).await?.ok_or_else(|| Error::NotFound {
        resource: "Download".to_string(),
    })?;

    Ok(Json(DownloadResponse::from(download)))
}

/// Fetch the stored file behind a download
#[utoipa::path(
    get,
    path = "/downloads/{slug}/file",
    tag = "downloads",
    params(("slug" = String, Path, description = "Download slug")),
    responses(
        (status = 200, description = "File contents as an attachment"),
        (status = 401, description = "Download requires authentication"),
        (status = 404, description = "Download not found, unpublished, or expired"),
    )
)]
#[tracing::instrument(skip_all, fields(slug = %slug))]
pub async fn fetch_download_file(State(state): State<AppState>, MaybeUser(user): MaybeUser, Path(slug): Path<String>) -> Result<Response> {
    let staff = policy::can_view_unpublished(user.as_ref());

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut downloads = Downloads::new(&mut conn);

    let download = downloads.get_by_slug(&slug, !staff).await?.ok_or_else(|| Error::NotFound {
        resource: "Download".to_string(),
    })?;

    if download.requires_auth && user.is_none() {
        return Err(Error::Unauthenticated {
            message: Some("This download requires authentication".to_string()),
        });
    }

    if download.is_expired(Utc::now().date_naive()) {
        return Err(Error::NotFound {
            resource: "Download".to_string(),
        });
    }

    let file = tokio::fs::File::open(&download.file_path).await.map_err(|e| {
        tracing::error!(path = %download.file_path, error = %e, "Stored download file is missing");
        Error::NotFound {
            resource: "Download".to_string(),
        }
    })?;

    downloads.increment_download_count(download.id).await?;

    let headers = [
        (header::CONTENT_TYPE, download.file_type.clone()),
        (header::CONTENT_LENGTH, download.file_size.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", download.file_name.replace('"', "")),
        ),
    ];

    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

/// Create a download (multipart, file required)
#[utoipa::path(
    post,
    path = "/downloads",
    tag = "downloads",
    request_body(content = DownloadCreate, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Download created", body = DownloadResponse),
        (status = 400, description = "Missing file, disallowed type, or duplicate title"),
        (status = 403, description = "Editor or admin role required"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_download(
    State(state): State<AppState>,
    current_user: CurrentUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<DownloadResponse>)> {
    policy::require_staff(&current_user)?;

    let (form, stored) = read_download_form(multipart, &state.config.uploads).await?;

    let Some(file) = stored else {
        return Err(Error::BadRequest {
            message: "A file attachment is required".to_string(),
        });
    };

    // Everything past this point owns a file on disk; failures must
    // remove it before returning.
    let result = persist_new_download(&state, &current_user, form, &file).await;
    match result {
        Ok(download) => Ok((StatusCode::CREATED, Json(download))),
        Err(e) => {
            uploads::remove_file(&file.path).await;
            Err(e)
        }
    }
}

async fn persist_new_download(
    state: &AppState,
    current_user: &CurrentUser,
    form: DownloadForm,
    file: &StoredFile,
) -> Result<DownloadResponse> {
    let request = DownloadCreate {
        title: form.title.unwrap_or_default(),
        description: form.description.unwrap_or_default(),
        category: form.category,
        tags: form.tags.unwrap_or_default(),
        thumbnail_url: form.thumbnail_url,
        version: form.version,
        license: form.license,
        requirements: form.requirements,
        instructions: form.instructions,
        requires_auth: form.requires_auth.unwrap_or(false),
        price: form.price,
        is_published: form.is_published.unwrap_or(false),
        is_featured: form.is_featured.unwrap_or(false),
        sort_order: form.sort_order,
        publish_date: form.publish_date,
        expiry_date: form.expiry_date,
    };
    request.validate()?;

    let slug = Downloads::slug_for(&request.title);

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut downloads = Downloads::new(&mut conn);

    let download = downloads
        .create(&DownloadCreateDBRequest {
            title: request.title,
            slug,
            description: request.description,
            author_id: current_user.id,
            category: request.category,
            tags: request.tags,
            file_path: file.path.to_string_lossy().into_owned(),
            file_name: file.original_name.clone(),
            file_size: file.size,
            file_type: file.mime_type.clone(),
            thumbnail_url: request.thumbnail_url,
            version: request.version,
            license: request.license,
            requirements: request.requirements,
            instructions: request.instructions,
            requires_auth: request.requires_auth,
            price: request.price,
            is_published: request.is_published,
            is_featured: request.is_featured,
            sort_order: request.sort_order,
            publish_date: request.publish_date,
            expiry_date: request.expiry_date,
        })
        .await?;

    Ok(DownloadResponse::from(download))
}

/// Resolve a path selector to a download row, trying UUID first and
/// falling back to slug lookup. Mutations accept either form.
async fn find_download(downloads: &mut Downloads<'_>, selector: &str) -> Result<DownloadDBResponse> {
    let found = match selector.parse::<DownloadId>() {
        Ok(id) => downloads.get_by_id(id).await?,
        Err(_) => downloads.get_by_slug(selector, false).await?,
    };
    found.ok_or_else(|| Error::NotFound {
        resource: "Download".to_string(),
    })
}

/// Update a download (multipart, file optional)
#[utoipa::path(
    put,
    path = "/downloads/{selector}",
    tag = "downloads",
    params(("selector" = String, Path, description = "Download slug or ID")),
    request_body(content = DownloadUpdate, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated download", body = DownloadResponse),
        (status = 400, description = "Invalid input or duplicate title"),
        (status = 403, description = "Not the author and not staff"),
        (status = 404, description = "Download not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_download(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(selector): Path<String>,
    multipart: Multipart,
) -> Result<Json<DownloadResponse>> {
    let (form, stored) = read_download_form(multipart, &state.config.uploads).await?;

    let result = persist_download_update(&state, &current_user, &selector, form, stored.as_ref()).await;
    match result {
        Ok((download, old_file_path)) => {
            // The replaced file goes away only after the row updated.
            if let Some(path) = old_file_path {
                uploads::remove_file(std::path::Path::new(&path)).await;
            }
            Ok(Json(download))
        }
        Err(e) => {
            if let Some(file) = stored {
                uploads::remove_file(&file.path).await;
            }
            Err(e)
        }
    }
}

async fn persist_download_update(
    state: &AppState,
    current_user: &CurrentUser,
    selector: &str,
    form: DownloadForm,
    file: Option<&StoredFile>,
) -> Result<(DownloadResponse, Option<String>)> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut downloads = Downloads::new(&mut conn);

    let existing = find_download(&mut downloads, selector).await?;

    if !policy::can_modify_content(current_user, existing.author_id) {
        return Err(Error::Forbidden {
            message: "You do not have permission to modify this download".to_string(),
        });
    }

    let request = DownloadUpdate {
        title: form.title,
        description: form.description,
        category: form.category,
        tags: form.tags,
        thumbnail_url: form.thumbnail_url,
        version: form.version,
        license: form.license,
        requirements: form.requirements,
        instructions: form.instructions,
        requires_auth: form.requires_auth,
        price: form.price,
        is_published: form.is_published,
        is_featured: form.is_featured,
        sort_order: form.sort_order,
        publish_date: form.publish_date,
        expiry_date: form.expiry_date,
    };
    request.validate()?;

    let slug = request
        .title
        .as_deref()
        .filter(|title| *title != existing.title)
        .map(Downloads::slug_for);

    let old_file_path = file.is_some().then(|| existing.file_path.clone());

    let updated = downloads
        .update(
            existing.id,
            &DownloadUpdateDBRequest {
                title: request.title,
                slug,
                description: request.description,
                category: request.category,
                tags: request.tags,
                thumbnail_url: request.thumbnail_url,
                version: request.version,
                license: request.license,
                requirements: request.requirements,
                instructions: request.instructions,
                requires_auth: request.requires_auth,
                price: request.price,
                is_published: request.is_published,
                is_featured: request.is_featured,
                sort_order: request.sort_order,
                publish_date: request.publish_date,
                expiry_date: request.expiry_date,
                file_path: file.map(|f| f.path.to_string_lossy().into_owned()),
                file_name: file.map(|f| f.original_name.clone()),
                file_size: file.map(|f| f.size),
                file_type: file.map(|f| f.mime_type.clone()),
            },
        )
        .await?;

    Ok((DownloadResponse::from(updated), old_file_path))
}

/// Delete a download and its stored file
#[utoipa::path(
    delete,
    path = "/downloads/{selector}",
    tag = "downloads",
    params(("selector" = String, Path, description = "Download slug or ID")),
    responses(
        (status = 204, description = "Download deleted"),
        (status = 403, description = "Not the author and not staff"),
        (status = 404, description = "Download not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_download(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(selector): Path<String>,
) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut downloads = Downloads::new(&mut conn);

    let existing = find_download(&mut downloads, &selector).await?;

    if !policy::can_modify_content(&current_user, existing.author_id) {
        return Err(Error::Forbidden {
            message: "You do not have permission to delete this download".to_string(),
        });
    }

    downloads.delete(existing.id).await?;

    // Best-effort removal; a failure here only leaks disk space.
    uploads::remove_file(std::path::Path::new(&existing.file_path)).await;

    Ok(StatusCode::NO_CONTENT)
}
