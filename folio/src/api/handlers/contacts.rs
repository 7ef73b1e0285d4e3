//! Contact message endpoints. Submission is the only public operation;
//! triage (list, read, status changes) is staff work and deletion is
//! reserved for admins.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use validator::Validate;

use crate::{
    api::models::{
        contacts::{ContactCreate, ContactListFilter, ContactReceipt, ContactResponse, ContactStats, ContactStatus, ContactUpdate},
        pagination::{PaginatedResponse, Pagination},
        users::{CurrentUser, Role},
    },
    auth::policy,
    db::{
        errors::DbError,
        handlers::{contacts::ContactFilter, Contacts, Repository},
        models::contacts::{ContactCreateDBRequest, ContactUpdateDBRequest},
    },
    errors::{Error, Result},
    types::ContactId,
    AppState,
};

const SORT_COLUMNS: &[&str] = &["created_at", "updated_at", "name", "email", "status", "priority"];

/// Client address: first hop of X-Forwarded-For when present, else the
/// peer address of the connection.
fn client_ip(headers: &HeaderMap, peer: &SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| peer.ip().to_string())
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

/// Submit a contact message
#[utoipa::path(
    post,
    path = "/contacts",
    tag = "contacts",
    request_body = ContactCreate,
    responses(
        (status = 201, description = "Message received", body = ContactReceipt),
        (status = 400, description = "Invalid input"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_contact(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<ContactCreate>,
) -> Result<(StatusCode, Json<ContactReceipt>)> {
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut contacts = Contacts::new(&mut conn);

    let contact = contacts
        .create(&ContactCreateDBRequest {
            name: request.name,
            email: request.email,
            phone: request.phone,
            company: request.company,
            subject: request.subject,
            message: request.message,
            category: request.category,
            ip_address: Some(client_ip(&headers, &peer)),
            user_agent: header_value(&headers, header::USER_AGENT),
            referrer: header_value(&headers, header::REFERER),
        })
        .await?;

    // The submitter gets a receipt, not the stored row: provenance and
    // triage fields are staff-only.
    Ok((
        StatusCode::CREATED,
        Json(ContactReceipt {
            id: contact.id,
            message: "Your message has been received. We will get back to you soon.".to_string(),
        }),
    ))
}

/// List contact messages
#[utoipa::path(
    get,
    path = "/contacts",
    tag = "contacts",
    params(Pagination, ContactListFilter),
    responses(
        (status = 200, description = "Paginated contact messages", body = PaginatedResponse<ContactResponse>),
        (status = 403, description = "Editor or admin role required"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_contacts(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
    Query(query): Query<ContactListFilter>,
) -> Result<Json<PaginatedResponse<ContactResponse>>> {
    policy::require_staff(&current_user)?;

    let mut filter = ContactFilter::new(pagination.offset(), pagination.limit());
    filter.sort_column = pagination.sort_column(SORT_COLUMNS, "created_at");
    filter.sort_order = pagination.sort_order();
    filter.status = query.status;
    filter.category = query.category;
    filter.priority = query.priority;
    filter.is_spam = query.spam;
    filter.search = query.search;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut contacts = Contacts::new(&mut conn);

    let total = contacts.count(&filter).await?;
    let items: Vec<ContactResponse> = contacts.list(&filter).await?.into_iter().map(ContactResponse::from).collect();

    Ok(Json(PaginatedResponse::new(items, total, &pagination)))
}

/// Aggregate contact message counts
#[utoipa::path(
    get,
    path = "/contacts/stats",
    tag = "contacts",
    responses(
        (status = 200, description = "Contact totals", body = ContactStats),
        (status = 403, description = "Editor or admin role required"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn contact_stats(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<ContactStats>> {
    policy::require_staff(&current_user)?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut contacts = Contacts::new(&mut conn);

    let stats = contacts.stats().await?;

    Ok(Json(ContactStats {
        total: stats.total,
        new: stats.new,
        read: stats.read,
        replied: stats.replied,
        closed: stats.closed,
        spam: stats.spam,
    }))
}

/// Get a contact message
#[utoipa::path(
    get,
    path = "/contacts/{contact_id}",
    tag = "contacts",
    params(("contact_id" = uuid::Uuid, Path, description = "Contact message ID")),
    responses(
        (status = 200, description = "Contact message", body = ContactResponse),
        (status = 403, description = "Editor or admin role required"),
        (status = 404, description = "Contact message not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_contact(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(contact_id): Path<ContactId>,
) -> Result<Json<ContactResponse>> {
    policy::require_staff(&current_user)?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut contacts = Contacts::new(&mut conn);

    let mut contact = contacts.get_by_id(contact_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Contact message".to_string(),
    })?;

    // First staff read moves new messages to read and stamps read_at.
    if contact.status == ContactStatus::New {
        contacts.mark_read(contact_id).await?;
        contact = contacts.get_by_id(contact_id).await?.ok_or_else(|| Error::NotFound {
            resource: "Contact message".to_string(),
        })?;
    }

    Ok(Json(ContactResponse::from(contact)))
}

/// Update a contact message's triage fields
#[utoipa::path(
    put,
    path = "/contacts/{contact_id}/status",
    tag = "contacts",
    params(("contact_id" = uuid::Uuid, Path, description = "Contact message ID")),
    request_body = ContactUpdate,
    responses(
        (status = 200, description = "Updated contact message", body = ContactResponse),
        (status = 403, description = "Editor or admin role required"),
        (status = 404, description = "Contact message not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_contact_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(contact_id): Path<ContactId>,
    Json(request): Json<ContactUpdate>,
) -> Result<Json<ContactResponse>> {
    policy::require_staff(&current_user)?;
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut contacts = Contacts::new(&mut conn);

    let updated = contacts
        .update(
            contact_id,
            &ContactUpdateDBRequest {
                status: request.status,
                priority: request.priority,
                is_spam: None,
                notes: request.notes,
            },
        )
        .await?;

    Ok(Json(ContactResponse::from(updated)))
}

/// Mark a contact message as spam
#[utoipa::path(
    put,
    path = "/contacts/{contact_id}/spam",
    tag = "contacts",
    params(("contact_id" = uuid::Uuid, Path, description = "Contact message ID")),
    responses(
        (status = 200, description = "Message flagged as spam and closed", body = ContactResponse),
        (status = 403, description = "Editor or admin role required"),
        (status = 404, description = "Contact message not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn mark_contact_spam(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(contact_id): Path<ContactId>,
) -> Result<Json<ContactResponse>> {
    policy::require_staff(&current_user)?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut contacts = Contacts::new(&mut conn);

    // Spam messages leave the triage queue immediately.
    let updated = contacts
        .update(
            contact_id,
            &ContactUpdateDBRequest {
                status: Some(ContactStatus::Closed),
                priority: None,
                is_spam: Some(true),
                notes: None,
            },
        )
        .await?;

    Ok(Json(ContactResponse::from(updated)))
}

/// Delete a contact message
#[utoipa::path(
    delete,
    path = "/contacts/{contact_id}",
    tag = "contacts",
    params(("contact_id" = uuid::Uuid, Path, description = "Contact message ID")),
    responses(
        (status = 204, description = "Contact message deleted"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Contact message not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_contact(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(contact_id): Path<ContactId>,
) -> Result<StatusCode> {
    policy::require_role(&current_user, &[Role::Admin])?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut contacts = Contacts::new(&mut conn);

    if contacts.delete(contact_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound {
            resource: "Contact message".to_string(),
        })
    }
}
