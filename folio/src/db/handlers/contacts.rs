//! Database repository for contact messages.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;

use crate::{
    api::models::{
        contacts::{ContactCategory, ContactPriority, ContactStatus},
        pagination::SortOrder,
    },
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::contacts::{ContactCreateDBRequest, ContactDBResponse, ContactUpdateDBRequest},
    },
    types::{abbrev_uuid, ContactId},
};

/// Filter for listing contact messages
#[derive(Debug, Clone)]
pub struct ContactFilter {
    pub offset: i64,
    pub limit: i64,
    pub sort_column: &'static str,
    pub sort_order: SortOrder,
    pub status: Option<ContactStatus>,
    pub category: Option<ContactCategory>,
    pub priority: Option<ContactPriority>,
    pub is_spam: Option<bool>,
    /// Case-insensitive substring search on name, email, subject, and message
    pub search: Option<String>,
}

impl ContactFilter {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            offset,
            limit,
            sort_column: "created_at",
            sort_order: SortOrder::Desc,
            status: None,
            category: None,
            priority: None,
            is_spam: None,
            search: None,
        }
    }
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Contact {
    pub id: ContactId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub subject: String,
    pub message: String,
    pub category: ContactCategory,
    pub status: ContactStatus,
    pub priority: ContactPriority,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub is_spam: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub replied_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Contact> for ContactDBResponse {
    fn from(c: Contact) -> Self {
        Self {
            id: c.id,
            name: c.name,
            email: c.email,
            phone: c.phone,
            company: c.company,
            subject: c.subject,
            message: c.message,
            category: c.category,
            status: c.status,
            priority: c.priority,
            ip_address: c.ip_address,
            user_agent: c.user_agent,
            referrer: c.referrer,
            is_spam: c.is_spam,
            read_at: c.read_at,
            replied_at: c.replied_at,
            notes: c.notes,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Row shape for the aggregate stats query
#[derive(Debug, FromRow)]
pub struct ContactStatsDBResponse {
    pub total: i64,
    pub new: i64,
    pub read: i64,
    pub replied: i64,
    pub closed: i64,
    pub spam: i64,
}

pub struct Contacts<'c> {
    db: &'c mut PgConnection,
}

fn push_filters(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &ContactFilter) {
    if let Some(status) = filter.status {
        query.push(" AND status = ");
        query.push_bind(status);
    }
    if let Some(category) = filter.category {
        query.push(" AND category = ");
        query.push_bind(category);
    }
    if let Some(priority) = filter.priority {
        query.push(" AND priority = ");
        query.push_bind(priority);
    }
    if let Some(is_spam) = filter.is_spam {
        query.push(" AND is_spam = ");
        query.push_bind(is_spam);
    }
    if let Some(ref search) = filter.search {
        let pattern = format!("%{}%", search.to_lowercase());
        query.push(" AND (LOWER(name) LIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR LOWER(email) LIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR LOWER(subject) LIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR LOWER(message) LIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Contacts<'c> {
    type CreateRequest = ContactCreateDBRequest;
    type UpdateRequest = ContactUpdateDBRequest;
    type Response = ContactDBResponse;
    type Id = ContactId;
    type Filter = ContactFilter;

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let contact = sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts (name, email, phone, company, subject, message, category, ip_address, user_agent, referrer)
            VALUES ($1, LOWER($2), $3, $4, $5, $6, COALESCE($7, 'general'), $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.phone)
        .bind(&request.company)
        .bind(&request.subject)
        .bind(&request.message)
        .bind(request.category)
        .bind(&request.ip_address)
        .bind(&request.user_agent)
        .bind(&request.referrer)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(ContactDBResponse::from(contact))
    }

    #[instrument(skip(self), fields(contact_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let contact = sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(contact.map(ContactDBResponse::from))
    }

    #[instrument(skip(self), fields(contact_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(contact_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        // Status transitions stamp their timestamps exactly once
        let contact = sqlx::query_as::<_, Contact>(
            r#"
            UPDATE contacts SET
                status = COALESCE($2, status),
                priority = COALESCE($3, priority),
                is_spam = COALESCE($4, is_spam),
                notes = COALESCE($5, notes),
                read_at = CASE
                    WHEN $2::contact_status = 'read' AND read_at IS NULL THEN NOW()
                    ELSE read_at
                END,
                replied_at = CASE
                    WHEN $2::contact_status = 'replied' AND replied_at IS NULL THEN NOW()
                    ELSE replied_at
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.status)
        .bind(request.priority)
        .bind(request.is_spam)
        .bind(&request.notes)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(ContactDBResponse::from(contact))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, offset = filter.offset), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM contacts WHERE 1=1");
        push_filters(&mut query, filter);

        // sort_column comes from a static allow-list, never request text
        query.push(format!(" ORDER BY {} {}", filter.sort_column, filter.sort_order.as_sql()));
        query.push(" LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.offset);

        let contacts = query.build_query_as::<Contact>().fetch_all(&mut *self.db).await?;

        Ok(contacts.into_iter().map(ContactDBResponse::from).collect())
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM contacts WHERE 1=1");
        push_filters(&mut query, filter);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;

        Ok(count)
    }
}

impl<'c> Contacts<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Transition a freshly received message to read, stamping `read_at`.
    /// No-op for messages that were already read.
    #[instrument(skip(self), fields(contact_id = %abbrev_uuid(&id)), err)]
    pub async fn mark_read(&mut self, id: ContactId) -> Result<()> {
        sqlx::query("UPDATE contacts SET status = 'read', read_at = NOW(), updated_at = NOW() WHERE id = $1 AND status = 'new'")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }

    /// Aggregate counts for the staff dashboard
    #[instrument(skip(self), err)]
    pub async fn stats(&mut self) -> Result<ContactStatsDBResponse> {
        let stats = sqlx::query_as::<_, ContactStatsDBResponse>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'new') AS new,
                COUNT(*) FILTER (WHERE status = 'read') AS read,
                COUNT(*) FILTER (WHERE status = 'replied') AS replied,
                COUNT(*) FILTER (WHERE status = 'closed') AS closed,
                COUNT(*) FILTER (WHERE is_spam) AS spam
            FROM contacts
            "#,
        )
        .fetch_one(&mut *self.db)
        .await?;

        Ok(stats)
    }
}
