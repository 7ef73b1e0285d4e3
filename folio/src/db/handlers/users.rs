//! Database repository for user accounts.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;

use crate::{
    api::models::{pagination::SortOrder, users::Role},
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
    },
    types::{abbrev_uuid, UserId},
};

/// Filter for listing users
#[derive(Debug, Clone)]
pub struct UserFilter {
    pub offset: i64,
    pub limit: i64,
    pub sort_column: &'static str,
    pub sort_order: SortOrder,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    /// Case-insensitive substring search on email, username, and names
    pub search: Option<String>,
}

impl UserFilter {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            offset,
            limit,
            sort_column: "created_at",
            sort_order: SortOrder::Desc,
            role: None,
            is_active: None,
            search: None,
        }
    }
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct User {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserDBResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            first_name: user.first_name,
            last_name: user.last_name,
            is_active: user.is_active,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Row shape for the per-user content stats query
#[derive(Debug, FromRow)]
pub struct UserStatsDBResponse {
    pub posts_count: i64,
    pub projects_count: i64,
    pub downloads_count: i64,
    pub total_views: i64,
}

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

/// Apply the shared WHERE clauses for list and count
fn push_filters(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &UserFilter) {
    if let Some(role) = filter.role {
        query.push(" AND role = ");
        query.push_bind(role);
    }
    if let Some(is_active) = filter.is_active {
        query.push(" AND is_active = ");
        query.push_bind(is_active);
    }
    if let Some(ref search) = filter.search {
        let pattern = format!("%{}%", search.to_lowercase());
        query.push(" AND (LOWER(email) LIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR LOWER(username) LIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR LOWER(COALESCE(first_name, '')) LIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR LOWER(COALESCE(last_name, '')) LIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        // Emails are stored lowercased so uniqueness is case-insensitive.
        // created_at and updated_at use database DEFAULT NOW() for consistency
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, username, password_hash, role, first_name, last_name)
            VALUES (LOWER($1), $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&request.email)
        .bind(&request.username)
        .bind(&request.password_hash)
        .bind(request.role)
        .bind(&request.first_name)
        .bind(&request.last_name)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(UserDBResponse::from(user))
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user.map(UserDBResponse::from))
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        // Atomic update with conditional field updates
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                email = COALESCE(LOWER($2), email),
                username = COALESCE($3, username),
                password_hash = COALESCE($4, password_hash),
                role = COALESCE($5, role),
                is_active = COALESCE($6, is_active),
                first_name = COALESCE($7, first_name),
                last_name = COALESCE($8, last_name),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.email)
        .bind(&request.username)
        .bind(&request.password_hash)
        .bind(request.role)
        .bind(request.is_active)
        .bind(&request.first_name)
        .bind(&request.last_name)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(UserDBResponse::from(user))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, offset = filter.offset), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM users WHERE 1=1");
        push_filters(&mut query, filter);

        // sort_column comes from a static allow-list, never request text
        query.push(format!(" ORDER BY {} {}", filter.sort_column, filter.sort_order.as_sql()));
        query.push(" LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.offset);

        let users = query.build_query_as::<User>().fetch_all(&mut *self.db).await?;

        Ok(users.into_iter().map(UserDBResponse::from).collect())
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM users WHERE 1=1");
        push_filters(&mut query, filter);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;

        Ok(count)
    }
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, email), err)]
    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = LOWER($1)")
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user.map(UserDBResponse::from))
    }

    /// Stamp a successful login
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn record_login(&mut self, id: UserId) -> Result<()> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }

    /// Whether any admin account exists, used for bootstrap seeding
    #[instrument(skip(self), err)]
    pub async fn admin_exists(&mut self) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE role = 'admin')")
            .fetch_one(&mut *self.db)
            .await?;

        Ok(exists)
    }

    /// Content counts and the post view tally for one user
    #[instrument(skip(self), err)]
    pub async fn content_stats(&mut self, user_id: UserId) -> Result<UserStatsDBResponse> {
        let stats = sqlx::query_as::<_, UserStatsDBResponse>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM posts WHERE author_id = $1) AS posts_count,
                (SELECT COUNT(*) FROM projects WHERE author_id = $1) AS projects_count,
                (SELECT COUNT(*) FROM downloads WHERE author_id = $1) AS downloads_count,
                (SELECT COALESCE(SUM(view_count), 0) FROM posts WHERE author_id = $1) AS total_views
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(stats)
    }
}
