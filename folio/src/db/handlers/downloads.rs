//! Database repository for downloads.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;

use crate::{
    api::models::pagination::SortOrder,
    db::{
        errors::{DbError, Result},
        handlers::{repository::Repository, slugify},
        models::downloads::{DownloadCreateDBRequest, DownloadDBResponse, DownloadUpdateDBRequest},
    },
    types::{abbrev_uuid, DownloadId, UserId},
};

/// Filter for listing downloads
#[derive(Debug, Clone)]
pub struct DownloadFilter {
    pub offset: i64,
    pub limit: i64,
    pub sort_column: &'static str,
    pub sort_order: SortOrder,
    /// Case-insensitive substring search on title and description
    pub search: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub is_featured: Option<bool>,
    /// None means no publication filter (staff callers only)
    pub is_published: Option<bool>,
}

impl DownloadFilter {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            offset,
            limit,
            sort_column: "created_at",
            sort_order: SortOrder::Desc,
            search: None,
            category: None,
            tag: None,
            is_featured: None,
            is_published: None,
        }
    }
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Download {
    pub id: DownloadId,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub author_id: UserId,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub file_path: String,
    pub file_name: String,
    pub file_size: i64,
    pub file_type: String,
    pub thumbnail_url: Option<String>,
    pub version: Option<String>,
    pub license: Option<String>,
    pub requirements: Option<String>,
    pub instructions: Option<String>,
    pub download_count: i32,
    pub requires_auth: bool,
    pub price: Option<Decimal>,
    pub is_published: bool,
    pub is_featured: bool,
    pub sort_order: i32,
    pub publish_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Download> for DownloadDBResponse {
    fn from(d: Download) -> Self {
        Self {
            id: d.id,
            title: d.title,
            slug: d.slug,
            description: d.description,
            author_id: d.author_id,
            category: d.category,
            tags: d.tags,
            file_path: d.file_path,
            file_name: d.file_name,
            file_size: d.file_size,
            file_type: d.file_type,
            thumbnail_url: d.thumbnail_url,
            version: d.version,
            license: d.license,
            requirements: d.requirements,
            instructions: d.instructions,
            download_count: d.download_count,
            requires_auth: d.requires_auth,
            price: d.price,
            is_published: d.is_published,
            is_featured: d.is_featured,
            sort_order: d.sort_order,
            publish_date: d.publish_date,
            expiry_date: d.expiry_date,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

pub struct Downloads<'c> {
    db: &'c mut PgConnection,
}

fn push_filters(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &DownloadFilter) {
    if let Some(is_published) = filter.is_published {
        query.push(" AND is_published = ");
        query.push_bind(is_published);
    }
    if let Some(is_featured) = filter.is_featured {
        query.push(" AND is_featured = ");
        query.push_bind(is_featured);
    }
    if let Some(ref category) = filter.category {
        query.push(" AND category = ");
        query.push_bind(category.clone());
    }
    if let Some(ref tag) = filter.tag {
        query.push(" AND ");
        query.push_bind(tag.clone());
        query.push(" = ANY(tags)");
    }
    if let Some(ref search) = filter.search {
        let pattern = format!("%{}%", search.to_lowercase());
        query.push(" AND (LOWER(title) LIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR LOWER(description) LIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Downloads<'c> {
    type CreateRequest = DownloadCreateDBRequest;
    type UpdateRequest = DownloadUpdateDBRequest;
    type Response = DownloadDBResponse;
    type Id = DownloadId;
    type Filter = DownloadFilter;

    #[instrument(skip(self, request), fields(title = %request.title), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let download = sqlx::query_as::<_, Download>(
            r#"
            INSERT INTO downloads (
                title, slug, description, author_id, category, tags,
                file_path, file_name, file_size, file_type,
                thumbnail_url, version, license, requirements, instructions,
                requires_auth, price, is_published, is_featured, sort_order,
                publish_date, expiry_date
            )
            VALUES (
                $1, $2, $3, $4, $5, $6,
                $7, $8, $9, $10,
                $11, $12, $13, $14, $15,
                $16, $17, $18, $19, COALESCE($20, 0),
                $21, $22
            )
            RETURNING *
            "#,
        )
        .bind(&request.title)
        .bind(&request.slug)
        .bind(&request.description)
        .bind(request.author_id)
        .bind(&request.category)
        .bind(&request.tags)
        .bind(&request.file_path)
        .bind(&request.file_name)
        .bind(request.file_size)
        .bind(&request.file_type)
        .bind(&request.thumbnail_url)
        .bind(&request.version)
        .bind(&request.license)
        .bind(&request.requirements)
        .bind(&request.instructions)
        .bind(request.requires_auth)
        .bind(request.price)
        .bind(request.is_published)
        .bind(request.is_featured)
        .bind(request.sort_order)
        .bind(request.publish_date)
        .bind(request.expiry_date)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(DownloadDBResponse::from(download))
    }

    #[instrument(skip(self), fields(download_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let download = sqlx::query_as::<_, Download>("SELECT * FROM downloads WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(download.map(DownloadDBResponse::from))
    }

    #[instrument(skip(self), fields(download_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM downloads WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(download_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let download = sqlx::query_as::<_, Download>(
            r#"
            UPDATE downloads SET
                title = COALESCE($2, title),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                category = COALESCE($5, category),
                tags = COALESCE($6, tags),
                thumbnail_url = COALESCE($7, thumbnail_url),
                version = COALESCE($8, version),
                license = COALESCE($9, license),
                requirements = COALESCE($10, requirements),
                instructions = COALESCE($11, instructions),
                requires_auth = COALESCE($12, requires_auth),
                price = COALESCE($13, price),
                is_published = COALESCE($14, is_published),
                is_featured = COALESCE($15, is_featured),
                sort_order = COALESCE($16, sort_order),
                publish_date = COALESCE($17, publish_date),
                expiry_date = COALESCE($18, expiry_date),
                file_path = COALESCE($19, file_path),
                file_name = COALESCE($20, file_name),
                file_size = COALESCE($21, file_size),
                file_type = COALESCE($22, file_type),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.title)
        .bind(&request.slug)
        .bind(&request.description)
        .bind(&request.category)
        .bind(&request.tags)
        .bind(&request.thumbnail_url)
        .bind(&request.version)
        .bind(&request.license)
        .bind(&request.requirements)
        .bind(&request.instructions)
        .bind(request.requires_auth)
        .bind(request.price)
        .bind(request.is_published)
        .bind(request.is_featured)
        .bind(request.sort_order)
        .bind(request.publish_date)
        .bind(request.expiry_date)
        .bind(&request.file_path)
        .bind(&request.file_name)
        .bind(request.file_size)
        .bind(&request.file_type)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(DownloadDBResponse::from(download))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, offset = filter.offset), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM downloads WHERE 1=1");
        push_filters(&mut query, filter);

        // Featured rows first, then curated ordering, then the requested sort
        query.push(format!(
            " ORDER BY is_featured DESC, sort_order ASC, {} {}",
            filter.sort_column,
            filter.sort_order.as_sql()
        ));
        query.push(" LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.offset);

        let downloads = query.build_query_as::<Download>().fetch_all(&mut *self.db).await?;

        Ok(downloads.into_iter().map(DownloadDBResponse::from).collect())
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM downloads WHERE 1=1");
        push_filters(&mut query, filter);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;

        Ok(count)
    }
}

impl<'c> Downloads<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Slug for a new download, derived from its title
    pub fn slug_for(title: &str) -> String {
        slugify(title)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_slug(&mut self, slug: &str, published_only: bool) -> Result<Option<DownloadDBResponse>> {
        let mut query = QueryBuilder::new("SELECT * FROM downloads WHERE slug = ");
        query.push_bind(slug);
        if published_only {
            query.push(" AND is_published = TRUE");
        }

        let download = query.build_query_as::<Download>().fetch_optional(&mut *self.db).await?;

        Ok(download.map(DownloadDBResponse::from))
    }

    #[instrument(skip(self), fields(download_id = %abbrev_uuid(&id)), err)]
    pub async fn increment_download_count(&mut self, id: DownloadId) -> Result<()> {
        sqlx::query("UPDATE downloads SET download_count = download_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }

    /// Distinct categories of published downloads
    #[instrument(skip(self), err)]
    pub async fn categories(&mut self) -> Result<Vec<String>> {
        let categories: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT category FROM downloads WHERE is_published = TRUE AND category IS NOT NULL ORDER BY category",
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(categories)
    }

    /// Distinct tags of published downloads
    #[instrument(skip(self), err)]
    pub async fn tags(&mut self) -> Result<Vec<String>> {
        let tags: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT unnest(tags) AS tag FROM downloads WHERE is_published = TRUE ORDER BY tag")
                .fetch_all(&mut *self.db)
                .await?;

        Ok(tags)
    }
}
