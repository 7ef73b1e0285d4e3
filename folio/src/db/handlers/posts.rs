//! Database repository for blog posts.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;

use crate::{
    api::models::pagination::SortOrder,
    db::{
        errors::{DbError, Result},
        handlers::{repository::Repository, slugify},
        models::posts::{PostCreateDBRequest, PostDBResponse, PostUpdateDBRequest},
    },
    types::{abbrev_uuid, PostId, UserId},
};

/// Filter for listing posts
#[derive(Debug, Clone)]
pub struct PostFilter {
    pub offset: i64,
    pub limit: i64,
    pub sort_column: &'static str,
    pub sort_order: SortOrder,
    /// Case-insensitive substring search on title, excerpt, and content
    pub search: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub author_id: Option<UserId>,
    /// None means no publication filter (staff callers only)
    pub is_published: Option<bool>,
}

impl PostFilter {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            offset,
            limit,
            sort_column: "created_at",
            sort_order: SortOrder::Desc,
            search: None,
            category: None,
            tag: None,
            author_id: None,
            is_published: None,
        }
    }
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Post {
    pub id: PostId,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub author_id: UserId,
    pub publish_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub is_published: bool,
    pub view_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Post> for PostDBResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            excerpt: post.excerpt,
            content: post.content,
            author_id: post.author_id,
            publish_date: post.publish_date,
            category: post.category,
            tags: post.tags,
            image_url: post.image_url,
            is_published: post.is_published,
            view_count: post.view_count,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

pub struct Posts<'c> {
    db: &'c mut PgConnection,
}

fn push_filters(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &PostFilter) {
    if let Some(is_published) = filter.is_published {
        query.push(" AND is_published = ");
        query.push_bind(is_published);
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
    if let Some(author_id) = filter.author_id {
        query.push(" AND author_id = ");
        query.push_bind(author_id);
    }
    if let Some(ref search) = filter.search {
        let pattern = format!("%{}%", search.to_lowercase());
        query.push(" AND (LOWER(title) LIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR LOWER(excerpt) LIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR LOWER(content) LIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Posts<'c> {
    type CreateRequest = PostCreateDBRequest;
    type UpdateRequest = PostUpdateDBRequest;
    type Response = PostDBResponse;
    type Id = PostId;
    type Filter = PostFilter;

    #[instrument(skip(self, request), fields(title = %request.title), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (title, slug, excerpt, content, author_id, publish_date, category, tags, image_url, is_published)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(&request.title)
        .bind(&request.slug)
        .bind(&request.excerpt)
        .bind(&request.content)
        .bind(request.author_id)
        .bind(request.publish_date)
        .bind(&request.category)
        .bind(&request.tags)
        .bind(&request.image_url)
        .bind(request.is_published)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(PostDBResponse::from(post))
    }

    #[instrument(skip(self), fields(post_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(post.map(PostDBResponse::from))
    }

    #[instrument(skip(self), fields(post_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(post_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts SET
                title = COALESCE($2, title),
                slug = COALESCE($3, slug),
                excerpt = COALESCE($4, excerpt),
                content = COALESCE($5, content),
                publish_date = COALESCE($6, publish_date),
                category = COALESCE($7, category),
                tags = COALESCE($8, tags),
                image_url = COALESCE($9, image_url),
                is_published = COALESCE($10, is_published),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.title)
        .bind(&request.slug)
        .bind(&request.excerpt)
        .bind(&request.content)
        .bind(request.publish_date)
        .bind(&request.category)
        .bind(&request.tags)
        .bind(&request.image_url)
        .bind(request.is_published)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(PostDBResponse::from(post))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, offset = filter.offset), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM posts WHERE 1=1");
        push_filters(&mut query, filter);

        // sort_column comes from a static allow-list, never request text
        query.push(format!(" ORDER BY {} {}", filter.sort_column, filter.sort_order.as_sql()));
        query.push(" LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.offset);

        let posts = query.build_query_as::<Post>().fetch_all(&mut *self.db).await?;

        Ok(posts.into_iter().map(PostDBResponse::from).collect())
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM posts WHERE 1=1");
        push_filters(&mut query, filter);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;

        Ok(count)
    }
}

impl<'c> Posts<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Slug for a new post, derived from its title
    pub fn slug_for(title: &str) -> String {
        slugify(title)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_slug(&mut self, slug: &str, published_only: bool) -> Result<Option<PostDBResponse>> {
        let mut query = QueryBuilder::new("SELECT * FROM posts WHERE slug = ");
        query.push_bind(slug);
        if published_only {
            query.push(" AND is_published = TRUE");
        }

        let post = query.build_query_as::<Post>().fetch_optional(&mut *self.db).await?;

        Ok(post.map(PostDBResponse::from))
    }

    #[instrument(skip(self), fields(post_id = %abbrev_uuid(&id)), err)]
    pub async fn increment_view_count(&mut self, id: PostId) -> Result<()> {
        sqlx::query("UPDATE posts SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }

    /// Distinct categories of published posts
    #[instrument(skip(self), err)]
    pub async fn categories(&mut self) -> Result<Vec<String>> {
        let categories: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT category FROM posts WHERE is_published = TRUE AND category IS NOT NULL ORDER BY category",
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(categories)
    }

    /// Distinct tags of published posts
    #[instrument(skip(self), err)]
    pub async fn tags(&mut self) -> Result<Vec<String>> {
        let tags: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT unnest(tags) AS tag FROM posts WHERE is_published = TRUE ORDER BY tag")
                .fetch_all(&mut *self.db)
                .await?;

        Ok(tags)
    }
}
