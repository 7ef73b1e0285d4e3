//! Database repository for portfolio projects.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;

use crate::{
    api::models::{
        pagination::SortOrder,
        projects::{Priority, ProjectStatus},
    },
    db::{
        errors::{DbError, Result},
        handlers::{repository::Repository, slugify},
        models::projects::{ProjectCreateDBRequest, ProjectDBResponse, ProjectUpdateDBRequest},
    },
    types::{abbrev_uuid, ProjectId, UserId},
};

/// Filter for listing projects
#[derive(Debug, Clone)]
pub struct ProjectFilter {
    pub offset: i64,
    pub limit: i64,
    pub sort_column: &'static str,
    pub sort_order: SortOrder,
    /// Case-insensitive substring search on title, description, and content
    pub search: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub technology: Option<String>,
    pub status: Option<ProjectStatus>,
    pub is_featured: Option<bool>,
    /// None means no publication filter (staff callers only)
    pub is_published: Option<bool>,
}

impl ProjectFilter {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            offset,
            limit,
            sort_column: "created_at",
            sort_order: SortOrder::Desc,
            search: None,
            category: None,
            tag: None,
            technology: None,
            status: None,
            is_featured: None,
            is_published: None,
        }
    }
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Project {
    pub id: ProjectId,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: Option<String>,
    pub author_id: UserId,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub technologies: Vec<String>,
    pub image_url: Option<String>,
    pub gallery: Vec<String>,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub project_url: Option<String>,
    pub github_url: Option<String>,
    pub demo_url: Option<String>,
    pub client: Option<String>,
    pub budget: Option<Decimal>,
    pub is_published: bool,
    pub is_featured: bool,
    pub sort_order: i32,
    pub view_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Project> for ProjectDBResponse {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            title: p.title,
            slug: p.slug,
            description: p.description,
            content: p.content,
            author_id: p.author_id,
            category: p.category,
            tags: p.tags,
            technologies: p.technologies,
            image_url: p.image_url,
            gallery: p.gallery,
            status: p.status,
            priority: p.priority,
            start_date: p.start_date,
            end_date: p.end_date,
            project_url: p.project_url,
            github_url: p.github_url,
            demo_url: p.demo_url,
            client: p.client,
            budget: p.budget,
            is_published: p.is_published,
            is_featured: p.is_featured,
            sort_order: p.sort_order,
            view_count: p.view_count,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

pub struct Projects<'c> {
    db: &'c mut PgConnection,
}

fn push_filters(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &ProjectFilter) {
    if let Some(is_published) = filter.is_published {
        query.push(" AND is_published = ");
        query.push_bind(is_published);
    }
    if let Some(is_featured) = filter.is_featured {
        query.push(" AND is_featured = ");
        query.push_bind(is_featured);
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ");
        query.push_bind(status);
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
    if let Some(ref technology) = filter.technology {
        query.push(" AND ");
        query.push_bind(technology.clone());
        query.push(" = ANY(technologies)");
    }
    if let Some(ref search) = filter.search {
        let pattern = format!("%{}%", search.to_lowercase());
        query.push(" AND (LOWER(title) LIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR LOWER(description) LIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR LOWER(COALESCE(content, '')) LIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Projects<'c> {
    type CreateRequest = ProjectCreateDBRequest;
    type UpdateRequest = ProjectUpdateDBRequest;
    type Response = ProjectDBResponse;
    type Id = ProjectId;
    type Filter = ProjectFilter;

    #[instrument(skip(self, request), fields(title = %request.title), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        // Enum and integer columns fall back to their column defaults when
        // the request leaves them unset.
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (
                title, slug, description, content, author_id, category, tags, technologies,
                image_url, gallery, status, priority, start_date, end_date,
                project_url, github_url, demo_url, client, budget,
                is_published, is_featured, sort_order
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8,
                $9, $10, COALESCE($11, 'planning'), COALESCE($12, 'medium'), $13, $14,
                $15, $16, $17, $18, $19,
                $20, $21, COALESCE($22, 0)
            )
            RETURNING *
            "#,
        )
        .bind(&request.title)
        .bind(&request.slug)
        .bind(&request.description)
        .bind(&request.content)
        .bind(request.author_id)
        .bind(&request.category)
        .bind(&request.tags)
        .bind(&request.technologies)
        .bind(&request.image_url)
        .bind(&request.gallery)
        .bind(request.status)
        .bind(request.priority)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(&request.project_url)
        .bind(&request.github_url)
        .bind(&request.demo_url)
        .bind(&request.client)
        .bind(request.budget)
        .bind(request.is_published)
        .bind(request.is_featured)
        .bind(request.sort_order)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(ProjectDBResponse::from(project))
    }

    #[instrument(skip(self), fields(project_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(project.map(ProjectDBResponse::from))
    }

    #[instrument(skip(self), fields(project_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(project_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects SET
                title = COALESCE($2, title),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                content = COALESCE($5, content),
                category = COALESCE($6, category),
                tags = COALESCE($7, tags),
                technologies = COALESCE($8, technologies),
                image_url = COALESCE($9, image_url),
                gallery = COALESCE($10, gallery),
                status = COALESCE($11, status),
                priority = COALESCE($12, priority),
                start_date = COALESCE($13, start_date),
                end_date = COALESCE($14, end_date),
                project_url = COALESCE($15, project_url),
                github_url = COALESCE($16, github_url),
                demo_url = COALESCE($17, demo_url),
                client = COALESCE($18, client),
                budget = COALESCE($19, budget),
                is_published = COALESCE($20, is_published),
                is_featured = COALESCE($21, is_featured),
                sort_order = COALESCE($22, sort_order),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.title)
        .bind(&request.slug)
        .bind(&request.description)
        .bind(&request.content)
        .bind(&request.category)
        .bind(&request.tags)
        .bind(&request.technologies)
        .bind(&request.image_url)
        .bind(&request.gallery)
        .bind(request.status)
        .bind(request.priority)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(&request.project_url)
        .bind(&request.github_url)
        .bind(&request.demo_url)
        .bind(&request.client)
        .bind(request.budget)
        .bind(request.is_published)
        .bind(request.is_featured)
        .bind(request.sort_order)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(ProjectDBResponse::from(project))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, offset = filter.offset), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM projects WHERE 1=1");
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

        let projects = query.build_query_as::<Project>().fetch_all(&mut *self.db).await?;

        Ok(projects.into_iter().map(ProjectDBResponse::from).collect())
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM projects WHERE 1=1");
        push_filters(&mut query, filter);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;

        Ok(count)
    }
}

impl<'c> Projects<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Slug for a new project, derived from its title
    pub fn slug_for(title: &str) -> String {
        slugify(title)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_slug(&mut self, slug: &str, published_only: bool) -> Result<Option<ProjectDBResponse>> {
        let mut query = QueryBuilder::new("SELECT * FROM projects WHERE slug = ");
        query.push_bind(slug);
        if published_only {
            query.push(" AND is_published = TRUE");
        }

        let project = query.build_query_as::<Project>().fetch_optional(&mut *self.db).await?;

        Ok(project.map(ProjectDBResponse::from))
    }

    #[instrument(skip(self), fields(project_id = %abbrev_uuid(&id)), err)]
    pub async fn increment_view_count(&mut self, id: ProjectId) -> Result<()> {
        sqlx::query("UPDATE projects SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }

    /// Published featured projects in curated order
    #[instrument(skip(self), err)]
    pub async fn featured(&mut self, limit: i64) -> Result<Vec<ProjectDBResponse>> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT * FROM projects
            WHERE is_published = TRUE AND is_featured = TRUE
            ORDER BY sort_order ASC, created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(projects.into_iter().map(ProjectDBResponse::from).collect())
    }

    /// Distinct categories of published projects
    #[instrument(skip(self), err)]
    pub async fn categories(&mut self) -> Result<Vec<String>> {
        let categories: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT category FROM projects WHERE is_published = TRUE AND category IS NOT NULL ORDER BY category",
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(categories)
    }

    /// Distinct tags of published projects
    #[instrument(skip(self), err)]
    pub async fn tags(&mut self) -> Result<Vec<String>> {
        let tags: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT unnest(tags) AS tag FROM projects WHERE is_published = TRUE ORDER BY tag")
                .fetch_all(&mut *self.db)
                .await?;

        Ok(tags)
    }

    /// Distinct technologies of published projects
    #[instrument(skip(self), err)]
    pub async fn technologies(&mut self) -> Result<Vec<String>> {
        let technologies: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT unnest(technologies) AS technology FROM projects WHERE is_published = TRUE ORDER BY technology",
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(technologies)
    }
}
