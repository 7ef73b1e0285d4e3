//! API models for portfolio projects.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::models::projects::ProjectDBResponse,
    types::{ProjectId, UserId},
};

/// Lifecycle status of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Planning,
    InProgress,
    Completed,
    OnHold,
}

/// Priority bucket shared by projects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "row_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Public representation of a project
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ProjectId,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: Option<String>,
    #[schema(value_type = String, format = "uuid")]
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

impl From<ProjectDBResponse> for ProjectResponse {
    fn from(p: ProjectDBResponse) -> Self {
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

/// Request body for creating a project
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCreate {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub description: String,
    pub content: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub gallery: Vec<String>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[validate(url(message = "must be a valid URL"))]
    pub project_url: Option<String>,
    #[validate(url(message = "must be a valid URL"))]
    pub github_url: Option<String>,
    #[validate(url(message = "must be a valid URL"))]
    pub demo_url: Option<String>,
    pub client: Option<String>,
    pub budget: Option<Decimal>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub is_featured: bool,
    pub sort_order: Option<i32>,
}

/// Partial update body for a project
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdate {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub technologies: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub gallery: Option<Vec<String>>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[validate(url(message = "must be a valid URL"))]
    pub project_url: Option<String>,
    #[validate(url(message = "must be a valid URL"))]
    pub github_url: Option<String>,
    #[validate(url(message = "must be a valid URL"))]
    pub demo_url: Option<String>,
    pub client: Option<String>,
    pub budget: Option<Decimal>,
    pub is_published: Option<bool>,
    pub is_featured: Option<bool>,
    pub sort_order: Option<i32>,
}

/// Query filters for the project listing
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub technology: Option<String>,
    pub status: Option<ProjectStatus>,
    /// Only meaningful when present: absence means no featured filter
    pub featured: Option<bool>,
    /// Staff only; ignored for public callers
    pub published: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&ProjectStatus::InProgress).unwrap(), "\"in_progress\"");
        assert_eq!(serde_json::from_str::<ProjectStatus>("\"on_hold\"").unwrap(), ProjectStatus::OnHold);
    }

    #[test]
    fn create_rejects_bad_url() {
        let body: ProjectCreate = serde_json::from_value(serde_json::json!({
            "title": "My Project",
            "description": "Something",
            "githubUrl": "not a url"
        }))
        .unwrap();
        let errs = body.validate().unwrap_err();
        assert!(errs.field_errors().contains_key("github_url"));
    }

    #[test]
    fn featured_flag_absence_is_no_filter() {
        let f: ProjectListFilter = serde_urlencoded::from_str("").unwrap();
        assert_eq!(f.featured, None);

        let f: ProjectListFilter = serde_urlencoded::from_str("featured=true").unwrap();
        assert_eq!(f.featured, Some(true));

        let f: ProjectListFilter = serde_urlencoded::from_str("featured=false").unwrap();
        assert_eq!(f.featured, Some(false));
    }
}
