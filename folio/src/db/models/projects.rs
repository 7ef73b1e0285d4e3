//! Database models for portfolio projects.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::{
    api::models::projects::{Priority, ProjectStatus},
    types::{ProjectId, UserId},
};

/// Database request for creating a project
#[derive(Debug, Clone)]
pub struct ProjectCreateDBRequest {
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
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub project_url: Option<String>,
    pub github_url: Option<String>,
    pub demo_url: Option<String>,
    pub client: Option<String>,
    pub budget: Option<Decimal>,
    pub is_published: bool,
    pub is_featured: bool,
    pub sort_order: Option<i32>,
}

/// Database request for updating a project. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdateDBRequest {
    pub title: Option<String>,
    /// Regenerated by the repository whenever the title changes
    pub slug: Option<String>,
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
    pub project_url: Option<String>,
    pub github_url: Option<String>,
    pub demo_url: Option<String>,
    pub client: Option<String>,
    pub budget: Option<Decimal>,
    pub is_published: Option<bool>,
    pub is_featured: Option<bool>,
    pub sort_order: Option<i32>,
}

/// Database response for a project
#[derive(Debug, Clone)]
pub struct ProjectDBResponse {
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
