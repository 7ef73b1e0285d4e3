//! Database models for blog posts.

use chrono::{DateTime, NaiveDate, Utc};

use crate::types::{PostId, UserId};

/// Database request for creating a post
#[derive(Debug, Clone)]
pub struct PostCreateDBRequest {
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
}

/// Database request for updating a post. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct PostUpdateDBRequest {
    pub title: Option<String>,
    /// Regenerated by the repository whenever the title changes
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub publish_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub is_published: Option<bool>,
}

/// Database response for a post
#[derive(Debug, Clone)]
pub struct PostDBResponse {
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
