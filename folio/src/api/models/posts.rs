//! API models for blog posts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::models::posts::PostDBResponse,
    types::{PostId, UserId},
};

/// Public representation of a post
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: PostId,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    #[schema(value_type = String, format = "uuid")]
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

impl From<PostDBResponse> for PostResponse {
    fn from(p: PostDBResponse) -> Self {
        Self {
            id: p.id,
            title: p.title,
            slug: p.slug,
            excerpt: p.excerpt,
            content: p.content,
            author_id: p.author_id,
            publish_date: p.publish_date,
            category: p.category,
            tags: p.tags,
            image_url: p.image_url,
            is_published: p.is_published,
            view_count: p.view_count,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Request body for creating a post. The slug is derived from the title.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostCreate {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 500, message = "must be between 1 and 500 characters"))]
    pub excerpt: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub content: String,
    pub publish_date: Option<NaiveDate>,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}

/// Partial update body for a post. A new title regenerates the slug.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostUpdate {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 500, message = "must be between 1 and 500 characters"))]
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub publish_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub is_published: Option<bool>,
}

/// Query filters for the post listing
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PostListFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    #[param(value_type = Option<String>, format = "uuid")]
    pub author: Option<UserId>,
    /// Staff only; ignored for public callers
    pub published: Option<bool>,
}

/// Query for the dedicated search endpoint
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct SearchQuery {
    pub q: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_defaults_to_unpublished() {
        let body: PostCreate = serde_json::from_value(serde_json::json!({
            "title": "First Post",
            "excerpt": "An excerpt",
            "content": "Body text"
        }))
        .unwrap();
        assert!(!body.is_published);
        assert!(body.tags.is_empty());
    }

    #[test]
    fn update_is_fully_optional() {
        let body: PostUpdate = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(body.title.is_none());
        assert!(body.is_published.is_none());
    }

    #[test]
    fn response_uses_camel_case_keys() {
        let p = PostResponse {
            id: uuid::Uuid::new_v4(),
            title: "t".to_string(),
            slug: "t".to_string(),
            excerpt: "e".to_string(),
            content: "c".to_string(),
            author_id: uuid::Uuid::new_v4(),
            publish_date: None,
            category: None,
            tags: vec![],
            image_url: None,
            is_published: true,
            view_count: 3,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("isPublished").is_some());
        assert!(json.get("viewCount").is_some());
        assert!(json.get("is_published").is_none());
    }
}
