//! API models for downloadable files.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::models::downloads::DownloadDBResponse,
    types::{DownloadId, UserId},
};

/// Public representation of a download.
///
/// The on-disk path stays in the db layer; clients fetch the file through
/// `fileUrl`, which routes through the access checks.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: DownloadId,
    pub title: String,
    pub slug: String,
    pub description: String,
    #[schema(value_type = String, format = "uuid")]
    pub author_id: UserId,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub file_url: String,
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

impl From<DownloadDBResponse> for DownloadResponse {
    fn from(d: DownloadDBResponse) -> Self {
        Self {
            id: d.id,
            title: d.title,
            file_url: format!("/api/downloads/{}/file", d.slug),
            slug: d.slug,
            description: d.description,
            author_id: d.author_id,
            category: d.category,
            tags: d.tags,
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

/// Metadata body for creating a download. The file itself arrives as a
/// separate multipart field.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadCreate {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub description: String,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub thumbnail_url: Option<String>,
    pub version: Option<String>,
    pub license: Option<String>,
    pub requirements: Option<String>,
    pub instructions: Option<String>,
    #[serde(default)]
    pub requires_auth: bool,
    pub price: Option<Decimal>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub is_featured: bool,
    pub sort_order: Option<i32>,
    pub publish_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
}

/// Partial update body for a download. A replacement file, when present,
/// travels as the `file` part of the same multipart form.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadUpdate {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub thumbnail_url: Option<String>,
    pub version: Option<String>,
    pub license: Option<String>,
    pub requirements: Option<String>,
    pub instructions: Option<String>,
    pub requires_auth: Option<bool>,
    pub price: Option<Decimal>,
    pub is_published: Option<bool>,
    pub is_featured: Option<bool>,
    pub sort_order: Option<i32>,
    pub publish_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
}

/// Query filters for the download listing
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct DownloadListFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub featured: Option<bool>,
    /// Staff only; ignored for public callers
    pub published: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_url_is_derived_from_slug() {
        let db = DownloadDBResponse {
            id: uuid::Uuid::new_v4(),
            title: "Starter Kit".to_string(),
            slug: "starter-kit".to_string(),
            description: "d".to_string(),
            author_id: uuid::Uuid::new_v4(),
            category: None,
            tags: vec![],
            file_path: "/var/uploads/starter_kit_123.zip".to_string(),
            file_name: "starter kit.zip".to_string(),
            file_size: 1024,
            file_type: "application/zip".to_string(),
            thumbnail_url: None,
            version: None,
            license: None,
            requirements: None,
            instructions: None,
            download_count: 0,
            requires_auth: false,
            price: None,
            is_published: true,
            is_featured: false,
            sort_order: 0,
            publish_date: None,
            expiry_date: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        let api = DownloadResponse::from(db);
        assert_eq!(api.file_url, "/api/downloads/starter-kit/file");

        // The on-disk path must never serialize
        let json = serde_json::to_value(&api).unwrap();
        assert!(json.get("filePath").is_none());
    }
}
