//! Database models for downloads.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::types::{DownloadId, UserId};

/// Database request for creating a download
#[derive(Debug, Clone)]
pub struct DownloadCreateDBRequest {
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
    pub requires_auth: bool,
    pub price: Option<Decimal>,
    pub is_published: bool,
    pub is_featured: bool,
    pub sort_order: Option<i32>,
    pub publish_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
}

/// Database request for updating a download. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct DownloadUpdateDBRequest {
    pub title: Option<String>,
    /// Regenerated by the repository whenever the title changes
    pub slug: Option<String>,
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
    /// Set together when a replacement file has been stored
    pub file_path: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub file_type: Option<String>,
}

/// Database response for a download
#[derive(Debug, Clone)]
pub struct DownloadDBResponse {
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

impl DownloadDBResponse {
    /// Whether the expiry date, if any, is in the past
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        matches!(self.expiry_date, Some(expiry) if expiry < today)
    }
}
