//! Database models for contact messages.

use chrono::{DateTime, Utc};

use crate::{
    api::models::contacts::{ContactCategory, ContactPriority, ContactStatus},
    types::ContactId,
};

/// Database request for storing a contact form submission
#[derive(Debug, Clone)]
pub struct ContactCreateDBRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub subject: String,
    pub message: String,
    pub category: Option<ContactCategory>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

/// Database request for staff triage updates. Status transitions stamp
/// `read_at`/`replied_at` inside the repository.
#[derive(Debug, Clone, Default)]
pub struct ContactUpdateDBRequest {
    pub status: Option<ContactStatus>,
    pub priority: Option<ContactPriority>,
    pub is_spam: Option<bool>,
    pub notes: Option<String>,
}

/// Database response for a contact message
#[derive(Debug, Clone)]
pub struct ContactDBResponse {
    pub id: ContactId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub subject: String,
    pub message: String,
    pub category: ContactCategory,
    pub status: ContactStatus,
    pub priority: ContactPriority,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub is_spam: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub replied_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
