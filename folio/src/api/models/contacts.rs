//! API models for contact form submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{db::models::contacts::ContactDBResponse, types::ContactId};

/// Topic the sender picked on the contact form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "contact_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContactCategory {
    General,
    Project,
    Collaboration,
    Support,
    Other,
}

/// Staff triage state of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "contact_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    New,
    Read,
    Replied,
    Closed,
}

/// Staff-assigned urgency of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "contact_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContactPriority {
    Low,
    Medium,
    High,
    Urgent,
}

/// Staff-facing representation of a contact message
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    #[schema(value_type = String, format = "uuid")]
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

impl From<ContactDBResponse> for ContactResponse {
    fn from(c: ContactDBResponse) -> Self {
        Self {
            id: c.id,
            name: c.name,
            email: c.email,
            phone: c.phone,
            company: c.company,
            subject: c.subject,
            message: c.message,
            category: c.category,
            status: c.status,
            priority: c.priority,
            ip_address: c.ip_address,
            user_agent: c.user_agent,
            referrer: c.referrer,
            is_spam: c.is_spam,
            read_at: c.read_at,
            replied_at: c.replied_at,
            notes: c.notes,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Public contact form body
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactCreate {
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub subject: String,
    #[validate(length(min = 10, max = 5000, message = "must be between 10 and 5000 characters"))]
    pub message: String,
    pub category: Option<ContactCategory>,
}

/// Receipt returned to the sender. The stored row, including triage
/// fields, never goes back to the public form.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactReceipt {
    #[schema(value_type = String, format = "uuid")]
    pub id: ContactId,
    pub message: String,
}

/// Staff triage update: status transition, priority, and notes. Spam
/// marking is a separate operation.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactUpdate {
    pub status: Option<ContactStatus>,
    pub priority: Option<ContactPriority>,
    #[validate(length(max = 5000, message = "must be at most 5000 characters"))]
    pub notes: Option<String>,
}

/// Query filters for the contact listing
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ContactListFilter {
    pub status: Option<ContactStatus>,
    pub category: Option<ContactCategory>,
    pub priority: Option<ContactPriority>,
    pub spam: Option<bool>,
    pub search: Option<String>,
}

/// Aggregate message counts for the staff dashboard
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactStats {
    pub total: i64,
    pub new: i64,
    pub read: i64,
    pub replied: i64,
    pub closed: i64,
    pub spam: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_form_rejects_short_message() {
        let body = ContactCreate {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            company: None,
            subject: "Hello".to_string(),
            message: "too short".to_string(),
            category: None,
        };
        let errs = body.validate().unwrap_err();
        assert!(errs.field_errors().contains_key("message"));
    }

    #[test]
    fn triage_notes_length_is_capped() {
        let update = ContactUpdate {
            notes: Some("x".repeat(5001)),
            ..Default::default()
        };
        let errs = update.validate().unwrap_err();
        assert!(errs.field_errors().contains_key("notes"));

        let update = ContactUpdate {
            status: Some(ContactStatus::Replied),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
    }

    #[test]
    fn enums_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&ContactStatus::Replied).unwrap(), "\"replied\"");
        assert_eq!(serde_json::to_string(&ContactPriority::Urgent).unwrap(), "\"urgent\"");
        assert_eq!(
            serde_json::from_str::<ContactCategory>("\"collaboration\"").unwrap(),
            ContactCategory::Collaboration
        );
    }
}
