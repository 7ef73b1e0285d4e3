//! Common type aliases used throughout the application.

use uuid::Uuid;

pub type UserId = Uuid;
pub type PostId = Uuid;
pub type ProjectId = Uuid;
pub type DownloadId = Uuid;
pub type ContactId = Uuid;

/// Shorten a UUID for log output
pub fn abbrev_uuid(id: &Uuid) -> String {
    id.to_string().chars().take(8).collect()
}
