//! Database record models matching table schemas.
//!
//! Struct definitions that correspond to database table rows, used by
//! repositories to return query results and accept insertion/update data.
//! Database models are distinct from API models so storage and API
//! representations can evolve independently; each response model implements
//! `From` into its API counterpart.
//!
//! - [`users`]: User accounts and credentials
//! - [`posts`]: Blog posts
//! - [`projects`]: Portfolio projects
//! - [`downloads`]: Downloadable files and their metadata
//! - [`contacts`]: Contact form submissions

pub mod contacts;
pub mod downloads;
pub mod posts;
pub mod projects;
pub mod users;
