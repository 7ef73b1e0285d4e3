//! API request and response data models.
//!
//! Data structures used for HTTP request deserialization and response
//! serialization. These models define the public API contract.
//!
//! # Design Principles
//!
//! - **Separation of Concerns**: API models are distinct from database
//!   models, allowing independent evolution of API and storage
//!   representations
//! - **Validation**: Request bodies derive `validator::Validate`; failures
//!   surface as 400 responses with per-field details
//! - **OpenAPI**: All models are annotated with `utoipa` for automatic API
//!   docs
//! - **Wire format**: Response and request bodies use camelCase keys
//!
//! # Modules
//!
//! - [`auth`]: Login, registration, refresh, and profile payloads
//! - [`users`]: User profiles, roles, and admin management requests
//! - [`posts`]: Blog post bodies and filters
//! - [`projects`]: Portfolio project bodies and filters
//! - [`downloads`]: Download metadata bodies and filters
//! - [`contacts`]: Contact form and triage payloads
//! - [`pagination`]: Shared pagination parameters and response wrapper

pub mod auth;
pub mod contacts;
pub mod downloads;
pub mod pagination;
pub mod posts;
pub mod projects;
pub mod users;
