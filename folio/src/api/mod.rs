//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! Functional areas:
//!
//! - **Authentication** (`/api/auth/*`): registration, login, token refresh,
//!   profile and password management
//! - **Users** (`/api/users/*`): user administration (admin only)
//! - **Posts** (`/api/posts/*`): blog content
//! - **Projects** (`/api/projects/*`): portfolio projects
//! - **Downloads** (`/api/downloads/*`): downloadable files and metadata
//! - **Contacts** (`/api/contacts/*`): contact form and staff triage
//!
//! All endpoints carry OpenAPI annotations via `utoipa`; the rendered
//! documentation is served at `/docs`.

pub mod handlers;
pub mod models;
