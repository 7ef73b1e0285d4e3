//! HTTP request handlers for all API endpoints.
//!
//! Each handler is responsible for request validation, authentication and
//! authorization checks, business logic via the database repositories, and
//! response serialization.
//!
//! # Handler Modules
//!
//! - [`auth`]: Registration, login, token refresh, and self-service profile
//! - [`users`]: User administration (admin only)
//! - [`posts`]: Blog post CRUD, search, and taxonomy lists
//! - [`projects`]: Portfolio project CRUD, featured list, and taxonomies
//! - [`downloads`]: Download CRUD, file intake, and the file fetch endpoint
//! - [`contacts`]: Public contact submission and staff triage
//!
//! Handlers return [`crate::errors::Error`] which converts to the
//! appropriate HTTP status code and JSON error body.

pub mod auth;
pub mod contacts;
pub mod downloads;
pub mod posts;
pub mod projects;
pub mod users;
