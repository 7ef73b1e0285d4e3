//! Authentication and authorization system.
//!
//! Stateless JWT authentication: clients log in with email/password and
//! receive an access/refresh token pair. The access token travels in the
//! `Authorization: Bearer <token>` header; the refresh token is exchanged
//! at `/api/auth/refresh` for a fresh access token.
//!
//! # Modules
//!
//! - [`current_user`]: Extractors for getting the authenticated user in handlers
//! - [`password`]: Password hashing and verification using Argon2
//! - [`policy`]: Role and ownership predicates used by handlers
//! - [`token`]: Access/refresh JWT creation and verification
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use folio::{api::models::users::CurrentUser, auth::policy};
//!
//! async fn protected_handler(user: CurrentUser) -> Result<String, Error> {
//!     policy::require_staff(&user)?;
//!     Ok(format!("Hello, {}!", user.username))
//! }
//! ```

pub mod current_user;
pub mod password;
pub mod policy;
pub mod token;

pub use current_user::MaybeUser;
