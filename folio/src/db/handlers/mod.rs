//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection, provides strongly-typed CRUD
//! operations, and returns domain models from [`crate::db::models`]. All
//! repositories implement the [`Repository`] trait.
//!
//! # Available Repositories
//!
//! - [`Users`]: User account management and authentication
//! - [`Posts`]: Blog post storage and filtered listings
//! - [`Projects`]: Portfolio project storage
//! - [`Downloads`]: Download metadata and counters
//! - [`Contacts`]: Contact form submissions and triage
//!
//! # Common Pattern
//!
//! ```ignore
//! use folio::db::handlers::{Posts, Repository};
//!
//! let mut tx = pool.begin().await?;
//! let mut repo = Posts::new(&mut tx);
//! let page = repo.list(&filter, &pagination).await?;
//! tx.commit().await?;
//! ```

pub mod contacts;
pub mod downloads;
pub mod posts;
pub mod projects;
pub mod repository;
pub mod users;

pub use contacts::Contacts;
pub use downloads::Downloads;
pub use posts::Posts;
pub use projects::Projects;
pub use repository::Repository;
pub use users::Users;

/// Derive a URL slug from a title: lowercase, with runs of
/// non-alphanumeric characters collapsed to single hyphens.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_hyphen = true; // swallow leading separators

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_hyphen = false;
        } else if !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
    }

    // Drop a trailing separator
    if slug.ends_with('-') {
        slug.pop();
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Rust & WebAssembly: A Primer!"), "rust-webassembly-a-primer");
        assert_eq!(slugify("  spaced  out  "), "spaced-out");
        assert_eq!(slugify("MiXeD CaSe 123"), "mixed-case-123");
        assert_eq!(slugify("---"), "");
        assert_eq!(slugify(""), "");
    }
}
