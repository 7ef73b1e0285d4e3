//! OpenAPI documentation for the REST API.
//!
//! The rendered document is served at `/docs` through a Scalar UI and the
//! raw JSON at `/docs/openapi.json`.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::api;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "JWT access token authentication. Obtain a token via \
                            `/api/auth/login` and include it in the `Authorization` header:\n\n\
                            ```\nAuthorization: Bearer YOUR_ACCESS_TOKEN\n```",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Portfolio API",
        description = "REST backend for a personal portfolio site: posts, projects, downloads, and contact messages."
    ),
    servers(
        (url = "/api", description = "API root")
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::auth::refresh,
        api::handlers::auth::me,
        api::handlers::auth::update_me,
        api::handlers::auth::change_password,
        api::handlers::users::list_users,
        api::handlers::users::user_stats,
        api::handlers::users::get_user,
        api::handlers::users::create_user,
        api::handlers::users::update_user,
        api::handlers::users::delete_user,
        api::handlers::posts::list_posts,
        api::handlers::posts::search_posts,
        api::handlers::posts::post_categories,
        api::handlers::posts::post_tags,
        api::handlers::posts::get_post,
        api::handlers::posts::create_post,
        api::handlers::posts::update_post,
        api::handlers::posts::delete_post,
        api::handlers::projects::list_projects,
        api::handlers::projects::featured_projects,
        api::handlers::projects::project_categories,
        api::handlers::projects::project_tags,
        api::handlers::projects::project_technologies,
        api::handlers::projects::get_project,
        api::handlers::projects::create_project,
        api::handlers::projects::update_project,
        api::handlers::projects::delete_project,
        api::handlers::downloads::list_downloads,
        api::handlers::downloads::download_categories,
        api::handlers::downloads::download_tags,
        api::handlers::downloads::get_download,
        api::handlers::downloads::fetch_download_file,
        api::handlers::downloads::create_download,
        api::handlers::downloads::update_download,
        api::handlers::downloads::delete_download,
        api::handlers::contacts::create_contact,
        api::handlers::contacts::list_contacts,
        api::handlers::contacts::contact_stats,
        api::handlers::contacts::get_contact,
        api::handlers::contacts::update_contact_status,
        api::handlers::contacts::mark_contact_spam,
        api::handlers::contacts::delete_contact,
    ),
    components(
        schemas(
            api::models::auth::RegisterRequest,
            api::models::auth::LoginRequest,
            api::models::auth::RefreshRequest,
            api::models::auth::AuthResponse,
            api::models::auth::RefreshResponse,
            api::models::auth::ProfileUpdate,
            api::models::auth::PasswordChange,
            api::models::users::Role,
            api::models::users::UserResponse,
            api::models::users::UserCreate,
            api::models::users::UserUpdate,
            api::models::users::UserStats,
            api::models::pagination::PageMeta,
            api::models::posts::PostResponse,
            api::models::posts::PostCreate,
            api::models::posts::PostUpdate,
            api::models::pagination::PaginatedResponse<api::models::posts::PostResponse>,
            api::models::projects::ProjectStatus,
            api::models::projects::Priority,
            api::models::projects::ProjectResponse,
            api::models::projects::ProjectCreate,
            api::models::projects::ProjectUpdate,
            api::models::pagination::PaginatedResponse<api::models::projects::ProjectResponse>,
            api::models::downloads::DownloadResponse,
            api::models::downloads::DownloadCreate,
            api::models::downloads::DownloadUpdate,
            api::models::pagination::PaginatedResponse<api::models::downloads::DownloadResponse>,
            api::models::contacts::ContactCategory,
            api::models::contacts::ContactStatus,
            api::models::contacts::ContactPriority,
            api::models::contacts::ContactCreate,
            api::models::contacts::ContactReceipt,
            api::models::contacts::ContactResponse,
            api::models::contacts::ContactUpdate,
            api::models::contacts::ContactStats,
            api::models::pagination::PaginatedResponse<api::models::contacts::ContactResponse>,
            api::models::pagination::PaginatedResponse<api::models::users::UserResponse>,
        )
    ),
    tags(
        (name = "auth", description = "Authentication and self-service profile"),
        (name = "users", description = "User administration"),
        (name = "posts", description = "Blog posts"),
        (name = "projects", description = "Portfolio projects"),
        (name = "downloads", description = "Downloadable files"),
        (name = "contacts", description = "Contact messages"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_builds() {
        let doc = ApiDoc::openapi();
        let json = doc.to_json().unwrap();
        assert!(json.contains("/auth/login"));
        assert!(json.contains("/downloads/{slug}/file"));
        assert!(json.contains("/contacts/{contact_id}/status"));
        assert!(json.contains("/contacts/{contact_id}/spam"));
        assert!(json.contains("/users/{user_id}/stats"));
        assert!(json.contains("BearerAuth"));
    }
}
