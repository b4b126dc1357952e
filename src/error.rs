use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};

use crate::routes::core::{
    render_status, AnonymousNotFound, Layout, NotFoundTemplate, ServerErrorTemplate,
};

pub const LOGIN_URL: &str = "/auth/login/";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    /// Sent to the login page, coming back to `next` afterwards.
    #[error("Authentication required")]
    Unauthenticated { next: String },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Password hashing error: {0}")]
    Password(#[from] bcrypt::BcryptError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// `/auth/login/?next=<path>`, keeping slashes readable.
pub fn login_url(next: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("{}?next={}", LOGIN_URL, encoded.replace("%2F", "/"))
}

fn server_error() -> Response {
    render_status(
        StatusCode::INTERNAL_SERVER_ERROR,
        ServerErrorTemplate {
            layout: Layout::anonymous(),
        },
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => {
                // The visitor is unknown here; routes::core::not_found_for_visitor
                // swaps in their layout.
                let mut response = render_status(
                    StatusCode::NOT_FOUND,
                    NotFoundTemplate {
                        layout: Layout::anonymous(),
                        path: None,
                    },
                );
                response.extensions_mut().insert(AnonymousNotFound);
                response
            }
            AppError::Unauthenticated { next } => Redirect::to(&login_url(&next)).into_response(),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Multipart(e) => {
                tracing::warn!("Multipart error: {}", e);
                (e.status(), e.body_text()).into_response()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                server_error()
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                server_error()
            }
            AppError::Io(e) => {
                tracing::error!("IO error: {}", e);
                server_error()
            }
            AppError::Password(e) => {
                tracing::error!("Password hashing error: {}", e);
                server_error()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                server_error()
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
