use askama::Template;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{Datelike, Utc};

use crate::auth::session;
use crate::extractors::{extract_session_token, CurrentUser, MaybeUser};
use crate::state::AppState;

/// Values every page layout needs: the footer year and the signed-in user.
#[derive(Debug, Clone)]
pub struct Layout {
    pub year: i32,
    pub username: Option<String>,
}

impl Layout {
    pub fn new(user: Option<&CurrentUser>) -> Self {
        Self {
            year: Utc::now().year(),
            username: user.map(|u| u.username.clone()),
        }
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }
}

#[derive(Template)]
#[template(path = "core/404.html")]
pub struct NotFoundTemplate {
    pub layout: Layout,
    pub path: Option<String>,
}

#[derive(Template)]
#[template(path = "core/500.html")]
pub struct ServerErrorTemplate {
    pub layout: Layout,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        render_status(StatusCode::OK, self.0)
    }
}

pub fn render_status<T: Template>(status: StatusCode, template: T) -> Response {
    match template.render() {
        Ok(body) => (
            status,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Template render error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

/// Fallback for unknown routes.
pub async fn not_found(MaybeUser(user): MaybeUser, uri: Uri) -> Response {
    render_status(
        StatusCode::NOT_FOUND,
        NotFoundTemplate {
            layout: Layout::new(user.as_ref()),
            path: Some(uri.path().to_string()),
        },
    )
}

/// Response extension on 404 pages rendered before the visitor was known.
#[derive(Debug, Clone, Copy)]
pub struct AnonymousNotFound;

/// Middleware: re-renders handler 404s with the signed-in user's layout.
pub async fn not_found_for_visitor(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let headers = request.headers().clone();
    let response = next.run(request).await;
    if response.extensions().get::<AnonymousNotFound>().is_none() {
        return response;
    }

    let Some(token) = extract_session_token(&headers, &state.config.auth.cookie_name) else {
        return response;
    };
    let user = match state.db.get() {
        Ok(conn) => session::lookup_user(&conn, token).unwrap_or_else(|e| {
            tracing::warn!("Session lookup for 404 page failed: {}", e);
            None
        }),
        Err(e) => {
            tracing::warn!("No connection for 404 page: {}", e);
            None
        }
    };

    match user {
        Some(user) => render_status(
            StatusCode::NOT_FOUND,
            NotFoundTemplate {
                layout: Layout::new(Some(&user)),
                path: None,
            },
        ),
        None => response,
    }
}
