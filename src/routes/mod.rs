pub mod about;
pub mod assets;
pub mod auth;
pub mod core;
pub mod follow;
pub mod posts;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Upper bound for a post form including its image.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// The full application with every page, static files and the 404 fallback.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(posts::router())
        .merge(follow::router())
        .merge(about::router())
        .merge(auth::router())
        .route("/static/{*path}", get(assets::serve_static))
        .route("/media/{*path}", get(assets::serve_media))
        .fallback(core::not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            core::not_found_for_visitor,
        ))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
