use axum::routing::get;
use axum::Router;

use crate::auth::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/auth/signup/",
            get(handlers::signup_form).post(handlers::signup),
        )
        .route("/auth/login/", get(handlers::login_form).post(handlers::login))
        .route(
            "/auth/logout/",
            get(handlers::logout).post(handlers::logout),
        )
}
