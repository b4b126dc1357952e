use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use axum::routing::get;
use axum::Router;

use crate::blog;
use crate::db::posts::{self, PostFilter, PostView};
use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::pagination::{Page, PageQuery};
use crate::routes::core::{Html, Layout};
use crate::routes::posts::profile_url;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "posts/follow.html")]
pub struct FollowTemplate {
    pub layout: Layout,
    pub page: Page<PostView>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/follow/", get(follow_index))
        .route(
            "/profile/{username}/follow/",
            get(profile_follow).post(profile_follow),
        )
        .route(
            "/profile/{username}/unfollow/",
            get(profile_unfollow).post(profile_unfollow),
        )
}

/// GET /follow/: posts by followed authors, newest first
async fn follow_index(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<FollowTemplate>> {
    let conn = state.db.get()?;
    let page = posts::page(&conn, PostFilter::FollowedBy(user.id), query.raw())?;

    Ok(Html(FollowTemplate {
        layout: Layout::new(Some(&user)),
        page,
    }))
}

async fn profile_follow(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Redirect> {
    let conn = state.db.get()?;
    let outcome = blog::follow_author(&conn, user.id, &username)?;
    tracing::info!("{} follow {}: {:?}", user.username, username, outcome);
    Ok(Redirect::to(&profile_url(&username)))
}

async fn profile_unfollow(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Redirect> {
    let conn = state.db.get()?;
    if blog::unfollow_author(&conn, user.id, &username)? {
        tracing::info!("{} unfollowed {}", user.username, username);
    }
    Ok(Redirect::to(&profile_url(&username)))
}
