use askama::Template;
use axum::routing::get;
use axum::Router;

use crate::extractors::MaybeUser;
use crate::routes::core::{Html, Layout};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "about/author.html")]
pub struct AuthorTemplate {
    pub layout: Layout,
    pub just_title: &'static str,
    pub just_text: &'static str,
}

#[derive(Template)]
#[template(path = "about/tech.html")]
pub struct TechTemplate {
    pub layout: Layout,
    pub just_title: &'static str,
    pub just_text: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/about/author/", get(author))
        .route("/about/tech/", get(tech))
}

async fn author(MaybeUser(user): MaybeUser) -> Html<AuthorTemplate> {
    Html(AuthorTemplate {
        layout: Layout::new(user.as_ref()),
        just_title: "About the author",
        just_text: "A few words about whoever keeps this place running.",
    })
}

async fn tech(MaybeUser(user): MaybeUser) -> Html<TechTemplate> {
    Html(TechTemplate {
        layout: Layout::new(user.as_ref()),
        just_title: "Technologies",
        just_text: "Built with axum, askama and SQLite.",
    })
}
