use askama::Template;
use axum::extract::{Multipart, Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};

use crate::blog::{self, CommentOutcome, CreateOutcome, EditOutcome};
use crate::cache::index_key;
use crate::db::comments::{self, CommentView};
use crate::db::models::{Group, User};
use crate::db::posts::{self, PostFilter, PostView};
use crate::db::{follows, groups, users};
use crate::error::{AppError, AppResult};
use crate::events::PostEvent;
use crate::extractors::{CurrentUser, MaybeUser};
use crate::filters;
use crate::forms::{CommentForm, FormErrors, ImageUpload, PostForm};
use crate::pagination::{Page, PageQuery};
use crate::routes::core::{Html, Layout};
use crate::state::AppState;

// --- Templates ---

#[derive(Template)]
#[template(path = "posts/index.html")]
pub struct IndexTemplate {
    pub layout: Layout,
    pub page: Page<PostView>,
}

#[derive(Template)]
#[template(path = "posts/group_list.html")]
pub struct GroupListTemplate {
    pub layout: Layout,
    pub group: Group,
    pub page: Page<PostView>,
}

#[derive(Template)]
#[template(path = "posts/profile.html")]
pub struct ProfileTemplate {
    pub layout: Layout,
    pub author: User,
    pub posts_count: i64,
    pub following: bool,
    pub show_follow: bool,
    pub page: Page<PostView>,
}

#[derive(Template)]
#[template(path = "posts/post_detail.html")]
pub struct PostDetailTemplate {
    pub layout: Layout,
    pub post: PostView,
    pub posts_count: i64,
    pub comments: Vec<CommentView>,
    pub form: CommentForm,
    pub can_edit: bool,
}

/// Shared by create and edit.
#[derive(Template)]
#[template(path = "posts/post_create.html")]
pub struct PostFormTemplate {
    pub layout: Layout,
    pub form: PostForm,
    pub groups: Vec<Group>,
    pub errors: FormErrors,
    pub is_edit: bool,
    pub action: String,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/group/{slug}/", get(group_posts))
        .route("/profile/{username}/", get(profile))
        .route("/posts/{id}/", get(post_detail))
        .route("/create/", get(post_create_page).post(post_create))
        .route("/posts/{id}/edit/", get(post_edit_page).post(post_edit))
        .route("/posts/{id}/comment/", post(add_comment))
}

pub fn detail_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", username)
}

/// Non-numeric ids can never match a post.
fn parse_id(raw: &str) -> AppResult<i64> {
    raw.parse().map_err(|_| AppError::NotFound)
}

// --- Listings ---

async fn index(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<IndexTemplate>> {
    let key = index_key(query.raw().unwrap_or("1"));

    let page = match state.index_cache.get(&key).await {
        Some(page) => {
            tracing::debug!("Index cache hit: {}", key);
            page
        }
        None => {
            let generation = state.index_cache.generation().await;
            let page = {
                let conn = state.db.get()?;
                posts::page(&conn, PostFilter::All, query.raw())?
            };
            if !state
                .index_cache
                .put_if_current(key, page.clone(), generation)
                .await
            {
                tracing::debug!("Index changed while loading; not cached");
            }
            page
        }
    };

    Ok(Html(IndexTemplate {
        layout: Layout::new(user.as_ref()),
        page,
    }))
}

async fn group_posts(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<GroupListTemplate>> {
    let conn = state.db.get()?;
    let group = groups::find_by_slug(&conn, &slug)?.ok_or(AppError::NotFound)?;
    let page = posts::page(&conn, PostFilter::Group(group.id), query.raw())?;

    Ok(Html(GroupListTemplate {
        layout: Layout::new(user.as_ref()),
        group,
        page,
    }))
}

async fn profile(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<ProfileTemplate>> {
    let conn = state.db.get()?;
    let author = users::find_by_username(&conn, &username)?.ok_or(AppError::NotFound)?;
    let page = posts::page(&conn, PostFilter::Author(author.id), query.raw())?;

    let following = match &user {
        Some(user) => follows::is_following(&conn, user.id, author.id)?,
        None => false,
    };
    let show_follow = user.as_ref().is_some_and(|u| u.id != author.id);

    Ok(Html(ProfileTemplate {
        layout: Layout::new(user.as_ref()),
        posts_count: page.info.count,
        author,
        following,
        show_follow,
        page,
    }))
}

// --- Detail ---

async fn post_detail(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> AppResult<Html<PostDetailTemplate>> {
    let id = parse_id(&id)?;
    let conn = state.db.get()?;
    let post = posts::find_view(&conn, id)?.ok_or(AppError::NotFound)?;
    let posts_count = posts::count(&conn, PostFilter::Author(post.author_id))?;
    let comments = comments::list_for_post(&conn, id)?;
    let can_edit = user.as_ref().is_some_and(|u| u.id == post.author_id);

    Ok(Html(PostDetailTemplate {
        layout: Layout::new(user.as_ref()),
        post,
        posts_count,
        comments,
        form: CommentForm::default(),
        can_edit,
    }))
}

// --- Create / edit ---

async fn read_post_form(mut multipart: Multipart) -> AppResult<(PostForm, Option<ImageUpload>)> {
    let mut form = PostForm::default();
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text" => form.text = field.text().await?,
            "group" => form.group = field.text().await?,
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?.to_vec();
                image = Some(ImageUpload {
                    filename,
                    content_type,
                    data,
                });
            }
            _ => {}
        }
    }

    Ok((form, image))
}

fn form_page(
    user: &CurrentUser,
    form: PostForm,
    groups: Vec<Group>,
    errors: FormErrors,
    edit_of: Option<i64>,
) -> Html<PostFormTemplate> {
    let action = match edit_of {
        Some(id) => format!("/posts/{}/edit/", id),
        None => "/create/".to_string(),
    };
    Html(PostFormTemplate {
        layout: Layout::new(Some(user)),
        form,
        groups,
        errors,
        is_edit: edit_of.is_some(),
        action,
    })
}

async fn post_create_page(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Html<PostFormTemplate>> {
    let conn = state.db.get()?;
    let groups = groups::list(&conn)?;
    Ok(form_page(
        &user,
        PostForm::default(),
        groups,
        FormErrors::default(),
        None,
    ))
}

async fn post_create(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> AppResult<Response> {
    let (form, image) = read_post_form(multipart).await?;

    let outcome = {
        let conn = state.db.get()?;
        match blog::create_post(&conn, &state.media, user.id, &form, image)? {
            CreateOutcome::Created(id) => Ok(id),
            CreateOutcome::Invalid(errors) => Err((errors, groups::list(&conn)?)),
        }
    };

    match outcome {
        Ok(post_id) => {
            state
                .publish(PostEvent::Created {
                    post_id,
                    author_id: user.id,
                })
                .await;
            Ok(Redirect::to(&profile_url(&user.username)).into_response())
        }
        Err((errors, groups)) => Ok(form_page(&user, form, groups, errors, None).into_response()),
    }
}

async fn post_edit_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let id = parse_id(&id)?;
    let conn = state.db.get()?;
    let post = posts::find(&conn, id)?.ok_or(AppError::NotFound)?;
    if post.author_id != user.id {
        return Ok(Redirect::to(&detail_url(id)).into_response());
    }

    let groups = groups::list(&conn)?;
    Ok(form_page(
        &user,
        PostForm::from_post(&post),
        groups,
        FormErrors::default(),
        Some(id),
    )
    .into_response())
}

async fn post_edit(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<Response> {
    let id = parse_id(&id)?;
    let (form, image) = read_post_form(multipart).await?;

    let outcome = {
        let conn = state.db.get()?;
        match blog::edit_post(&conn, &state.media, user.id, id, &form, image)? {
            EditOutcome::Invalid(errors) => Err((errors, groups::list(&conn)?)),
            other => Ok(other),
        }
    };

    match outcome {
        Ok(EditOutcome::Saved) => {
            state.publish(PostEvent::Updated { post_id: id }).await;
            Ok(Redirect::to(&detail_url(id)).into_response())
        }
        Ok(_) => Ok(Redirect::to(&detail_url(id)).into_response()),
        Err((errors, groups)) => {
            Ok(form_page(&user, form, groups, errors, Some(id)).into_response())
        }
    }
}

// --- Comments ---

async fn add_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<CommentForm>,
) -> AppResult<Redirect> {
    let id = parse_id(&id)?;
    let conn = state.db.get()?;

    match blog::add_comment(&conn, user.id, id, &form)? {
        CommentOutcome::Added(comment_id) => {
            tracing::info!("User {} commented on post {} ({})", user.id, id, comment_id);
        }
        CommentOutcome::Invalid(errors) => {
            tracing::debug!("Dropped invalid comment on post {}: {:?}", id, errors);
        }
    }

    Ok(Redirect::to(&detail_url(id)))
}
