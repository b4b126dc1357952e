//! Mutating operations behind the post, comment and follow routes.
//!
//! Each operation reports what happened as an explicit outcome, so a
//! rejected edit or a dropped comment is distinguishable from success even
//! though the HTTP layer answers all of them with a redirect.

use rusqlite::Connection;

use crate::db::follows::{self, FollowOutcome};
use crate::db::{comments, groups, posts, users};
use crate::error::{AppError, AppResult};
use crate::forms::{CommentForm, FormErrors, ImageUpload, PostForm};
use crate::media::MediaStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(i64),
    Invalid(FormErrors),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Saved,
    /// The editor is not the author; nothing was changed.
    Denied,
    Invalid(FormErrors),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentOutcome {
    Added(i64),
    Invalid(FormErrors),
}

pub fn create_post(
    conn: &Connection,
    media: &MediaStore,
    author_id: i64,
    form: &PostForm,
    image: Option<ImageUpload>,
) -> AppResult<CreateOutcome> {
    let choices = groups::list(conn)?;
    let clean = match form.validate(&choices, image) {
        Ok(clean) => clean,
        Err(errors) => return Ok(CreateOutcome::Invalid(errors)),
    };

    let image_path = clean
        .image
        .as_ref()
        .map(|image| media.save_post_image(image))
        .transpose()?;

    let id = posts::insert(
        conn,
        author_id,
        &clean.text,
        clean.group_id,
        image_path.as_deref(),
    )?;
    tracing::info!("User {} published post {}", author_id, id);
    Ok(CreateOutcome::Created(id))
}

/// Missing posts are `NotFound`; everything else is an outcome.
pub fn edit_post(
    conn: &Connection,
    media: &MediaStore,
    editor_id: i64,
    post_id: i64,
    form: &PostForm,
    image: Option<ImageUpload>,
) -> AppResult<EditOutcome> {
    let post = posts::find(conn, post_id)?.ok_or(AppError::NotFound)?;
    if post.author_id != editor_id {
        tracing::debug!("User {} may not edit post {}", editor_id, post_id);
        return Ok(EditOutcome::Denied);
    }

    let choices = groups::list(conn)?;
    let clean = match form.validate(&choices, image) {
        Ok(clean) => clean,
        Err(errors) => return Ok(EditOutcome::Invalid(errors)),
    };

    let image_path = clean
        .image
        .as_ref()
        .map(|image| media.save_post_image(image))
        .transpose()?;

    posts::update(
        conn,
        post_id,
        &clean.text,
        clean.group_id,
        image_path.as_deref(),
    )?;
    tracing::info!("User {} edited post {}", editor_id, post_id);
    Ok(EditOutcome::Saved)
}

pub fn add_comment(
    conn: &Connection,
    author_id: i64,
    post_id: i64,
    form: &CommentForm,
) -> AppResult<CommentOutcome> {
    posts::find(conn, post_id)?.ok_or(AppError::NotFound)?;

    match form.validate() {
        Ok(text) => {
            let id = comments::insert(conn, post_id, author_id, &text)?;
            Ok(CommentOutcome::Added(id))
        }
        Err(errors) => Ok(CommentOutcome::Invalid(errors)),
    }
}

pub fn follow_author(conn: &Connection, user_id: i64, username: &str) -> AppResult<FollowOutcome> {
    let author = users::find_by_username(conn, username)?.ok_or(AppError::NotFound)?;
    let outcome = follows::follow(conn, user_id, author.id)?;
    tracing::debug!("Follow {} -> {}: {:?}", user_id, author.id, outcome);
    Ok(outcome)
}

/// Returns whether an edge was removed.
pub fn unfollow_author(conn: &Connection, user_id: i64, username: &str) -> AppResult<bool> {
    let author = users::find_by_username(conn, username)?.ok_or(AppError::NotFound)?;
    Ok(follows::unfollow(conn, user_id, author.id)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::db::users::NewUser;
    use crate::forms::{INVALID_CHOICE, REQUIRED};

    fn user(conn: &Connection, name: &str) -> i64 {
        users::create(
            conn,
            &NewUser {
                username: name,
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn form(text: &str, group: &str) -> PostForm {
        PostForm {
            text: text.into(),
            group: group.into(),
        }
    }

    #[test]
    fn create_post_sets_author_group_and_image() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let media = MediaStore::new(tmp.path());
        let leo = user(&conn, "leo");
        let group = groups::create(&conn, "Tolstoy", "leo", "").unwrap();

        let image = ImageUpload {
            filename: "small.gif".into(),
            content_type: Some("image/gif".into()),
            data: b"GIF89a\x01\x00\x01\x00".to_vec(),
        };
        let outcome =
            create_post(&conn, &media, leo, &form("War and Peace", &group.to_string()), Some(image))
                .unwrap();
        let CreateOutcome::Created(id) = outcome else {
            panic!("expected Created, got {:?}", outcome);
        };

        let post = posts::find(&conn, id).unwrap().unwrap();
        assert_eq!(post.author_id, leo);
        assert_eq!(post.group_id, Some(group));
        let image = post.image.unwrap();
        assert!(media.resolve(&image).unwrap().exists());
    }

    #[test]
    fn create_post_reports_errors_without_writing() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let media = MediaStore::new(tmp.path());
        let leo = user(&conn, "leo");

        let outcome = create_post(&conn, &media, leo, &form(" ", "42"), None).unwrap();
        let CreateOutcome::Invalid(errors) = outcome else {
            panic!("expected Invalid");
        };
        assert_eq!(errors.field("text"), [REQUIRED.to_string()]);
        assert_eq!(errors.field("group"), [INVALID_CHOICE.to_string()]);
        assert_eq!(posts::count(&conn, posts::PostFilter::All).unwrap(), 0);
    }

    #[test]
    fn non_author_edit_is_denied() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let media = MediaStore::new("/nonexistent");
        let leo = user(&conn, "leo");
        let anna = user(&conn, "anna");
        let id = posts::insert(&conn, leo, "original", None, None).unwrap();

        let outcome = edit_post(&conn, &media, anna, id, &form("hijacked", ""), None).unwrap();
        assert_eq!(outcome, EditOutcome::Denied);
        assert_eq!(posts::find(&conn, id).unwrap().unwrap().text, "original");
    }

    #[test]
    fn author_edit_saves_and_validates() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let media = MediaStore::new("/nonexistent");
        let leo = user(&conn, "leo");
        let id = posts::insert(&conn, leo, "original", None, None).unwrap();

        let invalid = edit_post(&conn, &media, leo, id, &form("", ""), None).unwrap();
        assert!(matches!(invalid, EditOutcome::Invalid(_)));
        assert_eq!(posts::find(&conn, id).unwrap().unwrap().text, "original");

        let saved = edit_post(&conn, &media, leo, id, &form("revised", ""), None).unwrap();
        assert_eq!(saved, EditOutcome::Saved);
        assert_eq!(posts::find(&conn, id).unwrap().unwrap().text, "revised");
    }

    #[test]
    fn edit_of_missing_post_is_not_found() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let media = MediaStore::new("/nonexistent");
        let leo = user(&conn, "leo");
        let result = edit_post(&conn, &media, leo, 77, &form("x", ""), None);
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[test]
    fn comment_outcomes() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let leo = user(&conn, "leo");
        let id = posts::insert(&conn, leo, "post", None, None).unwrap();

        let added = add_comment(&conn, leo, id, &CommentForm { text: "nice".into() }).unwrap();
        assert!(matches!(added, CommentOutcome::Added(_)));

        let dropped = add_comment(&conn, leo, id, &CommentForm { text: "  ".into() }).unwrap();
        assert!(matches!(dropped, CommentOutcome::Invalid(_)));
        assert_eq!(comments::list_for_post(&conn, id).unwrap().len(), 1);

        let missing = add_comment(&conn, leo, id + 1, &CommentForm { text: "x".into() });
        assert!(matches!(missing, Err(AppError::NotFound)));
    }

    #[test]
    fn follow_by_username() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let reader = user(&conn, "reader");
        user(&conn, "leo");

        assert_eq!(
            follow_author(&conn, reader, "leo").unwrap(),
            FollowOutcome::Followed
        );
        assert_eq!(
            follow_author(&conn, reader, "leo").unwrap(),
            FollowOutcome::AlreadyFollowing
        );
        assert_eq!(
            follow_author(&conn, reader, "reader").unwrap(),
            FollowOutcome::SelfFollow
        );
        assert!(matches!(
            follow_author(&conn, reader, "ghost"),
            Err(AppError::NotFound)
        ));

        assert!(unfollow_author(&conn, reader, "leo").unwrap());
        assert!(!unfollow_author(&conn, reader, "leo").unwrap());
    }
}
