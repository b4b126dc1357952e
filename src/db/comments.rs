use rusqlite::{params, Connection};

use crate::db::models::full_name;
use crate::display;

/// A comment with its author, for the detail page.
#[derive(Debug, Clone)]
pub struct CommentView {
    pub id: i64,
    pub text: String,
    pub created_at: String,
    pub author_username: String,
    pub author_name: String,
}

impl CommentView {
    pub fn published(&self) -> String {
        display::comment_stamp(&self.created_at)
    }

    pub fn published_iso(&self) -> String {
        display::machine_time(&self.created_at)
    }
}

pub fn insert(conn: &Connection, post_id: i64, author_id: i64, text: &str) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO comments (post_id, author_id, text) VALUES (?1, ?2, ?3)",
        params![post_id, author_id, text],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Comments on a post, oldest first.
pub fn list_for_post(conn: &Connection, post_id: i64) -> rusqlite::Result<Vec<CommentView>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.text, c.created_at, u.username, u.first_name, u.last_name
         FROM comments c
         JOIN users u ON u.id = c.author_id
         WHERE c.post_id = ?1
         ORDER BY c.created_at ASC, c.id ASC",
    )?;

    let comments = stmt
        .query_map(params![post_id], |row| {
            let username: String = row.get(3)?;
            let first: String = row.get(4)?;
            let last: String = row.get(5)?;
            Ok(CommentView {
                id: row.get(0)?,
                text: row.get(1)?,
                created_at: row.get(2)?,
                author_name: full_name(&first, &last, &username),
                author_username: username,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(comments)
}
