use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::Follow;

/// Result of asking to follow an author.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    AlreadyFollowing,
    /// Following yourself is silently ignored.
    SelfFollow,
}

/// Create the (user -> author) edge. A single `INSERT OR IGNORE`, so
/// concurrent or repeated calls never produce a second edge.
pub fn follow(conn: &Connection, user_id: i64, author_id: i64) -> rusqlite::Result<FollowOutcome> {
    if user_id == author_id {
        return Ok(FollowOutcome::SelfFollow);
    }

    let inserted = conn.execute(
        "INSERT OR IGNORE INTO follows (user_id, author_id) VALUES (?1, ?2)",
        params![user_id, author_id],
    )?;

    Ok(if inserted == 0 {
        FollowOutcome::AlreadyFollowing
    } else {
        FollowOutcome::Followed
    })
}

/// Remove the edge. Returns false when there was nothing to remove.
pub fn unfollow(conn: &Connection, user_id: i64, author_id: i64) -> rusqlite::Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM follows WHERE user_id = ?1 AND author_id = ?2",
        params![user_id, author_id],
    )?;
    Ok(deleted > 0)
}

pub fn find(conn: &Connection, user_id: i64, author_id: i64) -> rusqlite::Result<Option<Follow>> {
    conn.query_row(
        "SELECT id, user_id, author_id, created_at FROM follows
         WHERE user_id = ?1 AND author_id = ?2",
        params![user_id, author_id],
        |row| {
            Ok(Follow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                author_id: row.get(2)?,
                created_at: row.get(3)?,
            })
        },
    )
    .optional()
}

pub fn is_following(conn: &Connection, user_id: i64, author_id: i64) -> rusqlite::Result<bool> {
    Ok(find(conn, user_id, author_id)?.is_some())
}
