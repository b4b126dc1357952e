use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};

use crate::extractors::CurrentUser;

/// Create a new session for a user. Returns the session token.
pub fn create_session(conn: &Connection, user_id: i64, hours: u64) -> rusqlite::Result<String> {
    let token = generate_token();
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO sessions (id, user_id, token, expires_at) VALUES (?1, ?2, ?3, datetime('now', ?4))",
        params![id, user_id, token, format!("+{} hours", hours)],
    )?;

    Ok(token)
}

/// Delete a session by token.
pub fn delete_session(conn: &Connection, token: &str) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// The user owning an unexpired session, if any.
pub fn lookup_user(conn: &Connection, token: &str) -> rusqlite::Result<Option<CurrentUser>> {
    conn.query_row(
        "SELECT u.id, u.username FROM sessions s \
         JOIN users u ON u.id = s.user_id \
         WHERE s.token = ?1 AND s.expires_at > datetime('now')",
        params![token],
        |row| {
            Ok(CurrentUser {
                id: row.get(0)?,
                username: row.get(1)?,
            })
        },
    )
    .optional()
}

pub fn session_cookie(name: &str, token: &str, max_age_hours: u64) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        name,
        token,
        max_age_hours * 3600
    )
}

pub fn clear_session_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", name)
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::db::users::{self, NewUser};

    #[test]
    fn generate_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_token_is_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn session_round_trip() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let id = users::create(
            &conn,
            &NewUser {
                username: "leo",
                ..Default::default()
            },
        )
        .unwrap();

        let token = create_session(&conn, id, 1).unwrap();
        let user = lookup_user(&conn, &token).unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.username, "leo");

        delete_session(&conn, &token).unwrap();
        assert!(lookup_user(&conn, &token).unwrap().is_none());
    }

    #[test]
    fn expired_sessions_are_ignored() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let id = users::create(
            &conn,
            &NewUser {
                username: "leo",
                ..Default::default()
            },
        )
        .unwrap();
        let token = create_session(&conn, id, 0).unwrap();
        assert!(lookup_user(&conn, &token).unwrap().is_none());
    }

    #[test]
    fn cookies_use_configured_name() {
        assert_eq!(
            session_cookie("gazette_session", "abc", 1),
            "gazette_session=abc; HttpOnly; SameSite=Lax; Path=/; Max-Age=3600"
        );
        assert!(clear_session_cookie("gazette_session").contains("Max-Age=0"));
    }
}
