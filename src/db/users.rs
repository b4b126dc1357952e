use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::User;

/// Fields needed to register a new account.
#[derive(Debug, Clone, Default)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password_hash: Option<&'a str>,
}

pub fn create(conn: &Connection, user: &NewUser<'_>) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO users (username, first_name, last_name, email, password_hash)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.username,
            user.first_name,
            user.last_name,
            user.email,
            user.password_hash
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_username(conn: &Connection, username: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE username = ?1", User::COLUMNS),
        params![username],
        User::from_row,
    )
    .optional()
}

pub fn username_taken(conn: &Connection, username: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE username = ?1 COLLATE NOCASE",
        params![username],
        |row| row.get(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[test]
    fn create_and_find_user() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let id = create(
            &conn,
            &NewUser {
                username: "leo",
                first_name: "Leo",
                last_name: "Tolstoy",
                ..Default::default()
            },
        )
        .unwrap();

        let by_name = find_by_username(&conn, "leo").unwrap().unwrap();
        assert_eq!(by_name.id, id);
        assert_eq!(by_name.last_name, "Tolstoy");
        assert!(by_name.password_hash.is_none());

        assert!(find_by_username(&conn, "nobody").unwrap().is_none());
    }

    #[test]
    fn username_taken_ignores_case() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        create(
            &conn,
            &NewUser {
                username: "Leo",
                ..Default::default()
            },
        )
        .unwrap();
        assert!(username_taken(&conn, "leo").unwrap());
        assert!(!username_taken(&conn, "anna").unwrap());
    }
}
