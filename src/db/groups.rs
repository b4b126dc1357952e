use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::Group;

const COLUMNS: &str = "id, title, slug, description";

pub fn create(
    conn: &Connection,
    title: &str,
    slug: &str,
    description: &str,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO groups (title, slug, description) VALUES (?1, ?2, ?3)",
        params![title, slug, description],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_slug(conn: &Connection, slug: &str) -> rusqlite::Result<Option<Group>> {
    conn.query_row(
        &format!("SELECT {} FROM groups WHERE slug = ?1", COLUMNS),
        params![slug],
        Group::from_row,
    )
    .optional()
}

/// Every group, alphabetically. Used for the post form's choices.
pub fn list(conn: &Connection) -> rusqlite::Result<Vec<Group>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM groups ORDER BY title COLLATE NOCASE, id",
        COLUMNS
    ))?;
    let groups = stmt
        .query_map([], Group::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[test]
    fn slug_lookup_and_listing() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        create(&conn, "Tolstoy", "leo", "Mirror of the revolution").unwrap();
        create(&conn, "Chekhov", "anton", "").unwrap();

        let group = find_by_slug(&conn, "leo").unwrap().unwrap();
        assert_eq!(group.title, "Tolstoy");
        assert!(find_by_slug(&conn, "missing").unwrap().is_none());

        let titles: Vec<String> = list(&conn).unwrap().into_iter().map(|g| g.title).collect();
        assert_eq!(titles, vec!["Chekhov", "Tolstoy"]);
    }

    #[test]
    fn slug_is_unique() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        create(&conn, "One", "same", "").unwrap();
        assert!(create(&conn, "Two", "same", "").is_err());
    }
}
