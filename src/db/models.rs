use rusqlite::Row;

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub created_at: String,
}

impl User {
    pub(crate) const COLUMNS: &'static str =
        "id, username, first_name, last_name, email, password_hash, created_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            email: row.get(4)?,
            password_hash: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    pub fn display_name(&self) -> String {
        full_name(&self.first_name, &self.last_name, &self.username)
    }
}

/// "First Last", falling back to the username when no name is set.
pub(crate) fn full_name(first: &str, last: &str, username: &str) -> String {
    let name = format!("{} {}", first.trim(), last.trim());
    let name = name.trim();
    if name.is_empty() {
        username.to_string()
    } else {
        name.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl Group {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            slug: row.get(2)?,
            description: row.get(3)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub created_at: String,
    pub author_id: i64,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

impl Post {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            text: row.get(1)?,
            created_at: row.get(2)?,
            author_id: row.get(3)?,
            group_id: row.get(4)?,
            image: row.get(5)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Follow {
    pub id: i64,
    pub user_id: i64,
    pub author_id: i64,
    pub created_at: String,
}
