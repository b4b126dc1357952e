use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::db::models::{full_name, Post};
use crate::display;
use crate::pagination::{Page, Paginator, POSTS_PER_PAGE};

/// A post joined with its author and group, ready for display.
#[derive(Debug, Clone)]
pub struct PostView {
    pub id: i64,
    pub text: String,
    pub created_at: String,
    pub image: Option<String>,
    pub author_id: i64,
    pub author_username: String,
    pub author_name: String,
    pub group: Option<GroupRef>,
}

#[derive(Debug, Clone)]
pub struct GroupRef {
    pub slug: String,
    pub title: String,
}

const VIEW_SELECT: &str = "SELECT p.id, p.text, p.created_at, p.image,
            u.id, u.username, u.first_name, u.last_name,
            g.slug, g.title
     FROM posts p
     JOIN users u ON u.id = p.author_id
     LEFT JOIN groups g ON g.id = p.group_id";

const ORDER: &str = "ORDER BY p.created_at DESC, p.id DESC";

impl PostView {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let first: String = row.get(6)?;
        let last: String = row.get(7)?;
        let username: String = row.get(5)?;
        let slug: Option<String> = row.get(8)?;
        let title: Option<String> = row.get(9)?;

        Ok(Self {
            id: row.get(0)?,
            text: row.get(1)?,
            created_at: row.get(2)?,
            image: row.get(3)?,
            author_id: row.get(4)?,
            author_name: full_name(&first, &last, &username),
            author_username: username,
            group: slug
                .zip(title)
                .map(|(slug, title)| GroupRef { slug, title }),
        })
    }

    pub fn published(&self) -> String {
        display::publication_date(&self.created_at)
    }

    pub fn published_iso(&self) -> String {
        display::machine_time(&self.created_at)
    }

    /// First 30 characters, used as the detail page title.
    pub fn headline(&self) -> String {
        self.text.chars().take(30).collect()
    }
}

/// Which posts a listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
    /// Posts by every author the given user follows.
    FollowedBy(i64),
}

impl PostFilter {
    fn where_clause(&self) -> &'static str {
        match self {
            PostFilter::All => "",
            PostFilter::Group(_) => "WHERE p.group_id = ?",
            PostFilter::Author(_) => "WHERE p.author_id = ?",
            PostFilter::FollowedBy(_) => {
                "WHERE p.author_id IN (SELECT author_id FROM follows WHERE user_id = ?)"
            }
        }
    }

    fn args(&self) -> Vec<i64> {
        match *self {
            PostFilter::All => vec![],
            PostFilter::Group(id) | PostFilter::Author(id) | PostFilter::FollowedBy(id) => {
                vec![id]
            }
        }
    }
}

pub fn count(conn: &Connection, filter: PostFilter) -> rusqlite::Result<i64> {
    conn.query_row(
        &format!("SELECT COUNT(*) FROM posts p {}", filter.where_clause()),
        params_from_iter(filter.args()),
        |row| row.get(0),
    )
}

pub fn list(
    conn: &Connection,
    filter: PostFilter,
    limit: i64,
    offset: i64,
) -> rusqlite::Result<Vec<PostView>> {
    let mut stmt = conn.prepare(&format!(
        "{} {} {} LIMIT ? OFFSET ?",
        VIEW_SELECT,
        filter.where_clause(),
        ORDER
    ))?;
    let mut args = filter.args();
    args.push(limit);
    args.push(offset);

    let posts = stmt
        .query_map(params_from_iter(args), PostView::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

/// Resolve the requested page of a listing and load its posts.
pub fn page(
    conn: &Connection,
    filter: PostFilter,
    raw_page: Option<&str>,
) -> rusqlite::Result<Page<PostView>> {
    let total = count(conn, filter)?;
    let info = Paginator::new(total, POSTS_PER_PAGE).page_for(raw_page);
    let items = list(conn, filter, info.limit(), info.offset())?;
    Ok(Page { items, info })
}

pub fn find_view(conn: &Connection, id: i64) -> rusqlite::Result<Option<PostView>> {
    conn.query_row(
        &format!("{} WHERE p.id = ?1", VIEW_SELECT),
        params![id],
        PostView::from_row,
    )
    .optional()
}

pub fn find(conn: &Connection, id: i64) -> rusqlite::Result<Option<Post>> {
    conn.query_row(
        "SELECT id, text, created_at, author_id, group_id, image FROM posts WHERE id = ?1",
        params![id],
        Post::from_row,
    )
    .optional()
}

pub fn insert(
    conn: &Connection,
    author_id: i64,
    text: &str,
    group_id: Option<i64>,
    image: Option<&str>,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO posts (text, author_id, group_id, image) VALUES (?1, ?2, ?3, ?4)",
        params![text, author_id, group_id, image],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Overwrite text and group. The image is only replaced when `image` is set.
pub fn update(
    conn: &Connection,
    id: i64,
    text: &str,
    group_id: Option<i64>,
    image: Option<&str>,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE posts SET text = ?2, group_id = ?3, image = COALESCE(?4, image) WHERE id = ?1",
        params![id, text, group_id, image],
    )?;
    Ok(())
}
