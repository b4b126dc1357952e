/// Mutations on posts that invalidate derived views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostEvent {
    Created { post_id: i64, author_id: i64 },
    Updated { post_id: i64 },
}
