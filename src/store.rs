use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::plugins::blog::models::{Blog, Comment, CommentWithBlog, DashboardStats, NewBlog, NewComment};

/// Number of blogs reported as "recent" on the admin dashboard.
pub const RECENT_BLOGS: usize = 5;

/// Persistence for blogs and comments.
///
/// Comments reference blogs by id only; nothing here enforces that the
/// referenced blog exists.
#[async_trait]
pub trait BlogStore: Send + Sync + 'static {
    async fn insert_blog(&self, blog: NewBlog) -> anyhow::Result<Blog>;
    /// Newest first. `published_only` restricts to `is_published = true`.
    async fn list_blogs(&self, published_only: bool) -> anyhow::Result<Vec<Blog>>;
    async fn get_blog(&self, id: Uuid) -> anyhow::Result<Option<Blog>>;
    /// Returns whether a blog was removed.
    async fn delete_blog(&self, id: Uuid) -> anyhow::Result<bool>;
    /// Flips `is_published` in one step; `None` when the blog does not exist.
    async fn toggle_published(&self, id: Uuid) -> anyhow::Result<Option<Blog>>;

    async fn insert_comment(&self, comment: NewComment) -> anyhow::Result<Comment>;
    /// Removes every comment pointing at `blog_id`. Safe to repeat.
    async fn delete_comments_for_blog(&self, blog_id: Uuid) -> anyhow::Result<u64>;
    /// Newest first, parent blog resolved.
    async fn list_comments(&self) -> anyhow::Result<Vec<CommentWithBlog>>;

    async fn dashboard(&self) -> anyhow::Result<DashboardStats>;
}

pub type DynBlogStore = Arc<dyn BlogStore>;

mod inmem {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Inner {
        blogs: Vec<Blog>,
        // insertion order; newest last
        comments: Vec<Comment>,
    }

    #[derive(Default)]
    pub struct InMemoryBlogStore {
        inner: Mutex<Inner>,
    }

    impl InMemoryBlogStore {
        pub fn new() -> Self {
            Self::default()
        }

        fn newest_first(blogs: impl Iterator<Item = Blog>) -> Vec<Blog> {
            let mut out: Vec<Blog> = blogs.collect();
            out.reverse();
            out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            out
        }
    }

    #[async_trait]
    impl BlogStore for InMemoryBlogStore {
        async fn insert_blog(&self, blog: NewBlog) -> anyhow::Result<Blog> {
            let now = chrono::Utc::now();
            let record = Blog {
                id: Uuid::new_v4(),
                title: blog.title,
                sub_title: blog.sub_title,
                description: blog.description,
                category: blog.category,
                image: blog.image,
                is_published: blog.is_published,
                created_at: now,
                updated_at: now,
            };
            self.inner.lock().blogs.push(record.clone());
            Ok(record)
        }

        async fn list_blogs(&self, published_only: bool) -> anyhow::Result<Vec<Blog>> {
            let guard = self.inner.lock();
            let blogs = guard.blogs.iter().filter(|b| !published_only || b.is_published).cloned();
            Ok(Self::newest_first(blogs))
        }

        async fn get_blog(&self, id: Uuid) -> anyhow::Result<Option<Blog>> {
            Ok(self.inner.lock().blogs.iter().find(|b| b.id == id).cloned())
        }

        async fn delete_blog(&self, id: Uuid) -> anyhow::Result<bool> {
            let mut guard = self.inner.lock();
            let before = guard.blogs.len();
            guard.blogs.retain(|b| b.id != id);
            Ok(guard.blogs.len() != before)
        }

        async fn toggle_published(&self, id: Uuid) -> anyhow::Result<Option<Blog>> {
            let mut guard = self.inner.lock();
            Ok(guard.blogs.iter_mut().find(|b| b.id == id).map(|b| {
                b.is_published = !b.is_published;
                b.updated_at = chrono::Utc::now();
                b.clone()
            }))
        }

        async fn insert_comment(&self, comment: NewComment) -> anyhow::Result<Comment> {
            let record = Comment {
                id: Uuid::new_v4(),
                blog_id: comment.blog_id,
                name: comment.name,
                content: comment.content,
                created_at: chrono::Utc::now(),
            };
            self.inner.lock().comments.push(record.clone());
            Ok(record)
        }

        async fn delete_comments_for_blog(&self, blog_id: Uuid) -> anyhow::Result<u64> {
            let mut guard = self.inner.lock();
            let before = guard.comments.len();
            guard.comments.retain(|c| c.blog_id != blog_id);
            Ok((before - guard.comments.len()) as u64)
        }

        async fn list_comments(&self) -> anyhow::Result<Vec<CommentWithBlog>> {
            let guard = self.inner.lock();
            // reverse first so the stable sort keeps later inserts ahead on timestamp ties
            let mut out: Vec<CommentWithBlog> = guard
                .comments
                .iter()
                .rev()
                .map(|c| CommentWithBlog {
                    id: c.id,
                    blog: guard.blogs.iter().find(|b| b.id == c.blog_id).cloned(),
                    name: c.name.clone(),
                    content: c.content.clone(),
                    created_at: c.created_at,
                })
                .collect();
            out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(out)
        }

        async fn dashboard(&self) -> anyhow::Result<DashboardStats> {
            let guard = self.inner.lock();
            let mut recent_blogs = Self::newest_first(guard.blogs.iter().cloned());
            recent_blogs.truncate(RECENT_BLOGS);
            Ok(DashboardStats {
                blogs: guard.blogs.len() as i64,
                comments: guard.comments.len() as i64,
                drafts: guard.blogs.iter().filter(|b| !b.is_published).count() as i64,
                recent_blogs,
            })
        }
    }

    impl InMemoryBlogStore {
        pub fn into_arc(self) -> DynBlogStore {
            Arc::new(self)
        }
    }
}

pub use inmem::InMemoryBlogStore;

mod postgres_backend {
    use super::*;
    use crate::db::DbPool;
    use sqlx::Row;

    const BLOG_COLUMNS: &str = "id, title, sub_title, description, category, image, is_published, created_at, updated_at";

    pub struct PgBlogStore {
        pool: DbPool,
    }

    impl PgBlogStore {
        pub fn new(pool: DbPool) -> Self {
            Self { pool }
        }

        fn joined_comment(r: &sqlx::postgres::PgRow) -> Result<CommentWithBlog, sqlx::Error> {
            let blog = match r.try_get::<Option<Uuid>, _>("b_id")? {
                Some(id) => Some(Blog {
                    id,
                    title: r.try_get("b_title")?,
                    sub_title: r.try_get("b_sub_title")?,
                    description: r.try_get("b_description")?,
                    category: r.try_get("b_category")?,
                    image: r.try_get("b_image")?,
                    is_published: r.try_get("b_is_published")?,
                    created_at: r.try_get("b_created_at")?,
                    updated_at: r.try_get("b_updated_at")?,
                }),
                None => None,
            };
            Ok(CommentWithBlog {
                id: r.try_get("id")?,
                blog,
                name: r.try_get("name")?,
                content: r.try_get("content")?,
                created_at: r.try_get("created_at")?,
            })
        }
    }

    #[async_trait]
    impl BlogStore for PgBlogStore {
        async fn insert_blog(&self, blog: NewBlog) -> anyhow::Result<Blog> {
            let sql = format!(
                "INSERT INTO blogs (id, title, sub_title, description, category, image, is_published) VALUES ($1,$2,$3,$4,$5,$6,$7) RETURNING {}",
                BLOG_COLUMNS
            );
            let dto = sqlx::query_as::<_, Blog>(&sql)
                .bind(Uuid::new_v4())
                .bind(&blog.title)
                .bind(&blog.sub_title)
                .bind(&blog.description)
                .bind(&blog.category)
                .bind(&blog.image)
                .bind(blog.is_published)
                .fetch_one(&self.pool)
                .await?;
            Ok(dto)
        }

        async fn list_blogs(&self, published_only: bool) -> anyhow::Result<Vec<Blog>> {
            let sql = if published_only {
                format!("SELECT {} FROM blogs WHERE is_published = TRUE ORDER BY created_at DESC", BLOG_COLUMNS)
            } else {
                format!("SELECT {} FROM blogs ORDER BY created_at DESC", BLOG_COLUMNS)
            };
            let items = sqlx::query_as::<_, Blog>(&sql).fetch_all(&self.pool).await?;
            Ok(items)
        }

        async fn get_blog(&self, id: Uuid) -> anyhow::Result<Option<Blog>> {
            let sql = format!("SELECT {} FROM blogs WHERE id = $1", BLOG_COLUMNS);
            let dto = sqlx::query_as::<_, Blog>(&sql).bind(id).fetch_optional(&self.pool).await?;
            Ok(dto)
        }

        async fn delete_blog(&self, id: Uuid) -> anyhow::Result<bool> {
            let res = sqlx::query("DELETE FROM blogs WHERE id = $1").bind(id).execute(&self.pool).await?;
            Ok(res.rows_affected() > 0)
        }

        async fn toggle_published(&self, id: Uuid) -> anyhow::Result<Option<Blog>> {
            let sql = format!(
                "UPDATE blogs SET is_published = NOT is_published, updated_at = now() WHERE id = $1 RETURNING {}",
                BLOG_COLUMNS
            );
            let dto = sqlx::query_as::<_, Blog>(&sql).bind(id).fetch_optional(&self.pool).await?;
            Ok(dto)
        }

        async fn insert_comment(&self, comment: NewComment) -> anyhow::Result<Comment> {
            let dto = sqlx::query_as::<_, Comment>(
                "INSERT INTO comments (id, blog_id, name, content) VALUES ($1,$2,$3,$4) RETURNING id, blog_id, name, content, created_at",
            )
            .bind(Uuid::new_v4())
            .bind(comment.blog_id)
            .bind(&comment.name)
            .bind(&comment.content)
            .fetch_one(&self.pool)
            .await?;
            Ok(dto)
        }

        async fn delete_comments_for_blog(&self, blog_id: Uuid) -> anyhow::Result<u64> {
            let res = sqlx::query("DELETE FROM comments WHERE blog_id = $1").bind(blog_id).execute(&self.pool).await?;
            Ok(res.rows_affected())
        }

        async fn list_comments(&self) -> anyhow::Result<Vec<CommentWithBlog>> {
            let rows = sqlx::query(
                "SELECT c.id, c.name, c.content, c.created_at, \
                 b.id AS b_id, b.title AS b_title, b.sub_title AS b_sub_title, b.description AS b_description, \
                 b.category AS b_category, b.image AS b_image, b.is_published AS b_is_published, \
                 b.created_at AS b_created_at, b.updated_at AS b_updated_at \
                 FROM comments c LEFT JOIN blogs b ON b.id = c.blog_id \
                 ORDER BY c.created_at DESC, c.seq DESC",
            )
            .fetch_all(&self.pool)
            .await?;

            let comments = rows.iter().map(Self::joined_comment).collect::<Result<Vec<_>, _>>()?;
            Ok(comments)
        }

        async fn dashboard(&self) -> anyhow::Result<DashboardStats> {
            let blogs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blogs").fetch_one(&self.pool).await?;
            let comments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments").fetch_one(&self.pool).await?;
            let drafts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blogs WHERE is_published = FALSE")
                .fetch_one(&self.pool)
                .await?;
            let sql = format!("SELECT {} FROM blogs ORDER BY created_at DESC LIMIT $1", BLOG_COLUMNS);
            let recent_blogs = sqlx::query_as::<_, Blog>(&sql)
                .bind(RECENT_BLOGS as i64)
                .fetch_all(&self.pool)
                .await?;
            Ok(DashboardStats { blogs, comments, drafts, recent_blogs })
        }
    }

    impl PgBlogStore {
        pub fn into_arc(self) -> DynBlogStore {
            Arc::new(self)
        }
    }
}

pub use postgres_backend::PgBlogStore;
