use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::cache::{PageCache, TtlCache, INDEX_PAGE};
use crate::config::Config;
use crate::db;
use crate::db::posts::PostView;
use crate::events::PostEvent;
use crate::media::MediaStore;
use crate::pagination::Page;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Cache holding index pages between requests.
pub type IndexCache = Arc<dyn PageCache<Page<PostView>>>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub media: MediaStore,
    pub index_cache: IndexCache,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        let media = MediaStore::new(config.media_path());
        let index_cache: IndexCache = Arc::new(TtlCache::new(config.index_ttl()));
        Self {
            db,
            config,
            media,
            index_cache,
        }
    }

    /// Open the database, apply migrations and prepare the media directory.
    pub fn open(config: Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(config.media_path())?;

        let pool = db::create_pool(&config.db_path())?;
        db::run_migrations(&pool)?;

        Ok(Self::new(pool, config))
    }

    /// Notify interested parties that a post changed.
    pub async fn publish(&self, event: PostEvent) {
        tracing::info!(?event, "post event");
        self.index_cache.invalidate_prefix(INDEX_PAGE).await;
    }
}
