use crate::cache::{self, SnapshotCache};
use crate::config::Config;
use crate::db::connection;
use sqlx::SqlitePool;

pub struct AppState {
    pub config: Config,
    pub db_pool: SqlitePool,
    pub cache: SnapshotCache,
}

impl AppState {
    /// Open the database named in `config` and set up the snapshot cache
    pub async fn connect(config: Config) -> Result<Self, sqlx::Error> {
        let db_pool = connection::establish_connection(&config.database_url).await?;
        let cache = cache::init_cache(&config);

        Ok(Self {
            config,
            db_pool,
            cache,
        })
    }
}
