use libsql::{Builder, Connection, Database};
use std::sync::Arc;

use super::StorageError;
use crate::config::StorageConfig;

#[derive(Clone)]
pub struct TursoClient {
    // Keeps the database handle alive for the lifetime of the connection.
    _db: Arc<Database>,
    conn: Connection,
}

impl TursoClient {
    pub async fn open(config: &StorageConfig) -> Result<Self, StorageError> {
        info!("Initializing TursoClient...");
        let db = if config.is_remote() {
            Builder::new_remote(
                config.database_url.clone(),
                config.database_token.clone().unwrap_or_default(),
            )
            .build()
            .await?
        } else {
            Builder::new_local(&config.database_url).build().await?
        };

        let client = Self::from_database(db)?;
        info!("TursoClient initialized ({})", config.database_url);
        Ok(client)
    }

    /// Private in-memory database, used by tests.
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self, StorageError> {
        let db = Builder::new_local(":memory:").build().await?;
        Self::from_database(db)
    }

    // A single shared connection: every `:memory:` connection would otherwise be its own database.
    fn from_database(db: Database) -> Result<Self, StorageError> {
        let conn = db.connect()?;
        Ok(Self {
            _db: Arc::new(db),
            conn,
        })
    }

    pub fn get_connection(&self) -> &Connection {
        &self.conn
    }
}
