mod error;
mod turso;

pub use error::StorageError;
pub use turso::TursoClient;
